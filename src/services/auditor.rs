use super::inventory::Inventory;
use super::usage::UsageGraph;
use crate::domain::{Container, Finding, Image};
use tracing::warn;

/// Classification rules over one inventory snapshot.
///
/// Every check returns a fresh single-pass iterator; call it again for a new
/// pass. Checks are independent and may report the same entity under
/// different kinds.
pub struct Auditor<'a> {
    inventory: &'a Inventory,
    usage: UsageGraph<'a>,
}

impl<'a> Auditor<'a> {
    /// Images count as used by every container not known to be stopped.
    pub fn new(inventory: &'a Inventory) -> Self {
        let usage = UsageGraph::build(
            &inventory.images,
            inventory.containers.iter().filter(|c| !c.is_stopped()),
        );
        Self { inventory, usage }
    }

    pub fn usage(&self) -> &UsageGraph<'a> {
        &self.usage
    }

    /// Untagged images with no referencing container.
    pub fn dangling_images(&self) -> impl Iterator<Item = Finding<'a>> + '_ {
        let trusted = !self.usage.is_uncertain();
        if !trusted {
            warn!("some containers report no image; skipping dangling image check");
        }

        self.inventory
            .images
            .iter()
            .filter(move |_| trusted)
            .filter(move |image| image.is_untagged() && !self.usage.is_used(image))
            .map(Finding::DanglingImage)
    }

    /// Untagged images that are still referenced, with their users.
    pub fn untagged_images_in_use(
        &self,
    ) -> impl Iterator<Item = (&'a Image, &[&'a Container])> + '_ {
        self.inventory
            .images
            .iter()
            .filter(|image| image.is_untagged())
            .map(move |image| (image, self.usage.users(image)))
            .filter(|(_, users)| !users.is_empty())
    }

    /// Volumes mounted by no container, in any state.
    pub fn dangling_volumes(&self) -> impl Iterator<Item = Finding<'a>> + '_ {
        let containers = &self.inventory.containers;
        let trusted = containers.iter().all(|c| c.volumes.is_some());
        if !trusted {
            warn!("some containers report no mounts; skipping dangling volume check");
        }

        self.inventory
            .volumes
            .iter()
            .filter(move |_| trusted)
            .filter(move |volume| !containers.iter().any(|c| c.mounts(&volume.name)))
            .map(Finding::DanglingVolume)
    }

    pub fn stopped_containers(&self) -> impl Iterator<Item = Finding<'a>> + '_ {
        self.inventory
            .containers
            .iter()
            .filter(|c| c.is_stopped())
            .map(Finding::StoppedContainer)
    }

    /// Running containers whose creation tag now points at another image.
    pub fn stale_tag_containers(&self) -> impl Iterator<Item = Finding<'a>> + '_ {
        let inventory = self.inventory;
        inventory
            .containers
            .iter()
            .filter(|c| c.is_running())
            .filter_map(move |container| {
                let tag = container.image_ref.as_deref()?;
                let running_image_id = container.image_id.as_deref()?;
                let current = inventory.resolve_image(tag)?;

                (!current.has_id(running_image_id)).then_some(Finding::StaleTagContainer {
                    container,
                    tag,
                    running_image_id,
                    current_image_id: current.id.as_str(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContainerState, FindingKind, Volume};

    fn scenario() -> Inventory {
        Inventory {
            images: vec![
                Image::new("sha256:aaaa", vec![]),
                Image::new("sha256:bbbb", vec!["web:latest".into()]),
            ],
            containers: vec![
                Container::new("c1", "C1", ContainerState::Running).with_image("sha256:bbbb", "web:latest"),
                Container::new("c2", "C2", ContainerState::Stopped).with_image("sha256:aaaa", "sha256:aaaa"),
            ],
            volumes: vec![Volume::new("V1")],
        }
    }

    fn kinds<'a>(findings: impl Iterator<Item = Finding<'a>>) -> Vec<FindingKind> {
        findings.map(|f| f.kind()).collect()
    }

    #[test]
    fn test_scenario_classification() {
        let inv = scenario();
        let auditor = Auditor::new(&inv);

        let dangling: Vec<_> = auditor.dangling_images().collect();
        assert_eq!(dangling, vec![Finding::DanglingImage(&inv.images[0])]);

        let volumes: Vec<_> = auditor.dangling_volumes().collect();
        assert_eq!(volumes, vec![Finding::DanglingVolume(&inv.volumes[0])]);

        let stopped: Vec<_> = auditor.stopped_containers().collect();
        assert_eq!(stopped, vec![Finding::StoppedContainer(&inv.containers[1])]);

        assert_eq!(auditor.stale_tag_containers().count(), 0);
    }

    #[test]
    fn test_tagged_images_never_dangling() {
        let inv = Inventory {
            images: vec![Image::new("sha256:1", vec!["lonely:1".into()])],
            ..Default::default()
        };
        assert_eq!(Auditor::new(&inv).dangling_images().count(), 0);
    }

    #[test]
    fn test_untagged_image_used_by_running_container_is_in_use() {
        let inv = Inventory {
            images: vec![Image::new("sha256:old", vec![])],
            containers: vec![
                Container::new("c1", "app", ContainerState::Running).with_image("sha256:old", "app:latest"),
            ],
            ..Default::default()
        };
        let auditor = Auditor::new(&inv);

        assert_eq!(auditor.dangling_images().count(), 0);
        let in_use: Vec<_> = auditor.untagged_images_in_use().collect();
        assert_eq!(in_use.len(), 1);
        assert_eq!(in_use[0].1[0].name, "app");
    }

    #[test]
    fn test_unknown_state_container_keeps_image_in_use() {
        let inv = Inventory {
            images: vec![Image::new("sha256:x", vec![])],
            containers: vec![
                Container::new("c1", "odd", ContainerState::Unknown).with_image("sha256:x", "x"),
            ],
            ..Default::default()
        };
        let auditor = Auditor::new(&inv);

        assert_eq!(auditor.dangling_images().count(), 0);
        assert_eq!(auditor.stopped_containers().count(), 0);
    }

    #[test]
    fn test_uncertain_usage_suppresses_dangling_images() {
        let inv = Inventory {
            images: vec![Image::new("sha256:x", vec![])],
            containers: vec![Container::new("c1", "blind", ContainerState::Running)],
            ..Default::default()
        };
        assert_eq!(Auditor::new(&inv).dangling_images().count(), 0);
    }

    #[test]
    fn test_mounted_volume_is_not_dangling_even_if_container_stopped() {
        let inv = Inventory {
            containers: vec![Container::new("c1", "db", ContainerState::Stopped).with_volumes(&["pgdata"])],
            volumes: vec![Volume::new("pgdata"), Volume::new("scratch")],
            ..Default::default()
        };
        let names: Vec<String> = Auditor::new(&inv)
            .dangling_volumes()
            .map(|f| f.to_string())
            .collect();
        assert_eq!(names, vec!["volume scratch: dangling"]);
    }

    #[test]
    fn test_unreadable_mounts_suppress_dangling_volumes() {
        let mut blind = Container::new("c1", "db", ContainerState::Running);
        blind.volumes = None;
        let inv = Inventory {
            containers: vec![blind],
            volumes: vec![Volume::new("pgdata")],
            ..Default::default()
        };
        assert_eq!(Auditor::new(&inv).dangling_volumes().count(), 0);
    }

    #[test]
    fn test_stale_tag_detected_after_repull() {
        let inv = Inventory {
            images: vec![
                Image::new("sha256:new", vec!["web:latest".into()]),
                Image::new("sha256:old", vec![]),
            ],
            containers: vec![
                Container::new("c1", "web", ContainerState::Running).with_image("sha256:old", "web"),
                Container::new("c2", "fresh", ContainerState::Running).with_image("sha256:new", "web:latest"),
                Container::new("c3", "gone", ContainerState::Running).with_image("sha256:old", "removed:1"),
                Container::new("c4", "parked", ContainerState::Stopped).with_image("sha256:old", "web:latest"),
            ],
            ..Default::default()
        };
        let auditor = Auditor::new(&inv);

        let stale: Vec<_> = auditor.stale_tag_containers().collect();
        assert_eq!(stale.len(), 1);
        match &stale[0] {
            Finding::StaleTagContainer {
                container,
                tag,
                running_image_id,
                current_image_id,
            } => {
                assert_eq!(container.name, "web");
                assert_eq!(*tag, "web");
                assert_eq!(*running_image_id, "sha256:old");
                assert_eq!(*current_image_id, "sha256:new");
            }
            other => panic!("unexpected finding {other:?}"),
        }

        // The superseded image is untagged but in use: not dangling.
        assert_eq!(auditor.dangling_images().count(), 0);
        assert_eq!(kinds(auditor.stale_tag_containers()), vec![FindingKind::StaleTagContainer]);
    }

    #[test]
    fn test_dangling_audit_is_idempotent() {
        let inv = scenario();
        let first: Vec<_> = Auditor::new(&inv).dangling_images().collect();
        let auditor = Auditor::new(&inv);
        let second: Vec<_> = auditor.dangling_images().collect();
        let third: Vec<_> = auditor.dangling_images().collect();
        assert_eq!(first, second);
        assert_eq!(second, third);
    }
}
