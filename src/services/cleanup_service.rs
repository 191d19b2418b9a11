use super::actions::{
    KillContainer, PullImage, RemoveContainer, RemoveImage, RemoveImageByTag, RemoveVolume,
};
use super::auditor::Auditor;
use super::inventory::{Inventory, Scope};
use super::matcher::Matcher;
use super::planner::{Confirm, ConfirmGate, Outcome, Proposal, run_plan};
use crate::domain::{CleanupError, ContainerRuntime, Finding, FindingKind};
use std::sync::Arc;
use tracing::{info, warn};

/// Per-invocation settings, passed explicitly to every command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandOptions {
    /// Skip confirmation prompts
    pub force: bool,
}

impl CommandOptions {
    pub fn forced() -> Self {
        Self { force: true }
    }
}

/// Entry point for every cleanup and audit command.
///
/// Each command takes its own fresh snapshot of the runtime.
pub struct CleanupService {
    runtime: Arc<dyn ContainerRuntime>,
    prompt: Arc<dyn Confirm>,
}

impl CleanupService {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, prompt: Arc<dyn Confirm>) -> Self {
        Self { runtime, prompt }
    }

    fn gate(&self, options: &CommandOptions) -> ConfirmGate<'_> {
        ConfirmGate::new(options.force, self.prompt.as_ref())
    }

    fn snapshot(&self, scope: Scope) -> Result<Inventory, CleanupError> {
        Inventory::collect(self.runtime.as_ref(), scope)
    }

    /// Pulls every tag currently present, one at a time in sorted order.
    pub fn pull_all(&self, _options: &CommandOptions) -> Result<Outcome, CleanupError> {
        let inventory = self.snapshot(Scope::IMAGES)?;
        let Some(proposal) = Proposal::new(inventory.tags()) else {
            return Ok(Outcome::Nothing);
        };

        let action = PullImage {
            runtime: self.runtime.as_ref(),
        };
        Ok(Outcome::Executed(proposal.accept().execute(&action)))
    }

    pub fn rm_dangling_images(&self, options: &CommandOptions) -> Result<Outcome, CleanupError> {
        let inventory = self.snapshot(Scope::IMAGES_AND_CONTAINERS)?;
        let auditor = Auditor::new(&inventory);

        for (image, users) in auditor.untagged_images_in_use() {
            warn!("not removing image: {} (in use by {})", image, join(users));
        }

        let candidates = auditor.dangling_images().filter_map(|f| match f {
            Finding::DanglingImage(image) => Some(image),
            _ => None,
        });

        Ok(run_plan(
            candidates,
            &self.gate(options),
            "The following dangling images will be removed:",
            "Remove images?",
            &RemoveImage {
                runtime: self.runtime.as_ref(),
            },
        ))
    }

    /// Removes images by every tag matching `pattern`. Containers are never
    /// touched; the runtime refuses tags whose image is still in use.
    pub fn rm_matching_images(
        &self,
        pattern: &str,
        use_regex: bool,
        options: &CommandOptions,
    ) -> Result<Outcome, CleanupError> {
        let matcher = Matcher::new(pattern, use_regex)?;
        let inventory = self.snapshot(Scope::IMAGES)?;
        let selected: Vec<&str> = matcher.select(inventory.tags(), |tag| *tag).collect();

        Ok(run_plan(
            selected,
            &self.gate(options),
            "Images with the following tags will be deleted:",
            "Delete matching images?",
            &RemoveImageByTag {
                runtime: self.runtime.as_ref(),
            },
        ))
    }

    pub fn kill_all(&self, options: &CommandOptions) -> Result<Outcome, CleanupError> {
        let inventory = self.snapshot(Scope::CONTAINERS)?;
        let running = inventory.containers.iter().filter(|c| c.is_running());

        Ok(run_plan(
            running,
            &self.gate(options),
            "The following running containers will be killed:",
            "Kill containers?",
            &KillContainer {
                runtime: self.runtime.as_ref(),
            },
        ))
    }

    pub fn rm_stopped(&self, options: &CommandOptions) -> Result<Outcome, CleanupError> {
        let inventory = self.snapshot(Scope::CONTAINERS)?;
        let auditor = Auditor::new(&inventory);
        let stopped = auditor.stopped_containers().filter_map(|f| match f {
            Finding::StoppedContainer(container) => Some(container),
            _ => None,
        });

        Ok(run_plan(
            stopped,
            &self.gate(options),
            "The following stopped containers will be removed:",
            "Remove containers?",
            &RemoveContainer {
                runtime: self.runtime.as_ref(),
            },
        ))
    }

    pub fn rm_dangling_volumes(&self, options: &CommandOptions) -> Result<Outcome, CleanupError> {
        let inventory = self.snapshot(Scope::VOLUMES_AND_CONTAINERS)?;
        let auditor = Auditor::new(&inventory);
        let dangling = auditor.dangling_volumes().filter_map(|f| match f {
            Finding::DanglingVolume(volume) => Some(volume),
            _ => None,
        });

        Ok(run_plan(
            dangling,
            &self.gate(options),
            "The following dangling volumes will be removed:",
            "Remove volumes?",
            &RemoveVolume {
                runtime: self.runtime.as_ref(),
            },
        ))
    }

    /// Removes stopped containers whose name matches `pattern`.
    pub fn rm_matching_containers(
        &self,
        pattern: &str,
        use_regex: bool,
        options: &CommandOptions,
    ) -> Result<Outcome, CleanupError> {
        let matcher = Matcher::new(pattern, use_regex)?;
        let inventory = self.snapshot(Scope::CONTAINERS)?;
        let stopped = inventory.containers.iter().filter(|c| c.is_stopped());
        let selected: Vec<_> = matcher.select(stopped, |c| c.name.as_str()).collect();

        Ok(run_plan(
            selected,
            &self.gate(options),
            "The following containers will be deleted:",
            "Delete matching containers?",
            &RemoveContainer {
                runtime: self.runtime.as_ref(),
            },
        ))
    }

    /// Stopped containers, then dangling images, then dangling volumes. Each
    /// step re-reads the runtime so it sees what the previous step freed.
    pub fn scrub(&self, options: &CommandOptions) -> Result<Vec<Outcome>, CleanupError> {
        Ok(vec![
            self.rm_stopped(options)?,
            self.rm_dangling_images(options)?,
            self.rm_dangling_volumes(options)?,
        ])
    }

    /// Runs every check without changing anything.
    pub fn doctor(&self) -> Result<DoctorReport, CleanupError> {
        let inventory = self.snapshot(Scope::ALL)?;
        let auditor = Auditor::new(&inventory);

        let report = DoctorReport {
            stale_tag_containers: lines(auditor.stale_tag_containers()),
            dangling_volumes: lines(auditor.dangling_volumes()),
            dangling_images: lines(auditor.dangling_images()),
            images_in_use: auditor
                .untagged_images_in_use()
                .map(|(image, users)| format!("image {image}: untagged, in use by {}", join(users)))
                .collect(),
            stopped_containers: lines(auditor.stopped_containers()),
        };

        if report.is_healthy() {
            info!("no issues found");
        }

        Ok(report)
    }
}

fn lines<'a>(findings: impl Iterator<Item = Finding<'a>>) -> Vec<String> {
    findings.map(|f| f.to_string()).collect()
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read-only health report. Each section lists one line per entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorReport {
    pub stale_tag_containers: Vec<String>,
    pub dangling_volumes: Vec<String>,
    pub dangling_images: Vec<String>,
    pub images_in_use: Vec<String>,
    pub stopped_containers: Vec<String>,
}

/// How a report section should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Issue,
    Warning,
}

pub struct ReportSection<'r> {
    pub title: &'static str,
    pub remedy: &'static str,
    pub severity: Severity,
    pub lines: &'r [String],
}

impl DoctorReport {
    pub fn count(&self, kind: FindingKind) -> usize {
        match kind {
            FindingKind::DanglingImage => self.dangling_images.len(),
            FindingKind::DanglingVolume => self.dangling_volumes.len(),
            FindingKind::StoppedContainer => self.stopped_containers.len(),
            FindingKind::StaleTagContainer => self.stale_tag_containers.len(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.sections().iter().all(|s| s.lines.is_empty())
    }

    pub fn sections(&self) -> [ReportSection<'_>; 5] {
        [
            ReportSection {
                title: "containers running from old version of tag",
                remedy: "restart containers",
                severity: Severity::Issue,
                lines: &self.stale_tag_containers,
            },
            ReportSection {
                title: "dangling volumes",
                remedy: "tidybox rmv-dangling",
                severity: Severity::Issue,
                lines: &self.dangling_volumes,
            },
            ReportSection {
                title: "dangling images",
                remedy: "tidybox image rm-dangling",
                severity: Severity::Issue,
                lines: &self.dangling_images,
            },
            ReportSection {
                title: "untagged images still in use",
                remedy: "recreate the containers from a tagged image",
                severity: Severity::Warning,
                lines: &self.images_in_use,
            },
            ReportSection {
                title: "stopped containers - possibly unneeded",
                remedy: "tidybox rm-stopped",
                severity: Severity::Warning,
                lines: &self.stopped_containers,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Container, ContainerState, Image};
    use crate::test_support::{MockRuntime, ScriptedConfirm};

    fn create_service(answer: bool) -> (CleanupService, Arc<MockRuntime>, Arc<ScriptedConfirm>) {
        let mock = Arc::new(MockRuntime::new());
        let prompt = Arc::new(ScriptedConfirm::answering(answer));
        let service = CleanupService::new(mock.clone(), prompt.clone());
        (service, mock, prompt)
    }

    #[test]
    fn test_rm_dangling_skips_images_in_use() {
        let (service, mock, _) = create_service(true);
        mock.add_image(Image::new("sha256:free", vec![]));
        mock.add_image(Image::new("sha256:held", vec![]));
        mock.add_container(
            Container::new("c1", "app", ContainerState::Running).with_image("sha256:held", "app:1"),
        );

        let outcome = service.rm_dangling_images(&CommandOptions::default()).unwrap();

        assert_eq!(outcome.report().unwrap().succeeded.len(), 1);
        let commands = mock.get_commands();
        assert!(commands.contains(&"remove_image:sha256:free".to_string()));
        assert!(!commands.contains(&"remove_image:sha256:held".to_string()));
    }

    #[test]
    fn test_declined_prompt_removes_nothing() {
        let (service, mock, prompt) = create_service(false);
        mock.add_container(Container::new("c1", "old", ContainerState::Stopped));

        let outcome = service.rm_stopped(&CommandOptions::default()).unwrap();

        assert_eq!(outcome, Outcome::Declined);
        assert_eq!(prompt.prompts().len(), 1);
        assert!(mock.container_exists("c1"));
    }

    #[test]
    fn test_rm_stopped_leaves_running_containers() {
        let (service, mock, _) = create_service(true);
        mock.add_container(Container::new("c1", "live", ContainerState::Running));
        mock.add_container(Container::new("c2", "dead", ContainerState::Stopped));
        mock.add_container(Container::new("c3", "odd", ContainerState::Unknown));

        service.rm_stopped(&CommandOptions::default()).unwrap();

        assert!(mock.container_exists("c1"));
        assert!(!mock.container_exists("c2"));
        assert!(mock.container_exists("c3"));
    }

    #[test]
    fn test_kill_all_targets_running_only() {
        let (service, mock, _) = create_service(true);
        mock.add_container(Container::new("c1", "live", ContainerState::Running));
        mock.add_container(Container::new("c2", "dead", ContainerState::Stopped));

        service.kill_all(&CommandOptions::forced()).unwrap();

        let commands = mock.get_commands();
        assert!(commands.contains(&"kill:c1".to_string()));
        assert!(!commands.contains(&"kill:c2".to_string()));
    }

    #[test]
    fn test_rm_matching_containers_only_considers_stopped() {
        let (service, mock, _) = create_service(true);
        mock.add_container(Container::new("c1", "ci-runner-1", ContainerState::Stopped));
        mock.add_container(Container::new("c2", "ci-runner-2", ContainerState::Running));
        mock.add_container(Container::new("c3", "db", ContainerState::Stopped));

        let outcome = service
            .rm_matching_containers("ci-*", false, &CommandOptions::forced())
            .unwrap();

        assert_eq!(outcome.report().unwrap().attempted(), 1);
        assert!(!mock.container_exists("c1"));
        assert!(mock.container_exists("c2"));
        assert!(mock.container_exists("c3"));
    }

    #[test]
    fn test_invalid_pattern_aborts_before_snapshot() {
        let (service, mock, prompt) = create_service(true);

        let err = service
            .rm_matching_images("[", true, &CommandOptions::forced())
            .unwrap_err();

        assert!(matches!(err, CleanupError::InvalidPattern { .. }));
        assert!(mock.get_commands().is_empty());
        assert!(prompt.prompts().is_empty());
    }

    #[test]
    fn test_pull_all_pulls_each_tag_sorted() {
        let (service, mock, prompt) = create_service(false);
        mock.add_image(Image::new("sha256:1", vec!["web:latest".into(), "alpine:3".into()]));
        mock.add_image(Image::new("sha256:2", vec![]));

        let outcome = service.pull_all(&CommandOptions::default()).unwrap();

        assert_eq!(outcome.report().unwrap().succeeded, vec!["alpine:3", "web:latest"]);
        let pulls: Vec<String> = mock
            .get_commands()
            .into_iter()
            .filter(|c| c.starts_with("pull:"))
            .collect();
        assert_eq!(pulls, vec!["pull:alpine:3", "pull:web:latest"]);
        assert!(prompt.prompts().is_empty());
    }

    #[test]
    fn test_doctor_on_empty_runtime_is_healthy() {
        let (service, _mock, _) = create_service(true);
        let report = service.doctor().unwrap();
        assert!(report.is_healthy());
    }

    #[test]
    fn test_doctor_sections_put_issues_before_warnings() {
        let report = DoctorReport {
            dangling_volumes: vec!["volume pgdata: dangling".to_string()],
            stopped_containers: vec!["old[?, c1]".to_string()],
            ..DoctorReport::default()
        };

        let sections = report.sections();
        let severities: Vec<Severity> = sections.iter().map(|s| s.severity).collect();
        assert_eq!(
            severities,
            vec![
                Severity::Issue,
                Severity::Issue,
                Severity::Issue,
                Severity::Warning,
                Severity::Warning
            ]
        );
        assert_eq!(sections[1].lines, report.dangling_volumes.as_slice());
        assert_eq!(sections[4].lines, report.stopped_containers.as_slice());
        assert!(!report.is_healthy());
    }

    #[test]
    fn test_unreadable_container_blocks_forced_volume_removal() {
        let (service, mock, _) = create_service(true);
        mock.add_volume("pgdata");
        mock.add_container(Container::unreadable("c1"));

        let outcome = service.rm_dangling_volumes(&CommandOptions::forced()).unwrap();

        assert_eq!(outcome, Outcome::Nothing);
        assert!(mock.volume_exists("pgdata"));
    }
}
