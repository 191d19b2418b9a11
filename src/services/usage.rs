use crate::domain::{Container, Image};
use std::collections::HashMap;

/// Image id to the containers referencing that image, built from one snapshot.
#[derive(Debug, Default)]
pub struct UsageGraph<'a> {
    users: HashMap<&'a str, Vec<&'a Container>>,
    uncertain: bool,
}

impl<'a> UsageGraph<'a> {
    /// A container references an image when it runs that image id or was
    /// created from one of the image's tags.
    pub fn build<I, C>(images: I, containers: C) -> Self
    where
        I: IntoIterator<Item = &'a Image>,
        C: IntoIterator<Item = &'a Container>,
        C::IntoIter: Clone,
    {
        let containers = containers.into_iter();
        let uncertain = containers
            .clone()
            .any(|c| c.image_id.is_none() && c.image_ref.is_none());

        let users = images
            .into_iter()
            .map(|image| {
                let referencing = containers
                    .clone()
                    .filter(|c| references(image, c))
                    .collect::<Vec<_>>();
                (image.id.as_str(), referencing)
            })
            .collect();

        Self { users, uncertain }
    }

    pub fn users(&self, image: &Image) -> &[&'a Container] {
        self.users
            .get(image.id.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_used(&self, image: &Image) -> bool {
        !self.users(image).is_empty()
    }

    /// True when some container's image could not be read, so "unused" cannot
    /// be trusted.
    pub fn is_uncertain(&self) -> bool {
        self.uncertain
    }
}

fn references(image: &Image, container: &Container) -> bool {
    container.image_id.as_deref().is_some_and(|id| image.has_id(id))
        || container.image_ref.as_deref().is_some_and(|r| image.has_tag(r))
}
