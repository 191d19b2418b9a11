use crate::domain::{Container, ContainerRuntime, ContainerState, Image, Volume};
use crate::services::Confirm;
use anyhow::{Result, bail};
use std::sync::RwLock;

/// In-memory runtime that records every call as `"op:target"`.
#[derive(Debug)]
pub struct MockRuntime {
    images: RwLock<Vec<Image>>,
    containers: RwLock<Vec<Container>>,
    volumes: RwLock<Vec<Volume>>,
    commands: RwLock<Vec<String>>,
    fail_on: RwLock<Vec<(String, Option<String>)>>,
    unavailable: RwLock<bool>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self {
            images: RwLock::new(Vec::new()),
            containers: RwLock::new(Vec::new()),
            volumes: RwLock::new(Vec::new()),
            commands: RwLock::new(Vec::new()),
            fail_on: RwLock::new(Vec::new()),
            unavailable: RwLock::new(false),
        }
    }

    pub fn add_image(&self, image: Image) {
        self.images.write().unwrap().push(image);
    }

    pub fn add_container(&self, container: Container) {
        self.containers.write().unwrap().push(container);
    }

    pub fn add_volume(&self, name: &str) {
        self.volumes.write().unwrap().push(Volume::new(name));
    }

    /// Fail every call of `operation`.
    pub fn set_fail_on(&self, operation: &str) {
        self.fail_on
            .write()
            .unwrap()
            .push((operation.to_string(), None));
    }

    /// Fail `operation` only for `target`.
    pub fn set_fail_on_target(&self, operation: &str, target: &str) {
        self.fail_on
            .write()
            .unwrap()
            .push((operation.to_string(), Some(target.to_string())));
    }

    /// Every listing call fails as if the engine were down.
    pub fn set_unavailable(&self) {
        *self.unavailable.write().unwrap() = true;
    }

    pub fn get_commands(&self) -> Vec<String> {
        self.commands.read().unwrap().clone()
    }

    pub fn container_exists(&self, id: &str) -> bool {
        self.containers.read().unwrap().iter().any(|c| c.id == id)
    }

    pub fn image_exists(&self, id: &str) -> bool {
        self.images.read().unwrap().iter().any(|i| i.id == id)
    }

    pub fn volume_exists(&self, name: &str) -> bool {
        self.volumes.read().unwrap().iter().any(|v| v.name == name)
    }

    pub fn get_state(&self, id: &str) -> Option<ContainerState> {
        self.containers
            .read()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.state)
    }

    pub fn image_tags(&self, id: &str) -> Option<Vec<String>> {
        self.images
            .read()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .map(|i| i.tags.clone())
    }

    fn record_command(&self, cmd: &str) {
        self.commands.write().unwrap().push(cmd.to_string());
    }

    fn check_available(&self) -> Result<()> {
        if *self.unavailable.read().unwrap() {
            bail!("Cannot connect to the mock engine");
        }
        Ok(())
    }

    fn check_fail(&self, operation: &str, target: &str) -> Result<()> {
        let fail_on = self.fail_on.read().unwrap();
        let hit = fail_on
            .iter()
            .any(|(op, t)| op == operation && t.as_deref().is_none_or(|t| t == target));
        if hit {
            bail!("Mock failure on: {} {}", operation, target);
        }
        Ok(())
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerRuntime for MockRuntime {
    fn name(&self) -> &str {
        "mock"
    }

    fn list_images(&self) -> Result<Vec<Image>> {
        self.record_command("list_images");
        self.check_available()?;
        Ok(self.images.read().unwrap().clone())
    }

    fn list_containers(&self) -> Result<Vec<Container>> {
        self.record_command("list_containers");
        self.check_available()?;
        Ok(self.containers.read().unwrap().clone())
    }

    fn list_volumes(&self) -> Result<Vec<Volume>> {
        self.record_command("list_volumes");
        self.check_available()?;
        Ok(self.volumes.read().unwrap().clone())
    }

    /// Untags when given a tag of a multi-tag image, otherwise deletes the
    /// image.
    fn remove_image(&self, reference: &str) -> Result<()> {
        self.record_command(&format!("remove_image:{}", reference));
        self.check_fail("remove_image", reference)?;

        let mut images = self.images.write().unwrap();
        if let Some(pos) = images.iter().position(|i| i.has_id(reference)) {
            images.remove(pos);
            return Ok(());
        }
        match images.iter().position(|i| i.has_tag(reference)) {
            Some(pos) if images[pos].tags.len() > 1 => {
                images[pos].tags.retain(|t| t != reference);
                Ok(())
            }
            Some(pos) => {
                images.remove(pos);
                Ok(())
            }
            None => bail!("No such image: {}", reference),
        }
    }

    fn remove_container(&self, id: &str) -> Result<()> {
        self.record_command(&format!("remove_container:{}", id));
        self.check_fail("remove_container", id)?;

        let mut containers = self.containers.write().unwrap();
        match containers.iter().position(|c| c.id == id) {
            Some(pos) => {
                containers.remove(pos);
                Ok(())
            }
            None => bail!("No such container: {}", id),
        }
    }

    fn kill_container(&self, id: &str) -> Result<()> {
        self.record_command(&format!("kill:{}", id));
        self.check_fail("kill", id)?;

        match self.containers.write().unwrap().iter_mut().find(|c| c.id == id) {
            Some(container) => {
                container.state = ContainerState::Stopped;
                Ok(())
            }
            None => bail!("No such container: {}", id),
        }
    }

    fn remove_volume(&self, name: &str) -> Result<()> {
        self.record_command(&format!("remove_volume:{}", name));
        self.check_fail("remove_volume", name)?;

        let mut volumes = self.volumes.write().unwrap();
        match volumes.iter().position(|v| v.name == name) {
            Some(pos) => {
                volumes.remove(pos);
                Ok(())
            }
            None => bail!("No such volume: {}", name),
        }
    }

    fn pull_image(&self, tag: &str) -> Result<()> {
        self.record_command(&format!("pull:{}", tag));
        self.check_fail("pull", tag)?;
        Ok(())
    }
}

/// Answers every prompt the same way and remembers what was asked.
#[derive(Debug)]
pub struct ScriptedConfirm {
    answer: bool,
    prompts: RwLock<Vec<(String, String)>>,
}

impl ScriptedConfirm {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: RwLock::new(Vec::new()),
        }
    }

    /// `(plan, question)` pairs in the order they were shown.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.read().unwrap().clone()
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, plan: &str, question: &str) -> bool {
        self.prompts
            .write()
            .unwrap()
            .push((plan.to_string(), question.to_string()));
        self.answer
    }
}
