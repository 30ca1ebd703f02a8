use super::task::TaskDescriptor;
use crate::errors::RegistryError;
use std::collections::HashMap;
use tracing::debug;

/// Catalog of the tasks a process can dispatch.
///
/// The registry is filled through `&mut` access while the process starts and
/// is then shared as `Arc<TaskRegistry>`. Once shared it can no longer be
/// mutated, so lookups never need a lock.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, TaskDescriptor>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task under its descriptor name
    ///
    /// # Errors
    /// * `RegistryError::DuplicateName` if the name is already taken
    pub fn register(&mut self, descriptor: TaskDescriptor) -> Result<(), RegistryError> {
        let name = descriptor.name().to_string();
        if self.tasks.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        debug!("Registered task {}", name);
        self.tasks.insert(name, descriptor);
        Ok(())
    }

    /// Looks up a task by name
    ///
    /// # Errors
    /// * `RegistryError::UnknownTask` if nothing is registered under `name`
    pub fn get_task(&self, name: &str) -> Result<&TaskDescriptor, RegistryError> {
        self.tasks
            .get(name)
            .ok_or_else(|| RegistryError::UnknownTask(name.to_string()))
    }

    /// Registered task names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tasks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }
}
