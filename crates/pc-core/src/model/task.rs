//! Tasks and the top-level checker state.

use serde::{Deserialize, Serialize};

use super::{BaseObject, Condition, ObjectRequirement};

/// A named bundle of scene expectations and behavioral conditions.
///
/// Immutable after load; per-check bookkeeping (which base objects were
/// matched, how many objects satisfy each requirement) lives in the check
/// invocation, so a single task can drive any number of checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub base_objects: Vec<BaseObject>,
    pub requirements: Vec<ObjectRequirement>,
    pub conditions: Vec<Condition>,
}

/// The loaded checker: the signing secret and the tasks from the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checker {
    pub(crate) secret: String,
    pub(crate) tasks: Vec<Task>,
}

impl Checker {
    /// Looks a task up by name. Lookup is linear; the task list is small
    /// and built once at init.
    pub fn find_task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// All loaded tasks, in config encounter order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }
}
