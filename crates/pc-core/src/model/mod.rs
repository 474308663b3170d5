//! In-memory task model and runtime scene objects.

mod condition;
mod object;
mod task;

pub use condition::{Condition, ConditionKind, Predicate, Selector};
pub use object::{BaseObject, ObjectRequirement, ObjectType, RuntimeObject};
pub use task::{Checker, Task};
