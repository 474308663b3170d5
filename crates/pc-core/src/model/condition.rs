//! Behavioral conditions a task checks against the log.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::ObjectType;

/// Closed set of condition predicates; the `strum` serializations are the
/// config file tokens.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
pub enum ConditionKind {
    /// Primary and secondary objects within `arg` of each other.
    #[strum(serialize = "proxy")]
    Proximity,
    /// Primary object moving towards the secondary object.
    #[strum(serialize = "approach")]
    Approaching,
    /// Primary object moving away from the secondary object.
    #[strum(serialize = "retire")]
    Retiring,
    /// Primary object changed position.
    #[strum(serialize = "move")]
    Moving,
    /// The game ended with a win.
    #[strum(serialize = "win")]
    GameWon,
    /// Primary attacked secondary for at most `arg` damage.
    #[strum(serialize = "attack")]
    Attacked,
    /// Primary was damaged for at most `arg`.
    #[strum(serialize = "damage")]
    Damaged,
    /// Primary was destroyed.
    #[strum(serialize = "destroy")]
    Destroyed,
}

/// Which objects a predicate applies to. The class is ignored for the
/// player, which carries no class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub ty: ObjectType,
    pub class: String,
}

impl core::fmt::Display for Selector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.ty, self.class)
    }
}

/// A single testable predicate over scene state or an event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub kind: ConditionKind,
    pub primary: Selector,
    pub secondary: Selector,
    pub arg: f32,
}

impl core::fmt::Display for Predicate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}: {}-[{:.2}]-{}",
            self.kind, self.primary, self.arg, self.secondary
        )
    }
}

/// A numbered task condition: one predicate, optionally AND-combined with
/// a second one. Exactly one level of nesting is permitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// 1-based ordinal from the config file.
    pub n: u8,
    pub first: Predicate,
    pub second: Option<Predicate>,
}

impl core::fmt::Display for Condition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}. {}", self.n, self.first)?;
        if let Some(second) = &self.second {
            write!(f, " AND {}", second)?;
        }
        Ok(())
    }
}
