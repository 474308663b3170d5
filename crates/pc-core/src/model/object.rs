//! Object types, scene expectations and runtime scene objects.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::geometry::Point;

/// Closed set of object categories the engine logs.
///
/// The textual forms accepted by the config loader are the `strum`
/// serializations below; the log's scene table uses its own tokens, see
/// [`ObjectType::from_scene_token`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
pub enum ObjectType {
    #[default]
    #[strum(serialize = "player")]
    Player,
    #[strum(serialize = "mob")]
    Mob,
    #[strum(serialize = "intobj")]
    IntObject,
    #[strum(serialize = "static")]
    Static,
}

impl ObjectType {
    /// Maps a scene-table type token; anything unrecognized is static
    /// scenery.
    pub fn from_scene_token(s: &str) -> Self {
        match s {
            "mob" => ObjectType::Mob,
            "interactive_object" => ObjectType::IntObject,
            _ => ObjectType::Static,
        }
    }
}

/// An object the scene *must* contain, with partially specified
/// attributes. Empty class and zero hp/damage mean "do not constrain".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseObject {
    pub ty: ObjectType,
    pub class: String,
    /// Expected position; `None` when the config leaves it open.
    pub pos: Option<Point>,
    pub hp: f32,
    pub damage: f32,
}

/// A cardinality constraint on scene objects of a given type and class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRequirement {
    pub ty: ObjectType,
    pub class: String,
    pub minimum: u8,
    pub limit: u8,
}

/// A scene object materialized from the log, mutated as position events
/// stream in. Lives only for the duration of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeObject {
    pub ty: ObjectType,
    pub class: String,
    pub id: String,
    pub pos: Point,
    pub prev_pos: Point,
    pub hp: f32,
    pub damage: f32,
    pub pos_predefined: bool,
    /// Set once the object has been consumed by a base-object match.
    pub valid: bool,
}

impl RuntimeObject {
    /// The synthesized player: empty id and class, positions seeded from
    /// the log header's start position.
    pub fn player(start: Point) -> Self {
        Self {
            ty: ObjectType::Player,
            class: String::new(),
            id: String::new(),
            pos: start,
            prev_pos: start,
            hp: 0.0,
            damage: 0.0,
            pos_predefined: true,
            valid: false,
        }
    }

    /// Records a movement: the current position becomes the previous one.
    pub fn move_to(&mut self, pos: Point) {
        self.prev_pos = self.pos;
        self.pos = pos;
    }
}
