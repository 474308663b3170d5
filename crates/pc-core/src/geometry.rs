//! Planar points and the lexical helpers around them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{DELTA, MAX_STR_LEN};

/// Failure to read a `(x,y)` coordinate pair.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordError {
    #[error("missing ',' separator in coordinates")]
    MissingSeparator,
    #[error("invalid coordinate component '{0}'")]
    InvalidNumber(String),
}

/// A position on the game plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn dist(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Tolerant equality: both points within [`DELTA`] of each other.
    pub fn close_to(&self, other: &Point) -> bool {
        self.dist(other) <= DELTA
    }
}

impl core::fmt::Display for Point {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Parses a coordinate pair: optional surrounding parentheses and
/// whitespace, two float components split on the first `,`.
pub fn parse_coords(s: &str) -> Result<Point, CoordError> {
    let s = s.trim_matches([' ', '\t']);
    let s = s.strip_prefix('(').unwrap_or(s);
    let s = s.strip_suffix(')').unwrap_or(s);
    let (x, y) = s.split_once(',').ok_or(CoordError::MissingSeparator)?;
    Ok(Point::new(parse_component(x)?, parse_component(y)?))
}

fn parse_component(s: &str) -> Result<f32, CoordError> {
    let s = s.trim();
    s.parse::<f32>()
        .map_err(|_| CoordError::InvalidNumber(s.to_string()))
}

/// Copies a string, truncating to [`MAX_STR_LEN`] bytes on a character
/// boundary.
pub fn bounded(s: &str) -> String {
    if s.len() <= MAX_STR_LEN {
        return s.to_string();
    }
    let mut end = MAX_STR_LEN;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}
