//! The condition × object satisfaction matrix and its reduction.

use crate::consts::MAX_CONDITIONS;
use crate::eval::Satisfier;

/// Monotonic bit grid: cell `(i, k)` records that condition `i` was
/// satisfied with object `k` as the actor. Cells only ever go from unset
/// to set.
#[derive(Debug, Clone)]
pub struct SatisfactionMatrix {
    rows: Vec<Vec<bool>>,
    conditions: usize,
}

impl SatisfactionMatrix {
    pub fn new(conditions: usize, objects: usize) -> Self {
        Self {
            rows: vec![vec![false; objects]; MAX_CONDITIONS],
            conditions,
        }
    }

    /// Credits condition `cond` under the no-later-wins rule: an actor
    /// already credited with any higher-indexed condition does not newly
    /// receive a lower-indexed one. Cells that are already set stay set.
    pub fn record(&mut self, cond: usize, satisfier: Satisfier) {
        match satisfier {
            Satisfier::Actor(k) => {
                if !self.later_satisfied(cond, k) {
                    self.rows[cond][k] = true;
                }
            }
            Satisfier::AllObjects => {
                for k in 0..self.objects() {
                    if !self.later_satisfied(cond, k) {
                        self.rows[cond][k] = true;
                    }
                }
            }
        }
    }

    pub fn is_set(&self, cond: usize, object: usize) -> bool {
        self.rows[cond][object]
    }

    pub fn objects(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Folds the matrix into the result byte: bit `i` is the OR of row
    /// `i`. Only the low `conditions` bits can be set, so the reserved
    /// high bit stays clear.
    pub fn result_byte(&self) -> u8 {
        let mut result = 0u8;
        for (i, row) in self.rows.iter().take(self.conditions).enumerate() {
            if row.iter().any(|&cell| cell) {
                result |= 1 << i;
            }
        }
        result
    }

    fn later_satisfied(&self, cond: usize, object: usize) -> bool {
        (cond + 1..self.conditions).any(|j| self.rows[j][object])
    }
}

impl core::fmt::Display for SatisfactionMatrix {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, row) in self.rows.iter().take(self.conditions).enumerate() {
            write!(f, "{i}:")?;
            for &cell in row {
                write!(f, " {}", u8::from(cell))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
