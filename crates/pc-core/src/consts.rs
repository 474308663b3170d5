//! Limits and tolerances shared across the checker.

/// Maximum number of conditions a task may define; one result bit each.
pub const MAX_CONDITIONS: usize = 7;

/// Mask of the result bits that may legally be set.
pub const RESULT_VALID_FLAGS: u8 = 0x7f;

/// Upper bound (in bytes) for any string stored from a config or log file.
pub const MAX_STR_LEN: usize = 4095;

/// Tolerance for coordinate equality checks.
pub const DELTA: f32 = 0.001;
