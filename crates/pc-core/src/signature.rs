//! Tamper-evident signature over a check result.

use sha2::{Digest, Sha256};

/// Signs a `(secret, task, salt, result)` tuple: lowercase hex of the
/// SHA-256 over `"<secret>:<task>:<salt>:<result>"`, the result rendered
/// as a signed decimal integer.
pub fn signature_code(secret: &str, task: &str, salt: i32, result: u8) -> String {
    let payload = format!("{secret}:{task}:{salt}:{}", i32::from(result));
    hex::encode(Sha256::digest(payload.as_bytes()))
}
