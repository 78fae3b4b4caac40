//! Session code generation.
//!
//! Codes are 6 characters drawn from uppercase ASCII letters and digits.
//! Uniqueness is enforced by storage; callers regenerate on collision.

use rand::Rng;

use crate::errors::domain::{DomainError, ValidationKind};

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const CODE_LEN: usize = 6;

/// Generate a random session code using the thread-local CSPRNG.
pub fn generate_session_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Canonicalize a user-supplied code (trim + uppercase) and check its shape.
pub fn normalize_session_code(raw: &str) -> Result<String, DomainError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() != CODE_LEN || !code.bytes().all(|b| ALPHABET.contains(&b)) {
        return Err(DomainError::validation(
            ValidationKind::InvalidSessionCode,
            format!("session code must be {CODE_LEN} letters or digits"),
        ));
    }
    Ok(code)
}
