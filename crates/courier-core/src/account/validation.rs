//! Address checks shared by registration and dispatch.

/// Canonical form used for every email comparison: trimmed and lowercased.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic format check: non-empty and strictly shorter than `max_len` bytes.
///
/// This does not check that the address is registered.
#[must_use]
pub fn is_well_formed_email(email: &str, max_len: usize) -> bool {
    let email = email.trim();
    !email.is_empty() && email.len() < max_len
}
