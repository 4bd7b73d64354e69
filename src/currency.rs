//! Currency code rules
//!
//! The rate provider quotes one base currency against ~160 targets, so codes
//! are kept as open ISO-4217-style strings rather than a closed enum.

/// Check whether a code is a recognizable currency code:
/// exactly 3 ASCII-alphabetic characters (e.g. USD, BRL).
pub fn is_valid_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Normalize a raw code to the canonical uppercase form.
///
/// Normalization does not imply validity; the validator decides that.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Check that a base/target pair denotes a real conversion (distinct codes).
pub fn is_distinct_pair(base: &str, target: &str) -> bool {
    base != target
}
