//! Persisted domain records for the governance core.
//!
//! # Responsibility
//! - Define canonical data structures used by repositories and services.
//! - Own the string codes used for enum columns in storage.
//!
//! # Invariants
//! - Every persisted object is identified by a stable v4 UUID.
//! - Timestamps are Unix epoch milliseconds.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod circle;
pub mod meeting;
pub mod person;
pub mod tension;
pub mod vorhaben;

/// Field-level validation failures shared by all models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is blank after trim.
    BlankField(&'static str),
    /// Color is not a `#rgb` or `#rrggbb` hex string.
    InvalidColor(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::InvalidColor(value) => {
                write!(f, "invalid color `{value}`; expected #rgb or #rrggbb")
            }
        }
    }
}

impl Error for ValidationError {}

/// Trims a required text value, rejecting blank input.
pub fn normalize_required(
    value: impl Into<String>,
    field: &'static str,
) -> Result<String, ValidationError> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text value; blank input collapses to `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{normalize_optional, normalize_required, ValidationError};

    #[test]
    fn required_text_is_trimmed() {
        assert_eq!(
            normalize_required("  Kita  ", "name").expect("non-blank"),
            "Kita"
        );
        assert_eq!(
            normalize_required(" \n", "name").expect_err("blank"),
            ValidationError::BlankField("name")
        );
    }

    #[test]
    fn optional_blank_collapses_to_none() {
        assert_eq!(normalize_optional(Some("   ".to_string())), None);
        assert_eq!(
            normalize_optional(Some(" x ".to_string())),
            Some("x".to_string())
        );
    }
}
