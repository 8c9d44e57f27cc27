//! Circle, role and role-assignment records.
//!
//! # Invariants
//! - At most one circle per well-formed hierarchy has no parent (the root).
//! - A role belongs to exactly one circle.
//! - A role assignment is current while `ended_at` is `None`.

use crate::model::person::PersonId;
use crate::model::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CircleId = Uuid;
pub type RoleId = Uuid;
pub type RoleAssignmentId = Uuid;

/// Organizational unit that may contain sub-circles and roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    pub uuid: CircleId,
    pub name: String,
    pub purpose: Option<String>,
    /// Hex color used by the circle diagram.
    pub color: Option<String>,
    /// Icon name rendered inside the circle.
    pub icon: Option<String>,
    /// `None` marks the root circle.
    pub parent_circle_uuid: Option<CircleId>,
}

impl Circle {
    /// Creates a circle with a generated stable ID.
    pub fn new(name: impl Into<String>, parent_circle_uuid: Option<CircleId>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            purpose: None,
            color: None,
            icon: None,
            parent_circle_uuid,
        }
    }

    /// Checks field-level invariants before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankField("circle name"));
        }
        if let Some(color) = self.color.as_deref() {
            if !is_hex_color(color) {
                return Err(ValidationError::InvalidColor(color.to_string()));
            }
        }
        Ok(())
    }
}

/// Named responsibility within one circle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub uuid: RoleId,
    pub circle_uuid: CircleId,
    pub name: String,
    pub purpose: Option<String>,
}

impl Role {
    pub fn new(circle_uuid: CircleId, name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            circle_uuid,
            name: name.into(),
            purpose: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankField("role name"));
        }
        Ok(())
    }
}

/// One person holding one role over a time span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub uuid: RoleAssignmentId,
    pub role_uuid: RoleId,
    pub person_uuid: PersonId,
    pub started_at: i64,
    pub ended_at: Option<i64>,
}

impl RoleAssignment {
    pub fn is_current(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// Accepts `#rgb` and `#rrggbb`.
pub fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::{is_hex_color, Circle};
    use crate::model::ValidationError;

    #[test]
    fn hex_colors_accept_short_and_long_form() {
        assert!(is_hex_color("#abc"));
        assert!(is_hex_color("#A1B2C3"));
        assert!(!is_hex_color("abc"));
        assert!(!is_hex_color("#abcd"));
        assert!(!is_hex_color("#ggg"));
    }

    #[test]
    fn circle_validation_rejects_blank_name_and_bad_color() {
        let blank = Circle::new("  ", None);
        assert_eq!(
            blank.validate().expect_err("blank name"),
            ValidationError::BlankField("circle name")
        );

        let mut colored = Circle::new("Vorstand", None);
        colored.color = Some("red".to_string());
        assert!(matches!(
            colored.validate(),
            Err(ValidationError::InvalidColor(value)) if value == "red"
        ));
    }
}
