//! Tension records raised against circles.

use crate::model::circle::CircleId;
use crate::model::person::PersonId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TensionId = Uuid;

/// Lifecycle of a tension.
///
/// `Scheduled` is set when the tension lands on a meeting agenda and
/// `Resolved` when the linked agenda item is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensionStatus {
    Open,
    Scheduled,
    Resolved,
}

impl TensionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Scheduled => "scheduled",
            Self::Resolved => "resolved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(Self::Open),
            "scheduled" => Some(Self::Scheduled),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tension {
    pub uuid: TensionId,
    pub circle_uuid: CircleId,
    pub raised_by: Option<PersonId>,
    pub title: String,
    pub description: Option<String>,
    pub status: TensionStatus,
    pub created_at: i64,
    pub updated_at: i64,
}
