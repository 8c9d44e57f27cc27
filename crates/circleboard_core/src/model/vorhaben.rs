//! Vorhaben: ad-hoc initiatives with subtasks and volunteers.
//!
//! Vorhaben live outside the circle/role hierarchy.

use crate::model::person::PersonId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type VorhabenId = Uuid;
pub type SubtaskId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VorhabenStatus {
    Idea,
    Active,
    Done,
}

impl VorhabenStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idea => "idea",
            Self::Active => "active",
            Self::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "idea" => Some(Self::Idea),
            "active" => Some(Self::Active),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub uuid: SubtaskId,
    pub vorhaben_uuid: VorhabenId,
    pub title: String,
    pub is_done: bool,
    pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vorhaben {
    pub uuid: VorhabenId,
    pub title: String,
    pub description: Option<String>,
    pub status: VorhabenStatus,
    pub created_by: Option<PersonId>,
    /// Ordered by `sort_order`.
    pub subtasks: Vec<Subtask>,
    /// Volunteers in sign-up order; each person appears at most once.
    pub volunteers: Vec<PersonId>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Vorhaben {
    /// Share of finished subtasks in `0.0..=1.0`; `0.0` without subtasks.
    pub fn progress(&self) -> f64 {
        if self.subtasks.is_empty() {
            return 0.0;
        }
        let done = self.subtasks.iter().filter(|task| task.is_done).count();
        done as f64 / self.subtasks.len() as f64
    }
}
