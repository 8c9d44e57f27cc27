//! Meeting, agenda and round-entry records.
//!
//! # Responsibility
//! - Define persisted meeting state and the live phase enumeration.
//! - Encode the forward-only phase order in one place.
//!
//! # Invariants
//! - Phases only move forward: `CheckIn -> Agenda -> Closing`, then the
//!   meeting status flips to `Completed`.
//! - `current_phase` is `None` until the meeting is started.
//! - Agenda positions are 1-based and unique within one meeting.
//! - At most one round entry exists per (meeting, person, phase).

use crate::model::circle::CircleId;
use crate::model::person::PersonId;
use crate::model::tension::TensionId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type MeetingId = Uuid;
pub type AgendaItemId = Uuid;
pub type AgendaCommentId = Uuid;
pub type RoundEntryId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingType {
    /// Operational sync: projects, metrics, next actions.
    Tactical,
    /// Changes to roles, policies and circle structure.
    Governance,
}

impl MeetingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tactical => "tactical",
            Self::Governance => "governance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tactical" => Some(Self::Tactical),
            "governance" => Some(Self::Governance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Scheduled,
    Active,
    Completed,
}

impl MeetingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(Self::Scheduled),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Live facilitation phase of an active meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingPhase {
    CheckIn,
    Agenda,
    Closing,
}

/// Result of stepping forward from one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStep {
    /// Move into the given phase.
    Enter(MeetingPhase),
    /// Leave the last phase; the meeting becomes completed.
    Complete,
}

impl MeetingPhase {
    /// Phase a freshly started meeting enters.
    pub const INITIAL: MeetingPhase = MeetingPhase::CheckIn;

    /// Single forward step. There is no inverse.
    pub fn step(self) -> PhaseStep {
        match self {
            Self::CheckIn => PhaseStep::Enter(Self::Agenda),
            Self::Agenda => PhaseStep::Enter(Self::Closing),
            Self::Closing => PhaseStep::Complete,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckIn => "check_in",
            Self::Agenda => "agenda",
            Self::Closing => "closing",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "check_in" => Some(Self::CheckIn),
            "agenda" => Some(Self::Agenda),
            "closing" => Some(Self::Closing),
            _ => None,
        }
    }
}

/// Phase tag of a round entry. Only check-in and closing have rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    CheckIn,
    Closing,
}

impl RoundPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckIn => "check_in",
            Self::Closing => "closing",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "check_in" => Some(Self::CheckIn),
            "closing" => Some(Self::Closing),
            _ => None,
        }
    }

    /// Meeting phase during which entries of this kind are accepted.
    pub fn meeting_phase(self) -> MeetingPhase {
        match self {
            Self::CheckIn => MeetingPhase::CheckIn,
            Self::Closing => MeetingPhase::Closing,
        }
    }
}

/// Persisted meeting row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub uuid: MeetingId,
    pub circle_uuid: CircleId,
    pub meeting_type: MeetingType,
    /// Epoch milliseconds.
    pub scheduled_at: i64,
    pub status: MeetingStatus,
    pub facilitator_uuid: Option<PersonId>,
    pub notes: Option<String>,
    /// Generated when the meeting completes.
    pub protocol: Option<String>,
    pub current_phase: Option<MeetingPhase>,
    /// 1-based pointer into the agenda; moved only by an explicit
    /// position update, never by processing an item.
    pub current_agenda_position: Option<u32>,
}

impl Meeting {
    pub fn new(circle_uuid: CircleId, meeting_type: MeetingType, scheduled_at: i64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            circle_uuid,
            meeting_type,
            scheduled_at,
            status: MeetingStatus::Scheduled,
            facilitator_uuid: None,
            notes: None,
            protocol: None,
            current_phase: None,
            current_agenda_position: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MeetingStatus::Active
    }
}

/// Append-only comment on one agenda item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaComment {
    pub uuid: AgendaCommentId,
    pub agenda_item_uuid: AgendaItemId,
    pub person_uuid: PersonId,
    pub content: String,
    pub created_at: i64,
}

/// One topic on a meeting agenda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaItem {
    pub uuid: AgendaItemId,
    pub meeting_uuid: MeetingId,
    pub position: u32,
    pub tension_uuid: Option<TensionId>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub is_processed: bool,
    pub outcome: Option<String>,
    /// Ordered by creation time.
    pub comments: Vec<AgendaComment>,
}

/// Personal free-text contribution in the check-in or closing round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundEntry {
    pub uuid: RoundEntryId,
    pub meeting_uuid: MeetingId,
    pub person_uuid: PersonId,
    pub phase: RoundPhase,
    pub content: String,
    pub updated_at: i64,
}

/// Person listed as present in a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub person_uuid: PersonId,
    pub display_name: String,
    pub joined_at: i64,
}
