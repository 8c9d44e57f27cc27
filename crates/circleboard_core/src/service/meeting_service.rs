//! Meeting lifecycle and live phase controller.
//!
//! # Responsibility
//! - Drive `CHECK_IN -> AGENDA -> CLOSING -> completed` one step at a time.
//! - Gate facilitator-only mutations behind an explicit [`Actor`].
//! - Publish a [`ChangeNotification`] after every successful write so open
//!   live views can refetch the changed slice.
//!
//! # Invariants
//! - Phases only move forward; there is no way back.
//! - Processing an agenda item never moves the agenda pointer.
//! - Round entries are written for the caller only, in the matching phase.

use crate::live::feed::{ChangeFeed, ChangeNotification, ChangeSlice};
use crate::model::circle::CircleId;
use crate::model::meeting::{
    AgendaComment, AgendaItem, AgendaItemId, Meeting, MeetingId, MeetingPhase, MeetingStatus,
    MeetingType, PhaseStep, RoundEntry, RoundPhase,
};
use crate::model::person::{Actor, PersonId};
use crate::model::{normalize_optional, ValidationError};
use crate::repo::meeting_repo::{MeetingRepository, NewAgendaItem};
use crate::repo::RepoError;
use crate::service::protocol::{render_protocol, ProtocolInput};
use crate::service::{
    repo_error_code, CODE_INVALID_TRANSITION, CODE_NOT_FOUND, CODE_UNAUTHORIZED,
    CODE_VALIDATION,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Facilitation policy for leaving the agenda phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhasePolicy {
    /// Refuse `AGENDA -> CLOSING` while any item is unprocessed.
    pub require_all_processed: bool,
}

/// Errors from meeting service operations.
#[derive(Debug)]
pub enum MeetingServiceError {
    /// Caller is neither the facilitator nor an admin.
    Unauthorized { action: &'static str },
    Validation(ValidationError),
    /// Requested agenda position outside `1..=item_count`.
    PositionOutOfRange { position: u32, item_count: usize },
    MeetingNotFound(MeetingId),
    AgendaItemNotFound(AgendaItemId),
    /// Operation not allowed in the meeting's current status or phase.
    InvalidTransition {
        meeting_uuid: MeetingId,
        reason: &'static str,
    },
    Repo(RepoError),
}

impl MeetingServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => CODE_UNAUTHORIZED,
            Self::Validation(_) | Self::PositionOutOfRange { .. } => CODE_VALIDATION,
            Self::MeetingNotFound(_) | Self::AgendaItemNotFound(_) => CODE_NOT_FOUND,
            Self::InvalidTransition { .. } => CODE_INVALID_TRANSITION,
            Self::Repo(err) => repo_error_code(err),
        }
    }
}

impl Display for MeetingServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized { action } => {
                write!(f, "only the facilitator or an admin may {action}")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::PositionOutOfRange {
                position,
                item_count,
            } => write!(
                f,
                "agenda position {position} outside 1..={item_count}"
            ),
            Self::MeetingNotFound(id) => write!(f, "meeting not found: {id}"),
            Self::AgendaItemNotFound(id) => write!(f, "agenda item not found: {id}"),
            Self::InvalidTransition {
                meeting_uuid,
                reason,
            } => write!(f, "meeting {meeting_uuid}: {reason}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MeetingServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for MeetingServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for MeetingServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Result of one `advance_phase` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseAdvance {
    pub previous: MeetingPhase,
    pub step: PhaseStep,
    /// Agenda items still unprocessed when the agenda phase was left.
    pub unprocessed_items: usize,
    /// Generated text when the meeting was completed.
    pub protocol: Option<String>,
}

/// Meeting service facade.
pub struct MeetingService<R: MeetingRepository> {
    repo: R,
    policy: PhasePolicy,
    feed: Option<ChangeFeed>,
}

impl<R: MeetingRepository> MeetingService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            policy: PhasePolicy::default(),
            feed: None,
        }
    }

    pub fn with_policy(mut self, policy: PhasePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Publishes change notifications to `feed` after each write.
    pub fn with_feed(mut self, feed: ChangeFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn policy(&self) -> PhasePolicy {
        self.policy
    }

    pub fn create_meeting(
        &self,
        circle_uuid: CircleId,
        meeting_type: MeetingType,
        scheduled_at: i64,
        facilitator: Option<PersonId>,
    ) -> Result<Meeting, MeetingServiceError> {
        let mut meeting = Meeting::new(circle_uuid, meeting_type, scheduled_at);
        meeting.facilitator_uuid = facilitator;
        self.repo.create_meeting(&meeting)?;
        info!(
            "event=meeting_create module=service status=ok meeting_uuid={} type={}",
            meeting.uuid,
            meeting_type.as_str()
        );
        Ok(meeting)
    }

    pub fn get_meeting(&self, meeting_uuid: MeetingId) -> Result<Meeting, MeetingServiceError> {
        self.repo
            .get_meeting(meeting_uuid)?
            .ok_or(MeetingServiceError::MeetingNotFound(meeting_uuid))
    }

    /// Hands facilitation to someone else. Facilitator or admin only.
    pub fn set_facilitator(
        &self,
        actor: &Actor,
        meeting_uuid: MeetingId,
        facilitator: Option<PersonId>,
    ) -> Result<(), MeetingServiceError> {
        let meeting = self.get_meeting(meeting_uuid)?;
        ensure_facilitator(actor, &meeting, "change the facilitator")?;
        ensure_not_completed(&meeting)?;
        self.repo.set_facilitator(meeting_uuid, facilitator)?;
        self.notify(meeting_uuid, ChangeSlice::Meeting);
        Ok(())
    }

    /// Appends an agenda item. Open to every participant until completion.
    pub fn add_agenda_item(
        &self,
        meeting_uuid: MeetingId,
        item: NewAgendaItem,
    ) -> Result<AgendaItem, MeetingServiceError> {
        let meeting = self.get_meeting(meeting_uuid)?;
        ensure_not_completed(&meeting)?;
        if item.tension_uuid.is_none() && normalize_optional(item.title.clone()).is_none() {
            return Err(MeetingServiceError::Validation(ValidationError::BlankField(
                "agenda item title",
            )));
        }

        let created = self.repo.add_agenda_item(meeting_uuid, &item)?;
        self.notify(meeting_uuid, ChangeSlice::AgendaItems);
        Ok(created)
    }

    pub fn list_agenda_items(
        &self,
        meeting_uuid: MeetingId,
    ) -> Result<Vec<AgendaItem>, MeetingServiceError> {
        self.get_meeting(meeting_uuid)?;
        self.repo.list_agenda_items(meeting_uuid).map_err(Into::into)
    }

    /// `scheduled -> active`, entering the check-in phase.
    pub fn start_meeting(
        &self,
        actor: &Actor,
        meeting_uuid: MeetingId,
    ) -> Result<Meeting, MeetingServiceError> {
        let meeting = self.get_meeting(meeting_uuid)?;
        ensure_facilitator(actor, &meeting, "start the meeting")?;
        if meeting.status != MeetingStatus::Scheduled {
            return Err(MeetingServiceError::InvalidTransition {
                meeting_uuid,
                reason: "only scheduled meetings can be started",
            });
        }

        let has_items = !self.repo.list_agenda_items(meeting_uuid)?.is_empty();
        self.repo
            .start_meeting(meeting_uuid, has_items.then_some(1))?;
        info!(
            "event=meeting_start module=service status=ok meeting_uuid={} has_agenda={}",
            meeting_uuid, has_items
        );
        self.notify(meeting_uuid, ChangeSlice::Meeting);
        self.get_meeting(meeting_uuid)
    }

    /// Moves the meeting one phase forward, completing it after closing.
    pub fn advance_phase(
        &self,
        actor: &Actor,
        meeting_uuid: MeetingId,
    ) -> Result<PhaseAdvance, MeetingServiceError> {
        let meeting = self.get_meeting(meeting_uuid)?;
        ensure_facilitator(actor, &meeting, "advance the phase")?;
        let current = active_phase(&meeting)?;

        let mut unprocessed_items = 0;
        if current == MeetingPhase::Agenda {
            unprocessed_items = self
                .repo
                .list_agenda_items(meeting_uuid)?
                .iter()
                .filter(|item| !item.is_processed)
                .count();
            if unprocessed_items > 0 && self.policy.require_all_processed {
                warn!(
                    "event=meeting_phase_advance module=service status=rejected meeting_uuid={} unprocessed={}",
                    meeting_uuid, unprocessed_items
                );
                return Err(MeetingServiceError::InvalidTransition {
                    meeting_uuid,
                    reason: "agenda items remain unprocessed",
                });
            }
        }

        let step = current.step();
        let protocol = match step {
            PhaseStep::Enter(next) => {
                self.repo.set_phase(meeting_uuid, next)?;
                None
            }
            PhaseStep::Complete => {
                let protocol = self.render_protocol_for(&meeting)?;
                self.repo.complete_meeting(meeting_uuid, &protocol)?;
                Some(protocol)
            }
        };

        info!(
            "event=meeting_phase_advance module=service status=ok meeting_uuid={} from={} to={} unprocessed={}",
            meeting_uuid,
            current.as_str(),
            match step {
                PhaseStep::Enter(next) => next.as_str(),
                PhaseStep::Complete => "completed",
            },
            unprocessed_items
        );
        self.notify(meeting_uuid, ChangeSlice::Meeting);

        Ok(PhaseAdvance {
            previous: current,
            step,
            unprocessed_items,
            protocol,
        })
    }

    /// Marks an item processed and stores its outcome. Repeat calls overwrite.
    pub fn process_agenda_item(
        &self,
        actor: &Actor,
        item_uuid: AgendaItemId,
        outcome: Option<String>,
    ) -> Result<AgendaItem, MeetingServiceError> {
        let item = self.get_agenda_item(item_uuid)?;
        let meeting = self.get_meeting(item.meeting_uuid)?;
        ensure_facilitator(actor, &meeting, "process agenda items")?;
        if active_phase(&meeting)? != MeetingPhase::Agenda {
            return Err(MeetingServiceError::InvalidTransition {
                meeting_uuid: meeting.uuid,
                reason: "agenda items can only be processed during the agenda phase",
            });
        }

        let outcome = normalize_optional(outcome);
        self.repo
            .mark_agenda_item_processed(item_uuid, outcome.as_deref())?;
        info!(
            "event=agenda_item_process module=service status=ok meeting_uuid={} position={}",
            meeting.uuid, item.position
        );
        self.notify(meeting.uuid, ChangeSlice::AgendaItems);
        self.get_agenda_item(item_uuid)
    }

    /// Moves the agenda pointer. Processing items never does this.
    pub fn set_agenda_position(
        &self,
        actor: &Actor,
        meeting_uuid: MeetingId,
        position: u32,
    ) -> Result<(), MeetingServiceError> {
        let meeting = self.get_meeting(meeting_uuid)?;
        ensure_facilitator(actor, &meeting, "move the agenda pointer")?;
        active_phase(&meeting)?;

        let item_count = self.repo.list_agenda_items(meeting_uuid)?.len();
        if position == 0 || position as usize > item_count {
            return Err(MeetingServiceError::PositionOutOfRange {
                position,
                item_count,
            });
        }
        self.repo.set_agenda_position(meeting_uuid, position)?;
        self.notify(meeting_uuid, ChangeSlice::Meeting);
        Ok(())
    }

    /// Registers the caller as attendee. Returns `false` when already present.
    pub fn join_meeting(
        &self,
        actor: &Actor,
        meeting_uuid: MeetingId,
    ) -> Result<bool, MeetingServiceError> {
        let meeting = self.get_meeting(meeting_uuid)?;
        ensure_not_completed(&meeting)?;
        let inserted = self.repo.add_attendee(meeting_uuid, actor.person_uuid)?;
        if inserted {
            info!(
                "event=meeting_join module=service status=ok meeting_uuid={}",
                meeting_uuid
            );
            self.notify(meeting_uuid, ChangeSlice::Attendees);
        }
        Ok(inserted)
    }

    /// Upserts the caller's own check-in or closing entry.
    pub fn save_round_entry(
        &self,
        actor: &Actor,
        meeting_uuid: MeetingId,
        phase: RoundPhase,
        content: &str,
    ) -> Result<RoundEntry, MeetingServiceError> {
        let meeting = self.get_meeting(meeting_uuid)?;
        if active_phase(&meeting)? != phase.meeting_phase() {
            return Err(MeetingServiceError::InvalidTransition {
                meeting_uuid,
                reason: "round entries are only accepted during their own phase",
            });
        }

        let entry =
            self.repo
                .upsert_round_entry(meeting_uuid, actor.person_uuid, phase, content)?;
        self.notify(meeting_uuid, ChangeSlice::RoundEntries);
        Ok(entry)
    }

    /// Appends a comment to an agenda item. Any participant may comment.
    pub fn add_agenda_comment(
        &self,
        actor: &Actor,
        item_uuid: AgendaItemId,
        content: &str,
    ) -> Result<AgendaComment, MeetingServiceError> {
        let item = self.get_agenda_item(item_uuid)?;
        let meeting = self.get_meeting(item.meeting_uuid)?;
        ensure_not_completed(&meeting)?;

        let comment = self
            .repo
            .add_agenda_comment(item_uuid, actor.person_uuid, content)?;
        self.notify(meeting.uuid, ChangeSlice::Comments);
        Ok(comment)
    }

    /// Overwrites the outcome text without touching the processed flag.
    pub fn update_agenda_item_outcome(
        &self,
        actor: &Actor,
        item_uuid: AgendaItemId,
        outcome: Option<String>,
    ) -> Result<(), MeetingServiceError> {
        let item = self.get_agenda_item(item_uuid)?;
        let meeting = self.get_meeting(item.meeting_uuid)?;
        ensure_facilitator(actor, &meeting, "edit agenda outcomes")?;
        ensure_not_completed(&meeting)?;

        let outcome = normalize_optional(outcome);
        self.repo
            .update_agenda_item_outcome(item_uuid, outcome.as_deref())?;
        self.notify(meeting.uuid, ChangeSlice::AgendaItems);
        Ok(())
    }

    /// Renders the protocol as it would look if the meeting ended now.
    pub fn preview_protocol(&self, meeting_uuid: MeetingId) -> Result<String, MeetingServiceError> {
        let meeting = self.get_meeting(meeting_uuid)?;
        self.render_protocol_for(&meeting)
    }

    fn get_agenda_item(&self, item_uuid: AgendaItemId) -> Result<AgendaItem, MeetingServiceError> {
        self.repo
            .get_agenda_item(item_uuid)?
            .ok_or(MeetingServiceError::AgendaItemNotFound(item_uuid))
    }

    fn render_protocol_for(&self, meeting: &Meeting) -> Result<String, MeetingServiceError> {
        let labels = self
            .repo
            .meeting_labels(meeting.uuid)?
            .ok_or(MeetingServiceError::MeetingNotFound(meeting.uuid))?;
        let attendees = self.repo.list_attendees(meeting.uuid)?;
        let check_ins = self
            .repo
            .list_round_entries(meeting.uuid, RoundPhase::CheckIn)?;
        let agenda_items = self.repo.list_agenda_items(meeting.uuid)?;
        let closings = self
            .repo
            .list_round_entries(meeting.uuid, RoundPhase::Closing)?;

        Ok(render_protocol(&ProtocolInput {
            meeting,
            circle_name: &labels.circle_name,
            facilitator_name: labels.facilitator_name.as_deref(),
            attendees: &attendees,
            participant_names: &labels.participant_names,
            check_ins: &check_ins,
            agenda_items: &agenda_items,
            closings: &closings,
        }))
    }

    fn notify(&self, meeting_uuid: MeetingId, slice: ChangeSlice) {
        if let Some(feed) = &self.feed {
            feed.publish(ChangeNotification::new(meeting_uuid, slice));
        }
    }
}

fn ensure_facilitator(
    actor: &Actor,
    meeting: &Meeting,
    action: &'static str,
) -> Result<(), MeetingServiceError> {
    if actor.can_facilitate(meeting.facilitator_uuid) {
        return Ok(());
    }
    warn!(
        "event=meeting_authorize module=service status=denied meeting_uuid={} error_code={}",
        meeting.uuid, CODE_UNAUTHORIZED
    );
    Err(MeetingServiceError::Unauthorized { action })
}

fn ensure_not_completed(meeting: &Meeting) -> Result<(), MeetingServiceError> {
    if meeting.status == MeetingStatus::Completed {
        return Err(MeetingServiceError::InvalidTransition {
            meeting_uuid: meeting.uuid,
            reason: "meeting is already completed",
        });
    }
    Ok(())
}

/// Phase of a running meeting; anything else is an invalid transition.
fn active_phase(meeting: &Meeting) -> Result<MeetingPhase, MeetingServiceError> {
    match (meeting.status, meeting.current_phase) {
        (MeetingStatus::Active, Some(phase)) => Ok(phase),
        (MeetingStatus::Scheduled, _) => Err(MeetingServiceError::InvalidTransition {
            meeting_uuid: meeting.uuid,
            reason: "meeting has not been started",
        }),
        (MeetingStatus::Completed, _) => Err(MeetingServiceError::InvalidTransition {
            meeting_uuid: meeting.uuid,
            reason: "meeting is already completed",
        }),
        (MeetingStatus::Active, None) => Err(MeetingServiceError::InvalidTransition {
            meeting_uuid: meeting.uuid,
            reason: "active meeting has no current phase",
        }),
    }
}
