//! Per-participant view of one live meeting.
//!
//! # Responsibility
//! - Build the view from a full snapshot.
//! - Refetch and merge only the slice a [`ChangeNotification`] names.
//!
//! # Invariants
//! - Notifications for other meetings leave the view untouched.
//! - Merging is by id and idempotent, so duplicates and reordering of
//!   notifications converge on the same view.

use crate::live::feed::{ChangeNotification, ChangeSlice};
use crate::model::meeting::{
    AgendaItem, Attendee, Meeting, MeetingId, MeetingPhase, MeetingStatus, RoundEntry,
    RoundPhase,
};
use crate::model::person::PersonId;
use crate::repo::meeting_repo::MeetingRepository;
use crate::repo::{RepoError, RepoResult};
use crate::service::{repo_error_code, CODE_NOT_FOUND};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::Hash;

/// Read access the live view needs; every meeting repository provides it.
pub trait SnapshotSource {
    fn fetch_meeting(&self, id: MeetingId) -> RepoResult<Option<Meeting>>;
    fn fetch_attendees(&self, id: MeetingId) -> RepoResult<Vec<Attendee>>;
    fn fetch_agenda_items(&self, id: MeetingId) -> RepoResult<Vec<AgendaItem>>;
    fn fetch_round_entries(&self, id: MeetingId, phase: RoundPhase) -> RepoResult<Vec<RoundEntry>>;
}

impl<T: MeetingRepository + ?Sized> SnapshotSource for T {
    fn fetch_meeting(&self, id: MeetingId) -> RepoResult<Option<Meeting>> {
        self.get_meeting(id)
    }

    fn fetch_attendees(&self, id: MeetingId) -> RepoResult<Vec<Attendee>> {
        self.list_attendees(id)
    }

    fn fetch_agenda_items(&self, id: MeetingId) -> RepoResult<Vec<AgendaItem>> {
        self.list_agenda_items(id)
    }

    fn fetch_round_entries(&self, id: MeetingId, phase: RoundPhase) -> RepoResult<Vec<RoundEntry>> {
        self.list_round_entries(id, phase)
    }
}

#[derive(Debug)]
pub enum LiveStateError {
    MeetingNotFound(MeetingId),
    Repo(RepoError),
}

impl LiveStateError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MeetingNotFound(_) => CODE_NOT_FOUND,
            Self::Repo(err) => repo_error_code(err),
        }
    }
}

impl Display for LiveStateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MeetingNotFound(id) => write!(f, "meeting not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LiveStateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::MeetingNotFound(_) => None,
        }
    }
}

impl From<RepoError> for LiveStateError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Full read of one meeting, as fetched at view creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingSnapshot {
    pub meeting: Meeting,
    pub attendees: Vec<Attendee>,
    pub agenda_items: Vec<AgendaItem>,
    pub check_ins: Vec<RoundEntry>,
    pub closings: Vec<RoundEntry>,
}

impl MeetingSnapshot {
    pub fn fetch(source: &impl SnapshotSource, id: MeetingId) -> Result<Self, LiveStateError> {
        let meeting = source
            .fetch_meeting(id)?
            .ok_or(LiveStateError::MeetingNotFound(id))?;
        Ok(Self {
            meeting,
            attendees: source.fetch_attendees(id)?,
            agenda_items: source.fetch_agenda_items(id)?,
            check_ins: source.fetch_round_entries(id, RoundPhase::CheckIn)?,
            closings: source.fetch_round_entries(id, RoundPhase::Closing)?,
        })
    }
}

/// Live view of one meeting, kept current by applying notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveMeetingState {
    snapshot: MeetingSnapshot,
}

impl LiveMeetingState {
    pub fn load(source: &impl SnapshotSource, id: MeetingId) -> Result<Self, LiveStateError> {
        Ok(Self::from_snapshot(MeetingSnapshot::fetch(source, id)?))
    }

    pub fn from_snapshot(snapshot: MeetingSnapshot) -> Self {
        let mut state = Self { snapshot };
        sort_agenda(&mut state.snapshot.agenda_items);
        state
    }

    pub fn meeting_id(&self) -> MeetingId {
        self.snapshot.meeting.uuid
    }

    pub fn meeting(&self) -> &Meeting {
        &self.snapshot.meeting
    }

    pub fn status(&self) -> MeetingStatus {
        self.snapshot.meeting.status
    }

    pub fn current_phase(&self) -> Option<MeetingPhase> {
        self.snapshot.meeting.current_phase
    }

    pub fn current_agenda_position(&self) -> Option<u32> {
        self.snapshot.meeting.current_agenda_position
    }

    pub fn protocol(&self) -> Option<&str> {
        self.snapshot.meeting.protocol.as_deref()
    }

    pub fn attendees(&self) -> &[Attendee] {
        &self.snapshot.attendees
    }

    pub fn agenda_items(&self) -> &[AgendaItem] {
        &self.snapshot.agenda_items
    }

    pub fn round_entries(&self, phase: RoundPhase) -> &[RoundEntry] {
        match phase {
            RoundPhase::CheckIn => &self.snapshot.check_ins,
            RoundPhase::Closing => &self.snapshot.closings,
        }
    }

    pub fn snapshot(&self) -> &MeetingSnapshot {
        &self.snapshot
    }

    pub fn is_attendee(&self, person_uuid: PersonId) -> bool {
        self.snapshot
            .attendees
            .iter()
            .any(|attendee| attendee.person_uuid == person_uuid)
    }

    /// Item the agenda pointer currently rests on.
    pub fn current_item(&self) -> Option<&AgendaItem> {
        let position = self.current_agenda_position()?;
        self.snapshot
            .agenda_items
            .iter()
            .find(|item| item.position == position)
    }

    pub fn unprocessed_count(&self) -> usize {
        self.snapshot
            .agenda_items
            .iter()
            .filter(|item| !item.is_processed)
            .count()
    }

    pub fn round_entry_of(&self, person_uuid: PersonId, phase: RoundPhase) -> Option<&RoundEntry> {
        self.round_entries(phase)
            .iter()
            .find(|entry| entry.person_uuid == person_uuid)
    }

    /// Refetches the slice named by `notification` and merges it in.
    ///
    /// Returns `false` when the notification belongs to another meeting.
    pub fn apply(
        &mut self,
        source: &impl SnapshotSource,
        notification: &ChangeNotification,
    ) -> Result<bool, LiveStateError> {
        let id = self.meeting_id();
        if notification.meeting_id != id {
            return Ok(false);
        }
        debug!(
            "event=live_state_apply module=live status=start meeting_uuid={} slice={:?}",
            id, notification.slice
        );

        match notification.slice {
            ChangeSlice::Meeting => self.refresh_meeting(source)?,
            ChangeSlice::Attendees => self.refresh_attendees(source)?,
            ChangeSlice::AgendaItems | ChangeSlice::Comments => self.refresh_agenda(source)?,
            ChangeSlice::RoundEntries => self.refresh_rounds(source)?,
            ChangeSlice::Full => {
                self.refresh_meeting(source)?;
                self.refresh_attendees(source)?;
                self.refresh_agenda(source)?;
                self.refresh_rounds(source)?;
            }
        }
        Ok(true)
    }

    fn refresh_meeting(&mut self, source: &impl SnapshotSource) -> Result<(), LiveStateError> {
        let id = self.meeting_id();
        self.snapshot.meeting = source
            .fetch_meeting(id)?
            .ok_or(LiveStateError::MeetingNotFound(id))?;
        Ok(())
    }

    fn refresh_attendees(&mut self, source: &impl SnapshotSource) -> Result<(), LiveStateError> {
        let fetched = source.fetch_attendees(self.meeting_id())?;
        merge_by_id(&mut self.snapshot.attendees, fetched, |attendee| {
            attendee.person_uuid
        });
        Ok(())
    }

    fn refresh_agenda(&mut self, source: &impl SnapshotSource) -> Result<(), LiveStateError> {
        let fetched = source.fetch_agenda_items(self.meeting_id())?;
        merge_by_id(&mut self.snapshot.agenda_items, fetched, |item| item.uuid);
        sort_agenda(&mut self.snapshot.agenda_items);
        Ok(())
    }

    fn refresh_rounds(&mut self, source: &impl SnapshotSource) -> Result<(), LiveStateError> {
        let id = self.meeting_id();
        let check_ins = source.fetch_round_entries(id, RoundPhase::CheckIn)?;
        let closings = source.fetch_round_entries(id, RoundPhase::Closing)?;
        merge_by_id(&mut self.snapshot.check_ins, check_ins, |entry| entry.uuid);
        merge_by_id(&mut self.snapshot.closings, closings, |entry| entry.uuid);
        Ok(())
    }
}

/// Replaces known rows in place and appends unseen ones in fetch order.
///
/// Rows absent from `fetched` are kept: the store never deletes them, so a
/// missing row only means a narrower read.
fn merge_by_id<T, K>(current: &mut Vec<T>, fetched: Vec<T>, key: impl Fn(&T) -> K)
where
    K: Eq + Hash,
{
    let index: HashMap<K, usize> = current
        .iter()
        .enumerate()
        .map(|(slot, row)| (key(row), slot))
        .collect();
    let mut appended = Vec::new();
    for row in fetched {
        match index.get(&key(&row)) {
            Some(&slot) => current[slot] = row,
            None => appended.push(row),
        }
    }
    current.extend(appended);
}

fn sort_agenda(items: &mut [AgendaItem]) {
    items.sort_by_key(|item| item.position);
}
