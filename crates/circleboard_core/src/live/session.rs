//! One participant's session on a live meeting.
//!
//! # Responsibility
//! - Own the participant's [`LiveMeetingState`] and its feed subscription.
//! - Join an active meeting automatically, at most once per session.
//! - Refuse a second dispatch of an action whose round-trip is still running.

use crate::live::feed::{ChangeFeed, ChangeNotification, ChangeSlice, MeetingSubscription};
use crate::live::state::{LiveMeetingState, LiveStateError};
use crate::model::meeting::{
    AgendaComment, AgendaItem, AgendaItemId, MeetingId, MeetingStatus, RoundEntry, RoundPhase,
};
use crate::model::person::Actor;
use crate::repo::meeting_repo::MeetingRepository;
use crate::service::meeting_service::{MeetingService, MeetingServiceError, PhaseAdvance};
use crate::service::CODE_TRANSIENT;
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Mutation a participant can have in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingAction {
    Join,
    AdvancePhase,
    SetAgendaPosition,
    ProcessItem(AgendaItemId),
    SaveOutcome(AgendaItemId),
    Comment(AgendaItemId),
    SaveRound(RoundPhase),
}

#[derive(Debug)]
pub enum SessionError {
    /// Same action already dispatched and not yet finished.
    ActionPending(PendingAction),
    Service(MeetingServiceError),
    State(LiveStateError),
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ActionPending(_) => CODE_TRANSIENT,
            Self::Service(err) => err.code(),
            Self::State(err) => err.code(),
        }
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ActionPending(action) => write!(f, "action already in flight: {action:?}"),
            Self::Service(err) => write!(f, "{err}"),
            Self::State(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ActionPending(_) => None,
            Self::Service(err) => Some(err),
            Self::State(err) => Some(err),
        }
    }
}

impl From<MeetingServiceError> for SessionError {
    fn from(value: MeetingServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<LiveStateError> for SessionError {
    fn from(value: LiveStateError) -> Self {
        Self::State(value)
    }
}

/// A participant's open view on one meeting.
#[derive(Debug)]
pub struct LiveMeetingSession {
    actor: Actor,
    state: LiveMeetingState,
    subscription: MeetingSubscription,
    auto_join_attempted: bool,
    /// Set when a refetch failed; the next `sync` starts with a full resync.
    needs_full_resync: bool,
    pending: HashSet<PendingAction>,
}

impl LiveMeetingSession {
    /// Subscribes first, then loads the snapshot, so no change between the
    /// two is lost.
    pub fn open<R: MeetingRepository>(
        service: &MeetingService<R>,
        feed: &ChangeFeed,
        actor: Actor,
        meeting_id: MeetingId,
    ) -> Result<Self, SessionError> {
        let subscription = feed.subscribe(meeting_id);
        let state = LiveMeetingState::load(service.repo(), meeting_id)?;
        info!(
            "event=live_session_open module=live status=ok meeting_uuid={} status={}",
            meeting_id,
            state.status().as_str()
        );
        Ok(Self {
            actor,
            state,
            subscription,
            auto_join_attempted: false,
            needs_full_resync: false,
            pending: HashSet::new(),
        })
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn state(&self) -> &LiveMeetingState {
        &self.state
    }

    pub fn auto_join_attempted(&self) -> bool {
        self.auto_join_attempted
    }

    /// Applies every pending notification. Returns how many were applied.
    ///
    /// Notifications are drained before they are applied. When a refetch
    /// fails, the rest are dropped and the next call resyncs every slice.
    pub fn sync<R: MeetingRepository>(
        &mut self,
        service: &MeetingService<R>,
    ) -> Result<usize, SessionError> {
        let mut pending = self.subscription.drain();
        if self.needs_full_resync {
            pending = vec![ChangeNotification::new(
                self.state.meeting_id(),
                ChangeSlice::Full,
            )];
        }

        let mut applied = 0;
        for notification in &pending {
            if self.apply_tracked(service, notification)? {
                applied += 1;
            }
        }
        Ok(applied)
    }

    pub fn needs_full_resync(&self) -> bool {
        self.needs_full_resync
    }

    /// Joins the meeting when it is active and the actor is not yet listed.
    ///
    /// Issues at most one join call per session. The attempt counts even
    /// when the call fails; there is no automatic retry.
    pub fn auto_join<R: MeetingRepository>(
        &mut self,
        service: &MeetingService<R>,
    ) -> Result<bool, SessionError> {
        if self.auto_join_attempted
            || self.state.status() != MeetingStatus::Active
            || self.state.is_attendee(self.actor.person_uuid)
        {
            return Ok(false);
        }
        self.auto_join_attempted = true;

        let meeting_id = self.state.meeting_id();
        let actor = self.actor;
        match self.run(PendingAction::Join, |_| {
            service.join_meeting(&actor, meeting_id)
        }) {
            Ok(_) => {
                self.refresh(service, ChangeSlice::Attendees)?;
                Ok(true)
            }
            Err(err) => {
                warn!(
                    "event=live_auto_join module=live status=error meeting_uuid={} error_code={}",
                    meeting_id,
                    err.code()
                );
                Err(err)
            }
        }
    }

    pub fn is_pending(&self, action: PendingAction) -> bool {
        self.pending.contains(&action)
    }

    /// Marks `action` as dispatched. Fails if it already is.
    pub fn begin(&mut self, action: PendingAction) -> Result<(), SessionError> {
        if !self.pending.insert(action) {
            return Err(SessionError::ActionPending(action));
        }
        Ok(())
    }

    /// Clears `action`, successful or not, so its control is re-enabled.
    pub fn finish(&mut self, action: PendingAction) {
        self.pending.remove(&action);
    }

    pub fn advance_phase<R: MeetingRepository>(
        &mut self,
        service: &MeetingService<R>,
    ) -> Result<PhaseAdvance, SessionError> {
        let meeting_id = self.state.meeting_id();
        let advance = self.run(PendingAction::AdvancePhase, |actor| {
            service.advance_phase(actor, meeting_id)
        })?;
        self.refresh(service, ChangeSlice::Meeting)?;
        Ok(advance)
    }

    pub fn set_agenda_position<R: MeetingRepository>(
        &mut self,
        service: &MeetingService<R>,
        position: u32,
    ) -> Result<(), SessionError> {
        let meeting_id = self.state.meeting_id();
        self.run(PendingAction::SetAgendaPosition, |actor| {
            service.set_agenda_position(actor, meeting_id, position)
        })?;
        self.refresh(service, ChangeSlice::Meeting)
    }

    pub fn process_agenda_item<R: MeetingRepository>(
        &mut self,
        service: &MeetingService<R>,
        item_uuid: AgendaItemId,
        outcome: Option<String>,
    ) -> Result<AgendaItem, SessionError> {
        let item = self.run(PendingAction::ProcessItem(item_uuid), |actor| {
            service.process_agenda_item(actor, item_uuid, outcome)
        })?;
        self.refresh(service, ChangeSlice::AgendaItems)?;
        Ok(item)
    }

    pub fn save_outcome<R: MeetingRepository>(
        &mut self,
        service: &MeetingService<R>,
        item_uuid: AgendaItemId,
        outcome: Option<String>,
    ) -> Result<(), SessionError> {
        self.run(PendingAction::SaveOutcome(item_uuid), |actor| {
            service.update_agenda_item_outcome(actor, item_uuid, outcome)
        })?;
        self.refresh(service, ChangeSlice::AgendaItems)
    }

    pub fn add_comment<R: MeetingRepository>(
        &mut self,
        service: &MeetingService<R>,
        item_uuid: AgendaItemId,
        content: &str,
    ) -> Result<AgendaComment, SessionError> {
        let comment = self.run(PendingAction::Comment(item_uuid), |actor| {
            service.add_agenda_comment(actor, item_uuid, content)
        })?;
        self.refresh(service, ChangeSlice::Comments)?;
        Ok(comment)
    }

    pub fn save_round_entry<R: MeetingRepository>(
        &mut self,
        service: &MeetingService<R>,
        phase: RoundPhase,
        content: &str,
    ) -> Result<RoundEntry, SessionError> {
        let meeting_id = self.state.meeting_id();
        let entry = self.run(PendingAction::SaveRound(phase), |actor| {
            service.save_round_entry(actor, meeting_id, phase, content)
        })?;
        self.refresh(service, ChangeSlice::RoundEntries)?;
        Ok(entry)
    }

    fn run<T>(
        &mut self,
        action: PendingAction,
        call: impl FnOnce(&Actor) -> Result<T, MeetingServiceError>,
    ) -> Result<T, SessionError> {
        self.begin(action)?;
        let result = call(&self.actor);
        self.finish(action);
        result.map_err(Into::into)
    }

    // The own write is visible right away; the feed echo merges as a no-op.
    fn refresh<R: MeetingRepository>(
        &mut self,
        service: &MeetingService<R>,
        slice: ChangeSlice,
    ) -> Result<(), SessionError> {
        let notification = ChangeNotification::new(self.state.meeting_id(), slice);
        self.apply_tracked(service, &notification)?;
        Ok(())
    }

    fn apply_tracked<R: MeetingRepository>(
        &mut self,
        service: &MeetingService<R>,
        notification: &ChangeNotification,
    ) -> Result<bool, SessionError> {
        match self.state.apply(service.repo(), notification) {
            Ok(applied) => {
                if notification.slice == ChangeSlice::Full {
                    self.needs_full_resync = false;
                }
                Ok(applied)
            }
            Err(err) => {
                self.needs_full_resync = true;
                warn!(
                    "event=live_session_sync module=live status=error meeting_uuid={} error_code={}",
                    self.state.meeting_id(),
                    err.code()
                );
                Err(err.into())
            }
        }
    }
}
