//! In-process change feed for live meeting views.
//!
//! # Invariants
//! - Subscribers only ever see notifications for their own meeting.
//! - A subscriber that fell behind receives one `ChangeSlice::Full`
//!   notification in place of everything it missed.

use crate::model::meeting::MeetingId;
use log::warn;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

/// Part of a meeting that changed and must be refetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSlice {
    Meeting,
    Attendees,
    AgendaItems,
    Comments,
    RoundEntries,
    /// Everything; emitted after a subscriber lagged.
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub meeting_id: MeetingId,
    pub slice: ChangeSlice,
}

impl ChangeNotification {
    pub fn new(meeting_id: MeetingId, slice: ChangeSlice) -> Self {
        Self { meeting_id, slice }
    }
}

/// Broadcast hub shared by services (publishers) and sessions (subscribers).
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeNotification>,
}

impl ChangeFeed {
    pub const DEFAULT_CAPACITY: usize = 64;

    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns how many subscribers were reached. Zero subscribers is fine.
    pub fn publish(&self, notification: ChangeNotification) -> usize {
        self.sender.send(notification).unwrap_or(0)
    }

    pub fn subscribe(&self, meeting_id: MeetingId) -> MeetingSubscription {
        MeetingSubscription {
            meeting_id,
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// Receiving end filtered to one meeting.
#[derive(Debug)]
pub struct MeetingSubscription {
    meeting_id: MeetingId,
    receiver: broadcast::Receiver<ChangeNotification>,
}

impl MeetingSubscription {
    pub fn meeting_id(&self) -> MeetingId {
        self.meeting_id
    }

    /// Next pending notification for this meeting, without blocking.
    pub fn try_next(&mut self) -> Option<ChangeNotification> {
        loop {
            match self.receiver.try_recv() {
                Ok(notification) if notification.meeting_id == self.meeting_id => {
                    return Some(notification);
                }
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(
                        "event=live_feed_lagged module=live status=resync meeting_uuid={} skipped={}",
                        self.meeting_id, skipped
                    );
                    return Some(ChangeNotification::new(self.meeting_id, ChangeSlice::Full));
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drains everything pending. Collapses to a single `Full` when a resync
    /// is among them.
    pub fn drain(&mut self) -> Vec<ChangeNotification> {
        let mut pending = Vec::new();
        while let Some(notification) = self.try_next() {
            if notification.slice == ChangeSlice::Full {
                pending.clear();
                pending.push(notification);
                continue;
            }
            if pending
                .first()
                .is_some_and(|first| first.slice == ChangeSlice::Full)
            {
                continue;
            }
            if !pending.contains(&notification) {
                pending.push(notification);
            }
        }
        pending
    }
}
