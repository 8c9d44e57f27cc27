//! Debounced autosave for agenda item outcome text.
//!
//! Status flow: `Saved -> Unsaved` on edit, `Unsaved -> Saving` once the
//! debounce window passes without further edits, then `Saved` or `Failed`.
//! A failed save keeps the text and waits for the next edit or flush.

use crate::model::meeting::AgendaItemId;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const DEFAULT_AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    Saved,
    Unsaved,
    Saving,
    Failed,
}

#[derive(Debug, Clone)]
pub struct OutcomeDraft {
    item_uuid: AgendaItemId,
    text: String,
    saved_text: String,
    /// Text handed to the in-flight save, if any.
    saving_text: Option<String>,
    status: DraftStatus,
    debounce: Duration,
    last_edit: Option<Instant>,
}

impl OutcomeDraft {
    pub fn new(item_uuid: AgendaItemId, saved: Option<&str>, debounce: Duration) -> Self {
        let saved = saved.unwrap_or_default().to_string();
        Self {
            item_uuid,
            text: saved.clone(),
            saved_text: saved,
            saving_text: None,
            status: DraftStatus::Saved,
            debounce,
            last_edit: None,
        }
    }

    pub fn item_uuid(&self) -> AgendaItemId {
        self.item_uuid
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> DraftStatus {
        self.status
    }

    /// Records a keystroke-level edit at `now`, restarting the idle window.
    pub fn edit(&mut self, text: impl Into<String>, now: Instant) {
        self.text = text.into();
        self.last_edit = Some(now);
        if self.status == DraftStatus::Saving {
            return;
        }
        self.status = if self.text == self.saved_text {
            DraftStatus::Saved
        } else {
            DraftStatus::Unsaved
        };
    }

    /// True once the text has been idle for the debounce window.
    pub fn is_due(&self, now: Instant) -> bool {
        self.status == DraftStatus::Unsaved
            && self
                .last_edit
                .is_some_and(|edited| now.saturating_duration_since(edited) >= self.debounce)
    }

    /// Moves to `Saving` and returns the text to persist, if due.
    pub fn take_due(&mut self, now: Instant) -> Option<String> {
        if !self.is_due(now) {
            return None;
        }
        Some(self.start_save())
    }

    /// Starts a save right away, ignoring the debounce window.
    pub fn flush(&mut self) -> Option<String> {
        match self.status {
            DraftStatus::Unsaved | DraftStatus::Failed => Some(self.start_save()),
            DraftStatus::Saved | DraftStatus::Saving => None,
        }
    }

    /// Records the result of the save started by `take_due`/`flush`.
    pub fn complete_save(&mut self, succeeded: bool) {
        let Some(sent) = self.saving_text.take() else {
            return;
        };
        if !succeeded {
            self.status = DraftStatus::Failed;
            return;
        }
        self.saved_text = sent;
        self.status = if self.text == self.saved_text {
            DraftStatus::Saved
        } else {
            DraftStatus::Unsaved
        };
    }

    /// Runs a due save through `save` and records its outcome.
    pub fn poll<E>(
        &mut self,
        now: Instant,
        save: impl FnOnce(&str) -> Result<(), E>,
    ) -> Option<Result<(), E>> {
        let text = self.take_due(now)?;
        let result = save(&text);
        self.complete_save(result.is_ok());
        Some(result)
    }

    /// Adopts a value written elsewhere unless local edits are pending.
    pub fn apply_remote(&mut self, outcome: Option<&str>) {
        let remote = outcome.unwrap_or_default();
        if self.status == DraftStatus::Saved {
            self.text = remote.to_string();
            self.saved_text = remote.to_string();
        }
    }

    fn start_save(&mut self) -> String {
        self.status = DraftStatus::Saving;
        self.saving_text = Some(self.text.clone());
        self.text.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{DraftStatus, OutcomeDraft};
    use std::time::{Duration, Instant};
    use uuid::Uuid;

    fn draft() -> OutcomeDraft {
        OutcomeDraft::new(Uuid::new_v4(), Some("alt"), Duration::from_millis(800))
    }

    #[test]
    fn save_waits_for_idle_window() {
        let start = Instant::now();
        let mut draft = draft();

        draft.edit("neu", start);
        assert_eq!(draft.status(), DraftStatus::Unsaved);
        assert!(draft.take_due(start + Duration::from_millis(799)).is_none());

        draft.edit("neuer", start + Duration::from_millis(500));
        assert!(draft.take_due(start + Duration::from_millis(1_000)).is_none());

        let sent = draft.take_due(start + Duration::from_millis(1_300));
        assert_eq!(sent.as_deref(), Some("neuer"));
        assert_eq!(draft.status(), DraftStatus::Saving);

        draft.complete_save(true);
        assert_eq!(draft.status(), DraftStatus::Saved);
    }

    #[test]
    fn failed_save_keeps_text_and_does_not_retry_by_itself() {
        let start = Instant::now();
        let mut draft = draft();
        draft.edit("Beschluss", start);

        let result = draft.poll(start + Duration::from_secs(1), |_| Err("offline"));
        assert_eq!(result, Some(Err("offline")));
        assert_eq!(draft.status(), DraftStatus::Failed);
        assert_eq!(draft.text(), "Beschluss");
        assert!(draft.take_due(start + Duration::from_secs(5)).is_none());

        assert_eq!(draft.flush().as_deref(), Some("Beschluss"));
    }

    #[test]
    fn edit_during_save_stays_unsaved_afterwards() {
        let start = Instant::now();
        let mut draft = draft();
        draft.edit("eins", start);
        assert!(draft.take_due(start + Duration::from_secs(1)).is_some());

        draft.edit("zwei", start + Duration::from_millis(1_100));
        assert_eq!(draft.status(), DraftStatus::Saving);
        draft.complete_save(true);
        assert_eq!(draft.status(), DraftStatus::Unsaved);
    }

    #[test]
    fn reverting_to_saved_text_clears_unsaved() {
        let start = Instant::now();
        let mut draft = draft();
        draft.edit("x", start);
        draft.edit("alt", start);
        assert_eq!(draft.status(), DraftStatus::Saved);
    }

    #[test]
    fn remote_value_is_adopted_only_without_local_edits() {
        let start = Instant::now();
        let mut draft = draft();
        draft.apply_remote(Some("remote"));
        assert_eq!(draft.text(), "remote");

        draft.edit("local", start);
        draft.apply_remote(Some("other"));
        assert_eq!(draft.text(), "local");
    }
}
