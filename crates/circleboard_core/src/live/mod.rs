//! Live meeting synchronization.
//!
//! # Responsibility
//! - Hold a per-participant view of one meeting (`state`).
//! - Fan change notifications out to every open view (`feed`).
//! - Drive one participant's session: auto-join, in-flight guard (`session`).
//! - Debounce free-text outcome edits before they are persisted (`draft`).

pub mod draft;
pub mod feed;
pub mod session;
pub mod state;
