//! Core domain logic for circleboard: circle hierarchy, circle-packing
//! layout and the live meeting protocol of a sociocratic organization.
//! This crate is the single source of truth for governance invariants.

pub mod config;
pub mod db;
pub mod hierarchy;
pub mod layout;
pub mod live;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_configured, open_db, open_db_in_memory, DbError, SchemaStatus};
pub use hierarchy::circle_tree::{build_circle_tree, CircleNode, CircleRecord, RoleRecord};
pub use layout::pack::{pack_circles, place_on_ring, LayoutItem, LayoutKind};
pub use layout::text::{estimate_text_width, truncate_to_width, wrap_text};
pub use live::draft::{DraftStatus, OutcomeDraft};
pub use live::feed::{ChangeFeed, ChangeNotification, ChangeSlice, MeetingSubscription};
pub use live::session::{LiveMeetingSession, PendingAction, SessionError};
pub use live::state::{LiveMeetingState, MeetingSnapshot, SnapshotSource};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::person::Actor;
pub use repo::{RepoError, RepoResult};
pub use service::circle_service::{CircleService, CircleServiceError};
pub use service::meeting_service::{
    MeetingService, MeetingServiceError, PhaseAdvance, PhasePolicy,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
