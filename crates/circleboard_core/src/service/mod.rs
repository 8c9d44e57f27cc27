//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce authorization and lifecycle rules above the storage layer.
//!
//! Every service error exposes a machine-readable `code()`:
//! `unauthorized`, `validation`, `not_found`, `invalid_transition` or
//! `transient`.

use crate::repo::RepoError;

pub mod circle_service;
pub mod meeting_service;
pub mod protocol;
pub mod tension_service;
pub mod vorhaben_service;

pub const CODE_UNAUTHORIZED: &str = "unauthorized";
pub const CODE_VALIDATION: &str = "validation";
pub const CODE_NOT_FOUND: &str = "not_found";
pub const CODE_INVALID_TRANSITION: &str = "invalid_transition";
pub const CODE_TRANSIENT: &str = "transient";

/// Maps a repository failure onto the shared error-code vocabulary.
pub(crate) fn repo_error_code(err: &RepoError) -> &'static str {
    match err {
        RepoError::Validation(_) => CODE_VALIDATION,
        RepoError::NotFound { .. } => CODE_NOT_FOUND,
        RepoError::Db(_)
        | RepoError::UninitializedConnection { .. }
        | RepoError::MissingRequiredTable(_)
        | RepoError::InvalidData(_) => CODE_TRANSIENT,
    }
}
