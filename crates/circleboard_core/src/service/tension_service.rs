//! Tension use-case service.
//!
//! Tensions start `open`, become `scheduled` once put on an agenda and
//! `resolved` when that agenda item is processed. Manual resolution covers
//! tensions settled outside a meeting.

use crate::model::circle::CircleId;
use crate::model::person::Actor;
use crate::model::tension::{Tension, TensionId, TensionStatus};
use crate::model::{normalize_optional, normalize_required, ValidationError};
use crate::repo::tension_repo::TensionRepository;
use crate::repo::RepoError;
use crate::service::{
    repo_error_code, CODE_INVALID_TRANSITION, CODE_NOT_FOUND, CODE_UNAUTHORIZED,
    CODE_VALIDATION,
};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

#[derive(Debug)]
pub enum TensionServiceError {
    Validation(ValidationError),
    TensionNotFound(TensionId),
    /// Only the raiser or an admin may resolve by hand.
    Unauthorized(TensionId),
    AlreadyResolved(TensionId),
    Repo(RepoError),
}

impl TensionServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => CODE_VALIDATION,
            Self::TensionNotFound(_) => CODE_NOT_FOUND,
            Self::Unauthorized(_) => CODE_UNAUTHORIZED,
            Self::AlreadyResolved(_) => CODE_INVALID_TRANSITION,
            Self::Repo(err) => repo_error_code(err),
        }
    }
}

impl Display for TensionServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::TensionNotFound(id) => write!(f, "tension not found: {id}"),
            Self::Unauthorized(id) => write!(f, "not allowed to resolve tension {id}"),
            Self::AlreadyResolved(id) => write!(f, "tension already resolved: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TensionServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TensionServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound {
                entity: "tension",
                id,
            } => Self::TensionNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for TensionServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

pub struct TensionService<R: TensionRepository> {
    repo: R,
}

impl<R: TensionRepository> TensionService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn raise_tension(
        &self,
        actor: &Actor,
        circle_uuid: CircleId,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<Tension, TensionServiceError> {
        let tension = Tension {
            uuid: Uuid::new_v4(),
            circle_uuid,
            raised_by: Some(actor.person_uuid),
            title: normalize_required(title, "tension title")?,
            description: normalize_optional(description),
            status: TensionStatus::Open,
            created_at: 0,
            updated_at: 0,
        };
        let stored = self.repo.create_tension(&tension)?;
        info!(
            "event=tension_raise module=service status=ok tension_uuid={} circle_uuid={}",
            stored.uuid, circle_uuid
        );
        Ok(stored)
    }

    pub fn get_tension(&self, id: TensionId) -> Result<Tension, TensionServiceError> {
        self.repo
            .get_tension(id)?
            .ok_or(TensionServiceError::TensionNotFound(id))
    }

    pub fn list_tensions(
        &self,
        circle_uuid: CircleId,
        status: Option<TensionStatus>,
    ) -> Result<Vec<Tension>, TensionServiceError> {
        self.repo
            .list_tensions_for_circle(circle_uuid, status)
            .map_err(Into::into)
    }

    /// Resolves a tension outside a meeting.
    pub fn resolve_tension(&self, actor: &Actor, id: TensionId) -> Result<(), TensionServiceError> {
        let tension = self.get_tension(id)?;
        if !actor.is_admin && tension.raised_by != Some(actor.person_uuid) {
            return Err(TensionServiceError::Unauthorized(id));
        }
        if tension.status == TensionStatus::Resolved {
            return Err(TensionServiceError::AlreadyResolved(id));
        }
        self.repo.set_tension_status(id, TensionStatus::Resolved)?;
        info!(
            "event=tension_resolve module=service status=ok tension_uuid={}",
            id
        );
        Ok(())
    }
}
