//! Vorhaben (initiative) use-case service.

use crate::model::person::Actor;
use crate::model::vorhaben::{Subtask, SubtaskId, Vorhaben, VorhabenId, VorhabenStatus};
use crate::model::{normalize_optional, normalize_required, ValidationError};
use crate::repo::vorhaben_repo::VorhabenRepository;
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
pub enum VorhabenServiceError {
    Validation(ValidationError),
    VorhabenNotFound(VorhabenId),
    SubtaskNotFound(SubtaskId),
    /// Status changes are reserved for the creator and admins.
    Unauthorized(VorhabenId),
    /// Finished initiatives no longer take volunteers.
    AlreadyDone(VorhabenId),
    Repo(RepoError),
}

impl VorhabenServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => CODE_VALIDATION,
            Self::VorhabenNotFound(_) | Self::SubtaskNotFound(_) => CODE_NOT_FOUND,
            Self::Unauthorized(_) => CODE_UNAUTHORIZED,
            Self::AlreadyDone(_) => CODE_INVALID_TRANSITION,
            Self::Repo(err) => repo_error_code(err),
        }
    }
}

impl Display for VorhabenServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::VorhabenNotFound(id) => write!(f, "vorhaben not found: {id}"),
            Self::SubtaskNotFound(id) => write!(f, "subtask not found: {id}"),
            Self::Unauthorized(id) => write!(f, "not allowed to change vorhaben {id}"),
            Self::AlreadyDone(id) => write!(f, "vorhaben already done: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for VorhabenServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for VorhabenServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound {
                entity: "vorhaben",
                id,
            } => Self::VorhabenNotFound(id),
            RepoError::NotFound {
                entity: "subtask",
                id,
            } => Self::SubtaskNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for VorhabenServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

pub struct VorhabenService<R: VorhabenRepository> {
    repo: R,
}

impl<R: VorhabenRepository> VorhabenService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_vorhaben(
        &self,
        actor: &Actor,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<Vorhaben, VorhabenServiceError> {
        let vorhaben = Vorhaben {
            uuid: Uuid::new_v4(),
            title: normalize_required(title, "vorhaben title")?,
            description: normalize_optional(description),
            status: VorhabenStatus::Idea,
            created_by: Some(actor.person_uuid),
            subtasks: Vec::new(),
            volunteers: Vec::new(),
            created_at: 0,
            updated_at: 0,
        };
        let id = self.repo.create_vorhaben(&vorhaben)?;
        info!(
            "event=vorhaben_create module=service status=ok vorhaben_uuid={}",
            id
        );
        self.get_vorhaben(id)
    }

    pub fn get_vorhaben(&self, id: VorhabenId) -> Result<Vorhaben, VorhabenServiceError> {
        self.repo
            .get_vorhaben(id)?
            .ok_or(VorhabenServiceError::VorhabenNotFound(id))
    }

    pub fn list_vorhaben(
        &self,
        status: Option<VorhabenStatus>,
    ) -> Result<Vec<Vorhaben>, VorhabenServiceError> {
        self.repo.list_vorhaben(status).map_err(Into::into)
    }

    pub fn set_status(
        &self,
        actor: &Actor,
        id: VorhabenId,
        status: VorhabenStatus,
    ) -> Result<(), VorhabenServiceError> {
        let vorhaben = self.get_vorhaben(id)?;
        if !actor.is_admin && vorhaben.created_by != Some(actor.person_uuid) {
            return Err(VorhabenServiceError::Unauthorized(id));
        }
        self.repo.set_vorhaben_status(id, status)?;
        info!(
            "event=vorhaben_status module=service status=ok vorhaben_uuid={} new_status={}",
            id,
            status.as_str()
        );
        Ok(())
    }

    pub fn add_subtask(
        &self,
        id: VorhabenId,
        title: impl Into<String>,
    ) -> Result<Subtask, VorhabenServiceError> {
        let title = normalize_required(title, "subtask title")?;
        self.repo.add_subtask(id, &title).map_err(Into::into)
    }

    pub fn set_subtask_done(
        &self,
        subtask_id: SubtaskId,
        is_done: bool,
    ) -> Result<(), VorhabenServiceError> {
        self.repo
            .set_subtask_done(subtask_id, is_done)
            .map_err(Into::into)
    }

    /// Signs the caller up. Returns `false` if already signed up.
    pub fn volunteer(&self, actor: &Actor, id: VorhabenId) -> Result<bool, VorhabenServiceError> {
        let vorhaben = self.get_vorhaben(id)?;
        if vorhaben.status == VorhabenStatus::Done {
            return Err(VorhabenServiceError::AlreadyDone(id));
        }
        self.repo
            .add_volunteer(id, actor.person_uuid)
            .map_err(Into::into)
    }

    /// Withdraws the caller. Returns `false` if not signed up.
    pub fn withdraw(&self, actor: &Actor, id: VorhabenId) -> Result<bool, VorhabenServiceError> {
        self.get_vorhaben(id)?;
        self.repo
            .remove_volunteer(id, actor.person_uuid)
            .map_err(Into::into)
    }
}
