//! Circle hierarchy use-case service.
//!
//! # Responsibility
//! - Create, rename and move circles; create roles; manage role holders.
//! - Assemble the nested circle tree consumed by the layout engine.
//!
//! # Invariants
//! - A parent circle must exist when provided.
//! - Moves must not create parent-child cycles.

use crate::hierarchy::circle_tree::{build_circle_tree, CircleNode, CircleRecord, RoleRecord};
use crate::model::circle::{Circle, CircleId, Role, RoleAssignment, RoleAssignmentId, RoleId};
use crate::model::person::PersonId;
use crate::model::{normalize_optional, normalize_required, ValidationError};
use crate::repo::circle_repo::CircleRepository;
use crate::repo::RepoError;
use crate::service::{
    repo_error_code, CODE_INVALID_TRANSITION, CODE_NOT_FOUND, CODE_VALIDATION,
};
use log::info;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from circle service operations.
#[derive(Debug)]
pub enum CircleServiceError {
    Validation(ValidationError),
    CircleNotFound(CircleId),
    ParentNotFound(CircleId),
    RoleNotFound(RoleId),
    /// Move would place a circle beneath itself.
    CycleDetected {
        circle_uuid: CircleId,
        parent_uuid: CircleId,
    },
    Repo(RepoError),
}

impl CircleServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => CODE_VALIDATION,
            Self::CircleNotFound(_) | Self::ParentNotFound(_) | Self::RoleNotFound(_) => {
                CODE_NOT_FOUND
            }
            Self::CycleDetected { .. } => CODE_INVALID_TRANSITION,
            Self::Repo(err) => repo_error_code(err),
        }
    }
}

impl Display for CircleServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::CircleNotFound(id) => write!(f, "circle not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent circle not found: {id}"),
            Self::RoleNotFound(id) => write!(f, "role not found: {id}"),
            Self::CycleDetected {
                circle_uuid,
                parent_uuid,
            } => write!(
                f,
                "move would create cycle: circle {circle_uuid} under parent {parent_uuid}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CircleServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CircleServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for CircleServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Optional circle attributes supplied at creation.
#[derive(Debug, Clone, Default)]
pub struct CircleDetails {
    pub purpose: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Circle hierarchy service facade.
pub struct CircleService<R: CircleRepository> {
    repo: R,
}

impl<R: CircleRepository> CircleService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a circle under an optional parent.
    pub fn create_circle(
        &self,
        parent_uuid: Option<CircleId>,
        name: impl Into<String>,
        details: CircleDetails,
    ) -> Result<Circle, CircleServiceError> {
        let name = normalize_required(name, "circle name")?;
        if let Some(parent_uuid) = parent_uuid {
            self.repo
                .get_circle(parent_uuid)?
                .ok_or(CircleServiceError::ParentNotFound(parent_uuid))?;
        }

        let mut circle = Circle::new(name, parent_uuid);
        circle.purpose = normalize_optional(details.purpose);
        circle.color = normalize_optional(details.color);
        circle.icon = normalize_optional(details.icon);
        self.repo.create_circle(&circle)?;

        info!(
            "event=circle_create module=service status=ok circle_uuid={} has_parent={}",
            circle.uuid,
            parent_uuid.is_some()
        );
        Ok(circle)
    }

    pub fn get_circle(&self, circle_uuid: CircleId) -> Result<Circle, CircleServiceError> {
        self.repo
            .get_circle(circle_uuid)?
            .ok_or(CircleServiceError::CircleNotFound(circle_uuid))
    }

    pub fn rename_circle(
        &self,
        circle_uuid: CircleId,
        name: impl Into<String>,
    ) -> Result<Circle, CircleServiceError> {
        let name = normalize_required(name, "circle name")?;
        let mut circle = self.get_circle(circle_uuid)?;
        circle.name = name;
        self.repo.update_circle(&circle)?;
        Ok(circle)
    }

    /// Re-parents a circle. `None` detaches it to the top level.
    pub fn move_circle(
        &self,
        circle_uuid: CircleId,
        new_parent_uuid: Option<CircleId>,
    ) -> Result<Circle, CircleServiceError> {
        let mut circle = self.get_circle(circle_uuid)?;

        if let Some(parent_uuid) = new_parent_uuid {
            if parent_uuid == circle_uuid {
                return Err(CircleServiceError::CycleDetected {
                    circle_uuid,
                    parent_uuid,
                });
            }
            self.repo
                .get_circle(parent_uuid)?
                .ok_or(CircleServiceError::ParentNotFound(parent_uuid))?;
            if self.would_create_cycle(circle_uuid, parent_uuid)? {
                return Err(CircleServiceError::CycleDetected {
                    circle_uuid,
                    parent_uuid,
                });
            }
        }

        circle.parent_circle_uuid = new_parent_uuid;
        self.repo.update_circle(&circle)?;
        info!(
            "event=circle_move module=service status=ok circle_uuid={} has_parent={}",
            circle_uuid,
            new_parent_uuid.is_some()
        );
        Ok(circle)
    }

    pub fn create_role(
        &self,
        circle_uuid: CircleId,
        name: impl Into<String>,
        purpose: Option<String>,
    ) -> Result<Role, CircleServiceError> {
        let name = normalize_required(name, "role name")?;
        self.get_circle(circle_uuid)?;

        let mut role = Role::new(circle_uuid, name);
        role.purpose = normalize_optional(purpose);
        self.repo.create_role(&role)?;
        Ok(role)
    }

    pub fn list_roles(&self, circle_uuid: CircleId) -> Result<Vec<Role>, CircleServiceError> {
        self.get_circle(circle_uuid)?;
        self.repo
            .list_roles_for_circle(circle_uuid)
            .map_err(Into::into)
    }

    pub fn assign_role(
        &self,
        role_uuid: RoleId,
        person_uuid: PersonId,
    ) -> Result<RoleAssignment, CircleServiceError> {
        self.repo
            .get_role(role_uuid)?
            .ok_or(CircleServiceError::RoleNotFound(role_uuid))?;
        let assignment = self.repo.assign_role(role_uuid, person_uuid)?;
        info!(
            "event=role_assign module=service status=ok role_uuid={} assignment_uuid={}",
            role_uuid, assignment.uuid
        );
        Ok(assignment)
    }

    pub fn end_role_assignment(
        &self,
        assignment_uuid: RoleAssignmentId,
    ) -> Result<(), CircleServiceError> {
        self.repo
            .end_role_assignment(assignment_uuid)
            .map_err(Into::into)
    }

    /// People currently holding the role.
    pub fn role_holders(&self, role_uuid: RoleId) -> Result<Vec<PersonId>, CircleServiceError> {
        self.repo
            .get_role(role_uuid)?
            .ok_or(CircleServiceError::RoleNotFound(role_uuid))?;
        Ok(self
            .repo
            .list_current_assignments(role_uuid)?
            .into_iter()
            .map(|assignment| assignment.person_uuid)
            .collect())
    }

    /// Loads all circles and roles and nests them under the root circle.
    pub fn load_circle_tree(&self) -> Result<Option<CircleNode>, CircleServiceError> {
        let circles: Vec<CircleRecord> = self
            .repo
            .list_circles()?
            .iter()
            .map(CircleRecord::from)
            .collect();
        let roles: Vec<RoleRecord> = self.repo.list_roles()?.iter().map(RoleRecord::from).collect();
        Ok(build_circle_tree(&circles, &roles))
    }

    fn would_create_cycle(
        &self,
        circle_uuid: CircleId,
        candidate_parent_uuid: CircleId,
    ) -> Result<bool, CircleServiceError> {
        let mut visited = HashSet::new();
        let mut cursor = Some(candidate_parent_uuid);
        while let Some(current) = cursor {
            if current == circle_uuid || !visited.insert(current) {
                return Ok(true);
            }
            let circle = self
                .repo
                .get_circle(current)?
                .ok_or(CircleServiceError::ParentNotFound(current))?;
            cursor = circle.parent_circle_uuid;
        }
        Ok(false)
    }
}
