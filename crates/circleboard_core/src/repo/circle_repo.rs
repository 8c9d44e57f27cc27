//! Circle, role and role-assignment repository.
//!
//! # Responsibility
//! - Provide CRUD APIs over `circles`, `roles` and `role_assignments`.
//!
//! # Invariants
//! - Listing order is insertion order (`created_at ASC, rowid ASC`), which
//!   the tree builder preserves for sibling order.
//! - Ending an assignment only touches current (`ended_at IS NULL`) rows.

use crate::model::circle::{Circle, CircleId, Role, RoleAssignment, RoleAssignmentId, RoleId};
use crate::model::person::PersonId;
use crate::repo::{
    ensure_schema_ready, parse_optional_uuid, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const CIRCLE_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    purpose,
    color,
    icon,
    parent_circle_uuid
FROM circles";

const ROLE_SELECT_SQL: &str = "SELECT uuid, circle_uuid, name, purpose FROM roles";

const ASSIGNMENT_SELECT_SQL: &str = "SELECT
    uuid,
    role_uuid,
    person_uuid,
    started_at,
    ended_at
FROM role_assignments";

/// Repository interface for the circle hierarchy.
pub trait CircleRepository {
    fn create_circle(&self, circle: &Circle) -> RepoResult<CircleId>;
    /// Full-row overwrite; last write wins.
    fn update_circle(&self, circle: &Circle) -> RepoResult<()>;
    fn get_circle(&self, id: CircleId) -> RepoResult<Option<Circle>>;
    fn list_circles(&self) -> RepoResult<Vec<Circle>>;
    fn create_role(&self, role: &Role) -> RepoResult<RoleId>;
    fn get_role(&self, id: RoleId) -> RepoResult<Option<Role>>;
    fn list_roles(&self) -> RepoResult<Vec<Role>>;
    fn list_roles_for_circle(&self, circle_uuid: CircleId) -> RepoResult<Vec<Role>>;
    fn assign_role(&self, role_uuid: RoleId, person_uuid: PersonId) -> RepoResult<RoleAssignment>;
    fn end_role_assignment(&self, assignment_uuid: RoleAssignmentId) -> RepoResult<()>;
    fn list_current_assignments(&self, role_uuid: RoleId) -> RepoResult<Vec<RoleAssignment>>;
}

/// SQLite-backed circle repository.
pub struct SqliteCircleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCircleRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &["circles", "roles", "role_assignments"])?;
        Ok(Self { conn })
    }
}

impl CircleRepository for SqliteCircleRepository<'_> {
    fn create_circle(&self, circle: &Circle) -> RepoResult<CircleId> {
        circle.validate()?;

        self.conn.execute(
            "INSERT INTO circles (
                uuid,
                name,
                purpose,
                color,
                icon,
                parent_circle_uuid
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                circle.uuid.to_string(),
                circle.name.trim(),
                circle.purpose.as_deref(),
                circle.color.as_deref(),
                circle.icon.as_deref(),
                circle.parent_circle_uuid.map(|id| id.to_string()),
            ],
        )?;
        Ok(circle.uuid)
    }

    fn update_circle(&self, circle: &Circle) -> RepoResult<()> {
        circle.validate()?;

        let changed = self.conn.execute(
            "UPDATE circles
             SET
                name = ?2,
                purpose = ?3,
                color = ?4,
                icon = ?5,
                parent_circle_uuid = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                circle.uuid.to_string(),
                circle.name.trim(),
                circle.purpose.as_deref(),
                circle.color.as_deref(),
                circle.icon.as_deref(),
                circle.parent_circle_uuid.map(|id| id.to_string()),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "circle",
                id: circle.uuid,
            });
        }
        Ok(())
    }

    fn get_circle(&self, id: CircleId) -> RepoResult<Option<Circle>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CIRCLE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_circle_row(row)?));
        }
        Ok(None)
    }

    fn list_circles(&self) -> RepoResult<Vec<Circle>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CIRCLE_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut circles = Vec::new();
        while let Some(row) = rows.next()? {
            circles.push(parse_circle_row(row)?);
        }
        Ok(circles)
    }

    fn create_role(&self, role: &Role) -> RepoResult<RoleId> {
        role.validate()?;

        self.conn.execute(
            "INSERT INTO roles (uuid, circle_uuid, name, purpose)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                role.uuid.to_string(),
                role.circle_uuid.to_string(),
                role.name.trim(),
                role.purpose.as_deref(),
            ],
        )?;
        Ok(role.uuid)
    }

    fn get_role(&self, id: RoleId) -> RepoResult<Option<Role>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ROLE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_role_row(row)?));
        }
        Ok(None)
    }

    fn list_roles(&self) -> RepoResult<Vec<Role>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ROLE_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut roles = Vec::new();
        while let Some(row) = rows.next()? {
            roles.push(parse_role_row(row)?);
        }
        Ok(roles)
    }

    fn list_roles_for_circle(&self, circle_uuid: CircleId) -> RepoResult<Vec<Role>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ROLE_SELECT_SQL} WHERE circle_uuid = ?1 ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([circle_uuid.to_string()])?;
        let mut roles = Vec::new();
        while let Some(row) = rows.next()? {
            roles.push(parse_role_row(row)?);
        }
        Ok(roles)
    }

    fn assign_role(&self, role_uuid: RoleId, person_uuid: PersonId) -> RepoResult<RoleAssignment> {
        let assignment_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO role_assignments (uuid, role_uuid, person_uuid, started_at, ended_at)
             VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000), NULL);",
            params![
                assignment_uuid.to_string(),
                role_uuid.to_string(),
                person_uuid.to_string(),
            ],
        )?;
        self.load_assignment(assignment_uuid)
    }

    fn end_role_assignment(&self, assignment_uuid: RoleAssignmentId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE role_assignments
             SET ended_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND ended_at IS NULL;",
            [assignment_uuid.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "role assignment",
                id: assignment_uuid,
            });
        }
        Ok(())
    }

    fn list_current_assignments(&self, role_uuid: RoleId) -> RepoResult<Vec<RoleAssignment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ASSIGNMENT_SELECT_SQL}
             WHERE role_uuid = ?1
               AND ended_at IS NULL
             ORDER BY started_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([role_uuid.to_string()])?;
        let mut assignments = Vec::new();
        while let Some(row) = rows.next()? {
            assignments.push(parse_assignment_row(row)?);
        }
        Ok(assignments)
    }
}

impl SqliteCircleRepository<'_> {
    fn load_assignment(&self, id: RoleAssignmentId) -> RepoResult<RoleAssignment> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ASSIGNMENT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return parse_assignment_row(row);
        }
        Err(RepoError::NotFound {
            entity: "role assignment",
            id,
        })
    }
}

fn parse_circle_row(row: &Row<'_>) -> RepoResult<Circle> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Circle {
        uuid: parse_uuid(&uuid_text, "circles.uuid")?,
        name: row.get("name")?,
        purpose: row.get("purpose")?,
        color: row.get("color")?,
        icon: row.get("icon")?,
        parent_circle_uuid: parse_optional_uuid(
            row.get("parent_circle_uuid")?,
            "circles.parent_circle_uuid",
        )?,
    })
}

fn parse_role_row(row: &Row<'_>) -> RepoResult<Role> {
    let uuid_text: String = row.get("uuid")?;
    let circle_text: String = row.get("circle_uuid")?;
    Ok(Role {
        uuid: parse_uuid(&uuid_text, "roles.uuid")?,
        circle_uuid: parse_uuid(&circle_text, "roles.circle_uuid")?,
        name: row.get("name")?,
        purpose: row.get("purpose")?,
    })
}

fn parse_assignment_row(row: &Row<'_>) -> RepoResult<RoleAssignment> {
    let uuid_text: String = row.get("uuid")?;
    let role_text: String = row.get("role_uuid")?;
    let person_text: String = row.get("person_uuid")?;
    Ok(RoleAssignment {
        uuid: parse_uuid(&uuid_text, "role_assignments.uuid")?,
        role_uuid: parse_uuid(&role_text, "role_assignments.role_uuid")?,
        person_uuid: parse_uuid(&person_text, "role_assignments.person_uuid")?,
        started_at: row.get("started_at")?,
        ended_at: row.get("ended_at")?,
    })
}
