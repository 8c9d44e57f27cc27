//! Tension repository contracts and SQLite implementation.

use crate::model::circle::CircleId;
use crate::model::tension::{Tension, TensionId, TensionStatus};
use crate::model::{normalize_optional, normalize_required};
use crate::repo::{
    ensure_schema_ready, parse_code, parse_optional_uuid, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const TENSION_SELECT_SQL: &str = "SELECT
    uuid,
    circle_uuid,
    raised_by,
    title,
    description,
    status,
    created_at,
    updated_at
FROM tensions";

pub trait TensionRepository {
    /// Inserts the tension and returns it as stored (timestamps filled in).
    fn create_tension(&self, tension: &Tension) -> RepoResult<Tension>;
    fn get_tension(&self, id: TensionId) -> RepoResult<Option<Tension>>;
    /// Newest first; `status` narrows the listing when present.
    fn list_tensions_for_circle(
        &self,
        circle_uuid: CircleId,
        status: Option<TensionStatus>,
    ) -> RepoResult<Vec<Tension>>;
    fn set_tension_status(&self, id: TensionId, status: TensionStatus) -> RepoResult<()>;
}

/// SQLite-backed tension repository.
pub struct SqliteTensionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTensionRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &["tensions"])?;
        Ok(Self { conn })
    }
}

impl TensionRepository for SqliteTensionRepository<'_> {
    fn create_tension(&self, tension: &Tension) -> RepoResult<Tension> {
        let title = normalize_required(tension.title.as_str(), "tension title")?;
        self.conn.execute(
            "INSERT INTO tensions (uuid, circle_uuid, raised_by, title, description, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                tension.uuid.to_string(),
                tension.circle_uuid.to_string(),
                tension.raised_by.map(|id| id.to_string()),
                title,
                normalize_optional(tension.description.clone()),
                tension.status.as_str(),
            ],
        )?;
        self.get_tension(tension.uuid)?.ok_or(RepoError::NotFound {
            entity: "tension",
            id: tension.uuid,
        })
    }

    fn get_tension(&self, id: TensionId) -> RepoResult<Option<Tension>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TENSION_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_tension_row(row)?));
        }
        Ok(None)
    }

    fn list_tensions_for_circle(
        &self,
        circle_uuid: CircleId,
        status: Option<TensionStatus>,
    ) -> RepoResult<Vec<Tension>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TENSION_SELECT_SQL}
             WHERE circle_uuid = ?1
               AND (?2 IS NULL OR status = ?2)
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query(params![
            circle_uuid.to_string(),
            status.map(TensionStatus::as_str)
        ])?;
        let mut tensions = Vec::new();
        while let Some(row) = rows.next()? {
            tensions.push(parse_tension_row(row)?);
        }
        Ok(tensions)
    }

    fn set_tension_status(&self, id: TensionId, status: TensionStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tensions
             SET status = ?2, updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), status.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "tension",
                id,
            });
        }
        Ok(())
    }
}

fn parse_tension_row(row: &Row<'_>) -> RepoResult<Tension> {
    let uuid_text: String = row.get("uuid")?;
    let circle_text: String = row.get("circle_uuid")?;
    let status_text: String = row.get("status")?;
    Ok(Tension {
        uuid: parse_uuid(&uuid_text, "tensions.uuid")?,
        circle_uuid: parse_uuid(&circle_text, "tensions.circle_uuid")?,
        raised_by: parse_optional_uuid(row.get("raised_by")?, "tensions.raised_by")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: parse_code(&status_text, "tensions.status", TensionStatus::parse)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
