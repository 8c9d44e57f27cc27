//! Vorhaben (initiative) repository with subtasks and volunteer sign-ups.
//!
//! # Invariants
//! - Subtasks keep insertion order through a dense `sort_order`.
//! - Volunteers are a set; a repeated sign-up writes nothing.

use crate::model::person::PersonId;
use crate::model::vorhaben::{Subtask, SubtaskId, Vorhaben, VorhabenId, VorhabenStatus};
use crate::model::{normalize_optional, normalize_required};
use crate::repo::{
    bool_to_int, ensure_schema_ready, parse_code, parse_flag, parse_optional_uuid, parse_uuid,
    RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const VORHABEN_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    description,
    status,
    created_by,
    created_at,
    updated_at
FROM vorhaben";

pub trait VorhabenRepository {
    fn create_vorhaben(&self, vorhaben: &Vorhaben) -> RepoResult<VorhabenId>;
    /// Loads the row together with subtasks and volunteers.
    fn get_vorhaben(&self, id: VorhabenId) -> RepoResult<Option<Vorhaben>>;
    fn list_vorhaben(&self, status: Option<VorhabenStatus>) -> RepoResult<Vec<Vorhaben>>;
    fn set_vorhaben_status(&self, id: VorhabenId, status: VorhabenStatus) -> RepoResult<()>;
    fn add_subtask(&self, vorhaben_uuid: VorhabenId, title: &str) -> RepoResult<Subtask>;
    fn set_subtask_done(&self, id: SubtaskId, is_done: bool) -> RepoResult<()>;
    /// Returns `true` when the person was not yet signed up.
    fn add_volunteer(&self, vorhaben_uuid: VorhabenId, person_uuid: PersonId) -> RepoResult<bool>;
    /// Returns `true` when a sign-up was removed.
    fn remove_volunteer(&self, vorhaben_uuid: VorhabenId, person_uuid: PersonId)
        -> RepoResult<bool>;
}

/// SQLite-backed Vorhaben repository.
pub struct SqliteVorhabenRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVorhabenRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(
            conn,
            &["vorhaben", "vorhaben_subtasks", "vorhaben_volunteers"],
        )?;
        Ok(Self { conn })
    }

    fn load_children(&self, vorhaben: &mut Vorhaben) -> RepoResult<()> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, vorhaben_uuid, title, is_done, sort_order
             FROM vorhaben_subtasks
             WHERE vorhaben_uuid = ?1
             ORDER BY sort_order ASC;",
        )?;
        let mut rows = stmt.query([vorhaben.uuid.to_string()])?;
        while let Some(row) = rows.next()? {
            vorhaben.subtasks.push(parse_subtask_row(row)?);
        }

        let mut stmt = self.conn.prepare(
            "SELECT person_uuid
             FROM vorhaben_volunteers
             WHERE vorhaben_uuid = ?1
             ORDER BY signed_up_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([vorhaben.uuid.to_string()])?;
        while let Some(row) = rows.next()? {
            let person_text: String = row.get(0)?;
            vorhaben
                .volunteers
                .push(parse_uuid(&person_text, "vorhaben_volunteers.person_uuid")?);
        }
        Ok(())
    }

    fn touch(&self, id: VorhabenId) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE vorhaben SET updated_at = (strftime('%s', 'now') * 1000) WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        Ok(())
    }
}

impl VorhabenRepository for SqliteVorhabenRepository<'_> {
    fn create_vorhaben(&self, vorhaben: &Vorhaben) -> RepoResult<VorhabenId> {
        let title = normalize_required(vorhaben.title.as_str(), "vorhaben title")?;
        self.conn.execute(
            "INSERT INTO vorhaben (uuid, title, description, status, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                vorhaben.uuid.to_string(),
                title,
                normalize_optional(vorhaben.description.clone()),
                vorhaben.status.as_str(),
                vorhaben.created_by.map(|id| id.to_string()),
            ],
        )?;
        Ok(vorhaben.uuid)
    }

    fn get_vorhaben(&self, id: VorhabenId) -> RepoResult<Option<Vorhaben>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{VORHABEN_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let mut vorhaben = parse_vorhaben_row(row)?;
        self.load_children(&mut vorhaben)?;
        Ok(Some(vorhaben))
    }

    fn list_vorhaben(&self, status: Option<VorhabenStatus>) -> RepoResult<Vec<Vorhaben>> {
        let mut stmt = self.conn.prepare(&format!(
            "{VORHABEN_SELECT_SQL}
             WHERE (?1 IS NULL OR status = ?1)
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([status.map(VorhabenStatus::as_str)])?;
        let mut list = Vec::new();
        while let Some(row) = rows.next()? {
            list.push(parse_vorhaben_row(row)?);
        }
        for vorhaben in &mut list {
            self.load_children(vorhaben)?;
        }
        Ok(list)
    }

    fn set_vorhaben_status(&self, id: VorhabenId, status: VorhabenStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE vorhaben
             SET status = ?2, updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), status.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "vorhaben",
                id,
            });
        }
        Ok(())
    }

    fn add_subtask(&self, vorhaben_uuid: VorhabenId, title: &str) -> RepoResult<Subtask> {
        let title = normalize_required(title, "subtask title")?;
        let subtask_uuid = Uuid::new_v4();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM vorhaben WHERE uuid = ?1);",
            [vorhaben_uuid.to_string()],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::NotFound {
                entity: "vorhaben",
                id: vorhaben_uuid,
            });
        }
        let sort_order: i64 = tx.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1
             FROM vorhaben_subtasks
             WHERE vorhaben_uuid = ?1;",
            [vorhaben_uuid.to_string()],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO vorhaben_subtasks (uuid, vorhaben_uuid, title, is_done, sort_order)
             VALUES (?1, ?2, ?3, 0, ?4);",
            params![
                subtask_uuid.to_string(),
                vorhaben_uuid.to_string(),
                title,
                sort_order
            ],
        )?;
        tx.execute(
            "UPDATE vorhaben SET updated_at = (strftime('%s', 'now') * 1000) WHERE uuid = ?1;",
            [vorhaben_uuid.to_string()],
        )?;
        tx.commit()?;

        Ok(Subtask {
            uuid: subtask_uuid,
            vorhaben_uuid,
            title,
            is_done: false,
            sort_order,
        })
    }

    fn set_subtask_done(&self, id: SubtaskId, is_done: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE vorhaben_subtasks SET is_done = ?2 WHERE uuid = ?1;",
            params![id.to_string(), bool_to_int(is_done)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "subtask",
                id,
            });
        }
        Ok(())
    }

    fn add_volunteer(&self, vorhaben_uuid: VorhabenId, person_uuid: PersonId) -> RepoResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO vorhaben_volunteers (vorhaben_uuid, person_uuid)
             VALUES (?1, ?2);",
            params![vorhaben_uuid.to_string(), person_uuid.to_string()],
        )?;
        if inserted > 0 {
            self.touch(vorhaben_uuid)?;
        }
        Ok(inserted > 0)
    }

    fn remove_volunteer(
        &self,
        vorhaben_uuid: VorhabenId,
        person_uuid: PersonId,
    ) -> RepoResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM vorhaben_volunteers WHERE vorhaben_uuid = ?1 AND person_uuid = ?2;",
            params![vorhaben_uuid.to_string(), person_uuid.to_string()],
        )?;
        if removed > 0 {
            self.touch(vorhaben_uuid)?;
        }
        Ok(removed > 0)
    }
}

fn parse_vorhaben_row(row: &Row<'_>) -> RepoResult<Vorhaben> {
    let uuid_text: String = row.get("uuid")?;
    let status_text: String = row.get("status")?;
    Ok(Vorhaben {
        uuid: parse_uuid(&uuid_text, "vorhaben.uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: parse_code(&status_text, "vorhaben.status", VorhabenStatus::parse)?,
        created_by: parse_optional_uuid(row.get("created_by")?, "vorhaben.created_by")?,
        subtasks: Vec::new(),
        volunteers: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_subtask_row(row: &Row<'_>) -> RepoResult<Subtask> {
    let uuid_text: String = row.get("uuid")?;
    let parent_text: String = row.get("vorhaben_uuid")?;
    Ok(Subtask {
        uuid: parse_uuid(&uuid_text, "vorhaben_subtasks.uuid")?,
        vorhaben_uuid: parse_uuid(&parent_text, "vorhaben_subtasks.vorhaben_uuid")?,
        title: row.get("title")?,
        is_done: parse_flag(row.get("is_done")?, "vorhaben_subtasks.is_done")?,
        sort_order: row.get("sort_order")?,
    })
}
