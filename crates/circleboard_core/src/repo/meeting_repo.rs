//! Meeting repository: meetings, agenda, comments, attendees and rounds.
//!
//! # Responsibility
//! - Persist the live meeting protocol state (phase, agenda pointer).
//! - Keep tension status in step with agenda scheduling/processing.
//!
//! # Invariants
//! - Agenda positions are dense, 1-based and unique per meeting.
//! - Attendance and round entries are keyed, so repeats overwrite or no-op.
//! - Multi-row writes run inside one `IMMEDIATE` transaction.

use crate::model::circle::CircleId;
use crate::model::meeting::{
    AgendaComment, AgendaItem, AgendaItemId, Attendee, Meeting, MeetingId, MeetingPhase,
    MeetingStatus, MeetingType, RoundEntry, RoundPhase,
};
use crate::model::person::PersonId;
use crate::model::tension::TensionId;
use crate::model::{normalize_optional, normalize_required};
use crate::repo::{
    ensure_schema_ready, parse_code, parse_flag, parse_optional_uuid, parse_uuid,
    RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const MEETING_SELECT_SQL: &str = "SELECT
    uuid,
    circle_uuid,
    meeting_type,
    scheduled_at,
    status,
    facilitator_uuid,
    notes,
    protocol,
    current_phase,
    current_agenda_position
FROM meetings";

const AGENDA_SELECT_SQL: &str = "SELECT
    uuid,
    meeting_uuid,
    position,
    tension_uuid,
    title,
    notes,
    is_processed,
    outcome
FROM agenda_items";

const COMMENT_SELECT_SQL: &str = "SELECT
    uuid,
    agenda_item_uuid,
    person_uuid,
    content,
    created_at
FROM agenda_comments";

const ROUND_SELECT_SQL: &str = "SELECT
    uuid,
    meeting_uuid,
    person_uuid,
    phase,
    content,
    updated_at
FROM round_entries";

/// Input for appending an agenda item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewAgendaItem {
    pub tension_uuid: Option<TensionId>,
    pub title: Option<String>,
    pub notes: Option<String>,
}

/// Display names resolved for protocol rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingLabels {
    pub circle_name: String,
    pub facilitator_name: Option<String>,
    /// Everyone who attended, commented or wrote a round entry.
    pub participant_names: Vec<(PersonId, String)>,
}

/// Repository interface for meetings and everything hanging off them.
pub trait MeetingRepository {
    fn create_meeting(&self, meeting: &Meeting) -> RepoResult<MeetingId>;
    fn get_meeting(&self, id: MeetingId) -> RepoResult<Option<Meeting>>;
    /// Ordered by `scheduled_at` ascending.
    fn list_meetings_for_circle(&self, circle_uuid: CircleId) -> RepoResult<Vec<Meeting>>;
    fn meeting_labels(&self, id: MeetingId) -> RepoResult<Option<MeetingLabels>>;
    fn set_facilitator(&self, id: MeetingId, facilitator: Option<PersonId>) -> RepoResult<()>;
    /// Flips status to active and enters the initial phase.
    fn start_meeting(&self, id: MeetingId, first_position: Option<u32>) -> RepoResult<()>;
    fn set_phase(&self, id: MeetingId, phase: MeetingPhase) -> RepoResult<()>;
    /// Stores the protocol and marks the meeting completed.
    fn complete_meeting(&self, id: MeetingId, protocol: &str) -> RepoResult<()>;
    fn set_agenda_position(&self, id: MeetingId, position: u32) -> RepoResult<()>;

    /// Appends at the next free position. A linked tension becomes `scheduled`
    /// and lends its title when none is given.
    fn add_agenda_item(&self, meeting_uuid: MeetingId, item: &NewAgendaItem)
        -> RepoResult<AgendaItem>;
    fn get_agenda_item(&self, id: AgendaItemId) -> RepoResult<Option<AgendaItem>>;
    /// Ordered by position, comments ordered by creation.
    fn list_agenda_items(&self, meeting_uuid: MeetingId) -> RepoResult<Vec<AgendaItem>>;
    /// Sets processed + outcome. A linked tension becomes `resolved`.
    fn mark_agenda_item_processed(
        &self,
        id: AgendaItemId,
        outcome: Option<&str>,
    ) -> RepoResult<()>;
    fn update_agenda_item_outcome(&self, id: AgendaItemId, outcome: Option<&str>)
        -> RepoResult<()>;
    fn add_agenda_comment(
        &self,
        agenda_item_uuid: AgendaItemId,
        person_uuid: PersonId,
        content: &str,
    ) -> RepoResult<AgendaComment>;

    /// Returns `true` when a new attendance row was written.
    fn add_attendee(&self, meeting_uuid: MeetingId, person_uuid: PersonId) -> RepoResult<bool>;
    fn list_attendees(&self, meeting_uuid: MeetingId) -> RepoResult<Vec<Attendee>>;

    fn upsert_round_entry(
        &self,
        meeting_uuid: MeetingId,
        person_uuid: PersonId,
        phase: RoundPhase,
        content: &str,
    ) -> RepoResult<RoundEntry>;
    fn list_round_entries(
        &self,
        meeting_uuid: MeetingId,
        phase: RoundPhase,
    ) -> RepoResult<Vec<RoundEntry>>;
}

/// SQLite-backed meeting repository.
pub struct SqliteMeetingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMeetingRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(
            conn,
            &[
                "meetings",
                "meeting_attendees",
                "agenda_items",
                "agenda_comments",
                "round_entries",
                "tensions",
                "circles",
                "people",
            ],
        )?;
        Ok(Self { conn })
    }

    fn update_meeting_row(&self, id: MeetingId, sql: &str, value: Option<String>) -> RepoResult<()> {
        let changed = self.conn.execute(sql, params![id.to_string(), value])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "meeting",
                id,
            });
        }
        Ok(())
    }

    fn load_comments(&self, agenda_item_uuid: AgendaItemId) -> RepoResult<Vec<AgendaComment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL}
             WHERE agenda_item_uuid = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([agenda_item_uuid.to_string()])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }

    fn require_agenda_item(&self, id: AgendaItemId) -> RepoResult<AgendaItem> {
        self.get_agenda_item(id)?.ok_or(RepoError::NotFound {
            entity: "agenda item",
            id,
        })
    }
}

impl MeetingRepository for SqliteMeetingRepository<'_> {
    fn create_meeting(&self, meeting: &Meeting) -> RepoResult<MeetingId> {
        self.conn.execute(
            "INSERT INTO meetings (
                uuid,
                circle_uuid,
                meeting_type,
                scheduled_at,
                status,
                facilitator_uuid,
                notes,
                protocol,
                current_phase,
                current_agenda_position
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                meeting.uuid.to_string(),
                meeting.circle_uuid.to_string(),
                meeting.meeting_type.as_str(),
                meeting.scheduled_at,
                meeting.status.as_str(),
                meeting.facilitator_uuid.map(|id| id.to_string()),
                normalize_optional(meeting.notes.clone()),
                meeting.protocol.as_deref(),
                meeting.current_phase.map(MeetingPhase::as_str),
                meeting.current_agenda_position,
            ],
        )?;
        Ok(meeting.uuid)
    }

    fn get_meeting(&self, id: MeetingId) -> RepoResult<Option<Meeting>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEETING_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_meeting_row(row)?));
        }
        Ok(None)
    }

    fn list_meetings_for_circle(&self, circle_uuid: CircleId) -> RepoResult<Vec<Meeting>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEETING_SELECT_SQL}
             WHERE circle_uuid = ?1
             ORDER BY scheduled_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([circle_uuid.to_string()])?;
        let mut meetings = Vec::new();
        while let Some(row) = rows.next()? {
            meetings.push(parse_meeting_row(row)?);
        }
        Ok(meetings)
    }

    fn meeting_labels(&self, id: MeetingId) -> RepoResult<Option<MeetingLabels>> {
        let header = self
            .conn
            .query_row(
                "SELECT c.name, p.display_name
                 FROM meetings m
                 JOIN circles c ON c.uuid = m.circle_uuid
                 LEFT JOIN people p ON p.uuid = m.facilitator_uuid
                 WHERE m.uuid = ?1;",
                [id.to_string()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()?;
        let Some((circle_name, facilitator_name)) = header else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT p.uuid, p.display_name
             FROM people p
             WHERE p.uuid IN (
                 SELECT person_uuid FROM meeting_attendees WHERE meeting_uuid = ?1
                 UNION
                 SELECT person_uuid FROM round_entries WHERE meeting_uuid = ?1
                 UNION
                 SELECT ac.person_uuid
                 FROM agenda_comments ac
                 JOIN agenda_items ai ON ai.uuid = ac.agenda_item_uuid
                 WHERE ai.meeting_uuid = ?1
             )
             ORDER BY p.display_name COLLATE NOCASE ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut participant_names = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get(0)?;
            participant_names.push((parse_uuid(&uuid_text, "people.uuid")?, row.get(1)?));
        }

        Ok(Some(MeetingLabels {
            circle_name,
            facilitator_name,
            participant_names,
        }))
    }

    fn set_facilitator(&self, id: MeetingId, facilitator: Option<PersonId>) -> RepoResult<()> {
        self.update_meeting_row(
            id,
            "UPDATE meetings
             SET facilitator_uuid = ?2, updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            facilitator.map(|person| person.to_string()),
        )
    }

    fn start_meeting(&self, id: MeetingId, first_position: Option<u32>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE meetings
             SET
                status = ?2,
                current_phase = ?3,
                current_agenda_position = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                id.to_string(),
                MeetingStatus::Active.as_str(),
                MeetingPhase::INITIAL.as_str(),
                first_position,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "meeting",
                id,
            });
        }
        Ok(())
    }

    fn set_phase(&self, id: MeetingId, phase: MeetingPhase) -> RepoResult<()> {
        self.update_meeting_row(
            id,
            "UPDATE meetings
             SET current_phase = ?2, updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            Some(phase.as_str().to_string()),
        )
    }

    fn complete_meeting(&self, id: MeetingId, protocol: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE meetings
             SET
                status = ?2,
                protocol = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), MeetingStatus::Completed.as_str(), protocol],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "meeting",
                id,
            });
        }
        Ok(())
    }

    fn set_agenda_position(&self, id: MeetingId, position: u32) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE meetings
             SET current_agenda_position = ?2, updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), position],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "meeting",
                id,
            });
        }
        Ok(())
    }

    fn add_agenda_item(
        &self,
        meeting_uuid: MeetingId,
        item: &NewAgendaItem,
    ) -> RepoResult<AgendaItem> {
        let title = normalize_optional(item.title.clone());
        let notes = normalize_optional(item.notes.clone());
        let agenda_uuid = Uuid::new_v4();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !meeting_exists_in_tx(&tx, meeting_uuid)? {
            return Err(RepoError::NotFound {
                entity: "meeting",
                id: meeting_uuid,
            });
        }
        if let Some(tension_uuid) = item.tension_uuid {
            if !tension_exists_in_tx(&tx, tension_uuid)? {
                return Err(RepoError::NotFound {
                    entity: "tension",
                    id: tension_uuid,
                });
            }
        }
        let position: u32 = tx.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM agenda_items WHERE meeting_uuid = ?1;",
            [meeting_uuid.to_string()],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO agenda_items (uuid, meeting_uuid, position, tension_uuid, title, notes)
             VALUES (
                ?1,
                ?2,
                ?3,
                ?4,
                COALESCE(?5, (SELECT title FROM tensions WHERE uuid = ?4)),
                ?6
             );",
            params![
                agenda_uuid.to_string(),
                meeting_uuid.to_string(),
                position,
                item.tension_uuid.map(|id| id.to_string()),
                title.as_deref(),
                notes.as_deref(),
            ],
        )?;
        if let Some(tension_uuid) = item.tension_uuid {
            tx.execute(
                "UPDATE tensions
                 SET status = 'scheduled', updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1 AND status = 'open';",
                [tension_uuid.to_string()],
            )?;
        }
        tx.commit()?;

        self.require_agenda_item(agenda_uuid)
    }

    fn get_agenda_item(&self, id: AgendaItemId) -> RepoResult<Option<AgendaItem>> {
        let item = self
            .conn
            .query_row(
                &format!("{AGENDA_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_agenda_row(row)),
            )
            .optional()?
            .transpose()?;
        let Some(mut item) = item else {
            return Ok(None);
        };
        item.comments = self.load_comments(item.uuid)?;
        Ok(Some(item))
    }

    fn list_agenda_items(&self, meeting_uuid: MeetingId) -> RepoResult<Vec<AgendaItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "{AGENDA_SELECT_SQL} WHERE meeting_uuid = ?1 ORDER BY position ASC;"
        ))?;
        let mut rows = stmt.query([meeting_uuid.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_agenda_row(row)?);
        }
        for item in &mut items {
            item.comments = self.load_comments(item.uuid)?;
        }
        Ok(items)
    }

    fn mark_agenda_item_processed(
        &self,
        id: AgendaItemId,
        outcome: Option<&str>,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE agenda_items
             SET
                is_processed = 1,
                outcome = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), outcome],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "agenda item",
                id,
            });
        }
        tx.execute(
            "UPDATE tensions
             SET status = 'resolved', updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = (SELECT tension_uuid FROM agenda_items WHERE uuid = ?1)
               AND status != 'resolved';",
            [id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn update_agenda_item_outcome(
        &self,
        id: AgendaItemId,
        outcome: Option<&str>,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE agenda_items
             SET outcome = ?2, updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), outcome],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "agenda item",
                id,
            });
        }
        Ok(())
    }

    fn add_agenda_comment(
        &self,
        agenda_item_uuid: AgendaItemId,
        person_uuid: PersonId,
        content: &str,
    ) -> RepoResult<AgendaComment> {
        let content = normalize_required(content, "comment")?;
        self.require_agenda_item(agenda_item_uuid)?;

        let comment_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO agenda_comments (uuid, agenda_item_uuid, person_uuid, content)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                comment_uuid.to_string(),
                agenda_item_uuid.to_string(),
                person_uuid.to_string(),
                content,
            ],
        )?;
        let comment = self.conn.query_row(
            &format!("{COMMENT_SELECT_SQL} WHERE uuid = ?1;"),
            [comment_uuid.to_string()],
            |row| Ok(parse_comment_row(row)),
        )??;
        Ok(comment)
    }

    fn add_attendee(&self, meeting_uuid: MeetingId, person_uuid: PersonId) -> RepoResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO meeting_attendees (meeting_uuid, person_uuid)
             VALUES (?1, ?2);",
            params![meeting_uuid.to_string(), person_uuid.to_string()],
        )?;
        Ok(inserted > 0)
    }

    fn list_attendees(&self, meeting_uuid: MeetingId) -> RepoResult<Vec<Attendee>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.person_uuid, p.display_name, a.joined_at
             FROM meeting_attendees a
             JOIN people p ON p.uuid = a.person_uuid
             WHERE a.meeting_uuid = ?1
             ORDER BY a.joined_at ASC, a.rowid ASC;",
        )?;
        let mut rows = stmt.query([meeting_uuid.to_string()])?;
        let mut attendees = Vec::new();
        while let Some(row) = rows.next()? {
            let person_text: String = row.get(0)?;
            attendees.push(Attendee {
                person_uuid: parse_uuid(&person_text, "meeting_attendees.person_uuid")?,
                display_name: row.get(1)?,
                joined_at: row.get(2)?,
            });
        }
        Ok(attendees)
    }

    fn upsert_round_entry(
        &self,
        meeting_uuid: MeetingId,
        person_uuid: PersonId,
        phase: RoundPhase,
        content: &str,
    ) -> RepoResult<RoundEntry> {
        let content = normalize_required(content, "round entry")?;
        self.conn.execute(
            "INSERT INTO round_entries (uuid, meeting_uuid, person_uuid, phase, content)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (meeting_uuid, person_uuid, phase) DO UPDATE SET
                content = excluded.content,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                Uuid::new_v4().to_string(),
                meeting_uuid.to_string(),
                person_uuid.to_string(),
                phase.as_str(),
                content,
            ],
        )?;
        let entry = self.conn.query_row(
            &format!(
                "{ROUND_SELECT_SQL}
                 WHERE meeting_uuid = ?1 AND person_uuid = ?2 AND phase = ?3;"
            ),
            params![
                meeting_uuid.to_string(),
                person_uuid.to_string(),
                phase.as_str()
            ],
            |row| Ok(parse_round_row(row)),
        )??;
        Ok(entry)
    }

    fn list_round_entries(
        &self,
        meeting_uuid: MeetingId,
        phase: RoundPhase,
    ) -> RepoResult<Vec<RoundEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ROUND_SELECT_SQL}
             WHERE meeting_uuid = ?1 AND phase = ?2
             ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query(params![meeting_uuid.to_string(), phase.as_str()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_round_row(row)?);
        }
        Ok(entries)
    }
}

fn meeting_exists_in_tx(tx: &Transaction<'_>, id: MeetingId) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM meetings WHERE uuid = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn tension_exists_in_tx(tx: &Transaction<'_>, id: TensionId) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM tensions WHERE uuid = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_meeting_row(row: &Row<'_>) -> RepoResult<Meeting> {
    let uuid_text: String = row.get("uuid")?;
    let circle_text: String = row.get("circle_uuid")?;
    let type_text: String = row.get("meeting_type")?;
    let status_text: String = row.get("status")?;
    let phase_text: Option<String> = row.get("current_phase")?;

    Ok(Meeting {
        uuid: parse_uuid(&uuid_text, "meetings.uuid")?,
        circle_uuid: parse_uuid(&circle_text, "meetings.circle_uuid")?,
        meeting_type: parse_code(&type_text, "meetings.meeting_type", MeetingType::parse)?,
        scheduled_at: row.get("scheduled_at")?,
        status: parse_code(&status_text, "meetings.status", MeetingStatus::parse)?,
        facilitator_uuid: parse_optional_uuid(
            row.get("facilitator_uuid")?,
            "meetings.facilitator_uuid",
        )?,
        notes: row.get("notes")?,
        protocol: row.get("protocol")?,
        current_phase: phase_text
            .map(|value| parse_code(&value, "meetings.current_phase", MeetingPhase::parse))
            .transpose()?,
        current_agenda_position: row.get("current_agenda_position")?,
    })
}

fn parse_agenda_row(row: &Row<'_>) -> RepoResult<AgendaItem> {
    let uuid_text: String = row.get("uuid")?;
    let meeting_text: String = row.get("meeting_uuid")?;
    Ok(AgendaItem {
        uuid: parse_uuid(&uuid_text, "agenda_items.uuid")?,
        meeting_uuid: parse_uuid(&meeting_text, "agenda_items.meeting_uuid")?,
        position: row.get("position")?,
        tension_uuid: parse_optional_uuid(row.get("tension_uuid")?, "agenda_items.tension_uuid")?,
        title: row.get("title")?,
        notes: row.get("notes")?,
        is_processed: parse_flag(row.get("is_processed")?, "agenda_items.is_processed")?,
        outcome: row.get("outcome")?,
        comments: Vec::new(),
    })
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<AgendaComment> {
    let uuid_text: String = row.get("uuid")?;
    let item_text: String = row.get("agenda_item_uuid")?;
    let person_text: String = row.get("person_uuid")?;
    Ok(AgendaComment {
        uuid: parse_uuid(&uuid_text, "agenda_comments.uuid")?,
        agenda_item_uuid: parse_uuid(&item_text, "agenda_comments.agenda_item_uuid")?,
        person_uuid: parse_uuid(&person_text, "agenda_comments.person_uuid")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_round_row(row: &Row<'_>) -> RepoResult<RoundEntry> {
    let uuid_text: String = row.get("uuid")?;
    let meeting_text: String = row.get("meeting_uuid")?;
    let person_text: String = row.get("person_uuid")?;
    let phase_text: String = row.get("phase")?;
    Ok(RoundEntry {
        uuid: parse_uuid(&uuid_text, "round_entries.uuid")?,
        meeting_uuid: parse_uuid(&meeting_text, "round_entries.meeting_uuid")?,
        person_uuid: parse_uuid(&person_text, "round_entries.person_uuid")?,
        phase: parse_code(&phase_text, "round_entries.phase", RoundPhase::parse)?,
        content: row.get("content")?,
        updated_at: row.get("updated_at")?,
    })
}

