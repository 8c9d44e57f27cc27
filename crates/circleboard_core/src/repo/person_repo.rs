//! Person repository contracts and SQLite implementation.

use crate::model::normalize_required;
use crate::model::person::{Person, PersonId};
use crate::repo::{bool_to_int, ensure_schema_ready, parse_flag, parse_uuid, RepoResult};
use rusqlite::{params, Connection, Row};

const PERSON_SELECT_SQL: &str = "SELECT uuid, display_name, email, is_admin FROM people";

pub trait PersonRepository {
    fn create_person(&self, person: &Person) -> RepoResult<PersonId>;
    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>>;
    /// Sorted by display name.
    fn list_people(&self) -> RepoResult<Vec<Person>>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &["people"])?;
        Ok(Self { conn })
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn create_person(&self, person: &Person) -> RepoResult<PersonId> {
        let display_name = normalize_required(person.display_name.as_str(), "display name")?;
        self.conn.execute(
            "INSERT INTO people (uuid, display_name, email, is_admin)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                person.uuid.to_string(),
                display_name,
                person.email.as_deref(),
                bool_to_int(person.is_admin),
            ],
        )?;
        Ok(person.uuid)
    }

    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }
        Ok(None)
    }

    fn list_people(&self) -> RepoResult<Vec<Person>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PERSON_SELECT_SQL} ORDER BY display_name COLLATE NOCASE ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut people = Vec::new();
        while let Some(row) = rows.next()? {
            people.push(parse_person_row(row)?);
        }
        Ok(people)
    }
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Person {
        uuid: parse_uuid(&uuid_text, "people.uuid")?,
        display_name: row.get("display_name")?,
        email: row.get("email")?,
        is_admin: parse_flag(row.get("is_admin")?, "people.is_admin")?,
    })
}
