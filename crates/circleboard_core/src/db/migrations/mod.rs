//! Ordered schema migrations tracked in `PRAGMA user_version`.
//!
//! Versions only grow. An upgrade runs every pending script in one
//! transaction, so a failure leaves the previous version intact.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "people_circles_roles",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "tensions_meetings",
        sql: include_str!("0002_meetings.sql"),
    },
    Migration {
        version: 3,
        name: "vorhaben",
        sql: include_str!("0003_vorhaben.sql"),
    },
];

/// Schema version stored in a database versus the one this build expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaStatus {
    pub current: u32,
    pub latest: u32,
}

impl SchemaStatus {
    pub fn is_current(&self) -> bool {
        self.current == self.latest
    }
}

pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

pub fn schema_status(conn: &Connection) -> DbResult<SchemaStatus> {
    Ok(SchemaStatus {
        current: current_user_version(conn)?,
        latest: latest_version(),
    })
}

/// Brings `conn` up to [`latest_version`].
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let status = schema_status(conn)?;
    if status.current > status.latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: status.current,
            latest_supported: status.latest,
        });
    }
    if status.is_current() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > status.current) {
        tx.execute_batch(migration.sql)
            .and_then(|()| {
                tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            })
            .map_err(|source| DbError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            })?;
        info!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        status.current, status.latest
    );
    Ok(())
}

pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, schema_status, MIGRATIONS};
    use rusqlite::Connection;

    #[test]
    fn versions_increase_by_one() {
        for (index, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version as usize, index + 1);
        }
    }

    #[test]
    fn raw_connection_reports_pending_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        let before = schema_status(&conn).unwrap();
        assert_eq!(before.current, 0);
        assert!(!before.is_current());

        apply_migrations(&mut conn).unwrap();
        let after = schema_status(&conn).unwrap();
        assert_eq!(after.current, latest_version());
        assert!(after.is_current());
    }
}
