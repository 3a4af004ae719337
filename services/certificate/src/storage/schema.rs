//! SQLite schema for the certificate store.
//!
//! The schema version is tracked in `PRAGMA user_version`. Each entry in
//! [`MIGRATIONS`] upgrades the database by exactly one version.

use rusqlite::Connection;
use tracing::info;

/// Version 1 - certificates and their resolved skills
const V1: &str = "
CREATE TABLE certificates (
    id TEXT PRIMARY KEY NOT NULL,
    subject TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX idx_certificates_subject ON certificates(subject);
CREATE TABLE certificate_skills (
    certificate_id TEXT NOT NULL REFERENCES certificates(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    skill_id TEXT NOT NULL,
    skill_name TEXT NOT NULL,
    PRIMARY KEY (certificate_id, position)
);
";

/// Ordered migrations; index `n` upgrades from version `n` to `n + 1`.
pub const MIGRATIONS: &[&str] = &[V1];

/// Schema version this build expects.
#[must_use]
pub const fn current_version() -> i64 {
    MIGRATIONS.len() as i64
}

/// Read the stored schema version.
///
/// # Errors
///
/// Fails if the pragma cannot be read.
pub fn stored_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
}

/// Bring the database up to [`current_version`].
///
/// All pending migrations run in one transaction. Returns the version the
/// database was at before migrating.
///
/// # Errors
///
/// Fails if the database is newer than this build or a migration fails.
pub fn migrate(conn: &mut Connection) -> anyhow::Result<i64> {
    let from = stored_version(conn)?;
    let target = current_version();

    if from > target {
        anyhow::bail!("certificate database version {from} is newer than supported {target}");
    }
    if from == target {
        return Ok(from);
    }

    let tx = conn.transaction()?;
    for (index, sql) in MIGRATIONS.iter().enumerate().skip(usize::try_from(from)?) {
        info!(
            "Migrating certificate database from version {} to {}",
            index,
            index + 1
        );
        tx.execute_batch(sql)?;
    }
    tx.pragma_update(None, "user_version", target)?;
    tx.commit()?;
    Ok(from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_fresh_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(migrate(&mut conn).unwrap(), 0);
        assert_eq!(stored_version(&conn).unwrap(), current_version());

        let tables: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name LIKE 'certificate%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        assert_eq!(migrate(&mut conn).unwrap(), current_version());
    }

    #[test]
    fn test_newer_database_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", current_version() + 1)
            .unwrap();
        assert!(migrate(&mut conn).is_err());
    }
}
