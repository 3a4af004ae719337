//! Durable SQLite certificate store.

use super::schema;
use super::CertificateRepository;
use crate::error::PersistenceError;
use crate::models::{Certificate, CertificateId, CertificateStatus, SkillReference};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, instrument};

/// Certificate store backed by a SQLite database file.
///
/// All statements run on tokio's blocking pool. A started write always runs
/// to completion, even if the future awaiting it is dropped.
#[derive(Clone)]
pub struct SqliteCertificateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCertificateRepository {
    /// Open (or create) the database at `db_path` and migrate it.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or the schema cannot be migrated.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, PersistenceError> {
        let path = db_path.as_ref();
        info!("Opening certificate database at {:?}", path);
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory SQLite database.
    ///
    /// # Errors
    ///
    /// Fails if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self, PersistenceError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let from = schema::migrate(&mut conn)
            .map_err(|e| PersistenceError::storage(format!("schema migration failed: {e:#}")))?;
        debug!(from_version = from, "Certificate schema ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, PersistenceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, PersistenceError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)
        })
        .await
        .map_err(|e| PersistenceError::storage(format!("storage task failed: {e}")))?
    }
}

fn insert_certificate(conn: &mut Connection, cert: &Certificate) -> Result<(), PersistenceError> {
    let tx = conn.transaction()?;
    let id = cert.id.to_string();

    let inserted = tx.execute(
        "INSERT INTO certificates (id, subject, created_at) VALUES (?1, ?2, ?3)",
        params![
            id,
            cert.subject,
            cert.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true)
        ],
    );
    match inserted {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
            return Err(PersistenceError::Duplicate(cert.id));
        }
        Err(err) => return Err(err.into()),
    }

    {
        let mut stmt = tx.prepare(
            "INSERT INTO certificate_skills (certificate_id, position, skill_id, skill_name)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (position, skill) in cert.skills.iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| PersistenceError::storage("too many skills"))?;
            stmt.execute(params![id, position, skill.id, skill.name])?;
        }
    }

    // Dropping an uncommitted transaction rolls it back, so an early return
    // above leaves nothing behind.
    tx.commit()?;
    Ok(())
}

fn load_skills(conn: &Connection, id: &str) -> Result<Vec<SkillReference>, PersistenceError> {
    let mut stmt = conn.prepare_cached(
        "SELECT skill_id, skill_name FROM certificate_skills
         WHERE certificate_id = ?1 ORDER BY position",
    )?;
    let skills = stmt
        .query_map(params![id], |row| {
            Ok(SkillReference {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(skills)
}

fn decode_certificate(
    conn: &Connection,
    id: &str,
    subject: String,
    created_at: &str,
) -> Result<Certificate, PersistenceError> {
    let certificate_id: CertificateId = id
        .parse()
        .map_err(|e| PersistenceError::corrupt(format!("certificate id {id}: {e}")))?;
    let created_at = DateTime::parse_from_rfc3339(created_at)
        .map_err(|e| PersistenceError::corrupt(format!("created_at of {id}: {e}")))?
        .with_timezone(&Utc);

    Ok(Certificate {
        id: certificate_id,
        subject,
        skills: load_skills(conn, id)?,
        created_at,
        status: CertificateStatus::Persisted,
    })
}

#[async_trait]
impl CertificateRepository for SqliteCertificateRepository {
    #[instrument(skip(self, certificate), fields(certificate_id = %certificate.id))]
    async fn save(&self, certificate: Certificate) -> Result<Certificate, PersistenceError> {
        let stored = certificate.with_status(CertificateStatus::Persisted);
        let row = stored.clone();
        self.with_conn(move |conn| insert_certificate(conn, &row))
            .await?;
        Ok(stored)
    }

    async fn find_by_id(&self, id: CertificateId) -> Result<Certificate, PersistenceError> {
        self.with_conn(move |conn| {
            let key = id.to_string();
            let row: Option<(String, String)> = conn
                .query_row(
                    "SELECT subject, created_at FROM certificates WHERE id = ?1",
                    params![key],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let (subject, created_at) = row.ok_or(PersistenceError::NotFound(id))?;
            decode_certificate(conn, &key, subject, &created_at)
        })
        .await
    }

    async fn find_all(&self) -> Result<Vec<Certificate>, PersistenceError> {
        self.with_conn(|conn| {
            let rows = {
                let mut stmt = conn.prepare(
                    "SELECT id, subject, created_at FROM certificates ORDER BY created_at, rowid",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            };
            rows.into_iter()
                .map(|(id, subject, created_at)| decode_certificate(conn, &id, subject, &created_at))
                .collect()
        })
        .await
    }

    async fn count(&self) -> Result<usize, PersistenceError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT count(*) FROM certificates", [], |row| row.get(0))?;
            usize::try_from(count).map_err(|e| PersistenceError::corrupt(e.to_string()))
        })
        .await
    }
}
