//! SQLite-backed record store, persistent across process restarts.
//!
//! `agents` holds one row per identity key with the card as JSON text and a
//! precomputed version sort key; `UNIQUE(name, version)` makes insert the
//! atomic primitive publication relies on. `agent_skills` is the skill
//! search index.

use crate::card::{Fingerprint, IdentityKey, RecordId, RecordStatus};
use crate::registry::StoredAgentRecord;
use crate::registry::store::{RecordQuery, RecordStore, StoreError};
use crate::registry::version_order::version_sort_key;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, ffi, params, params_from_iter};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS agents (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    version TEXT NOT NULL,
    version_key TEXT NOT NULL,
    owner TEXT NOT NULL,
    published_at TEXT NOT NULL,
    status TEXT NOT NULL,
    fingerprint TEXT NOT NULL,
    card TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS uniq_name_version ON agents (name, version);
CREATE INDEX IF NOT EXISTS idx_agents_order ON agents (name, version_key);
CREATE TABLE IF NOT EXISTS agent_skills (
    skill_id TEXT NOT NULL,
    agent_id TEXT NOT NULL REFERENCES agents (id) ON DELETE CASCADE,
    PRIMARY KEY (skill_id, agent_id)
) WITHOUT ROWID;
"#;

const RECORD_COLUMNS: &str =
    "a.id, a.owner, a.published_at, a.status, a.fingerprint, a.card";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and bootstrap its indexes.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let store = Self::from_connection(Connection::open(path)?)?;
        tracing::debug!(path = %path.display(), "opened sqlite record store");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_indexes()?;
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RecordStore for SqliteStore {
    fn ensure_indexes(&self) -> Result<(), StoreError> {
        self.lock().execute_batch(SCHEMA)?;
        Ok(())
    }

    fn insert(&self, record: &StoredAgentRecord) -> Result<(), StoreError> {
        let card = serde_json::to_string(&record.card)?;
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            "INSERT INTO agents \
             (id, name, version, version_key, owner, published_at, status, fingerprint, card) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.id.0,
                record.card.name,
                record.card.version,
                version_sort_key(&record.card.version),
                record.owner,
                format_timestamp(&record.published_at),
                record.status.as_str(),
                record.fingerprint.as_str(),
                card,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(StoreError::DuplicateKey(record.card.identity()));
            }
            Err(err) => return Err(err.into()),
        }

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO agent_skills (skill_id, agent_id) VALUES (?1, ?2)",
            )?;
            for skill in record.card.skill_ids() {
                stmt.execute(params![skill.0, record.id.0])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn find_by_key(&self, key: &IdentityKey) -> Result<Option<StoredAgentRecord>, StoreError> {
        let conn = self.lock();
        let row = conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM agents a WHERE a.name = ?1 AND a.version = ?2"),
                params![key.name, key.version],
                RawRecord::from_row,
            )
            .optional()?;
        drop(conn);
        row.map(RawRecord::decode).transpose()
    }

    fn query(&self, query: &RecordQuery) -> Result<Vec<StoredAgentRecord>, StoreError> {
        let mut sql = format!("SELECT {RECORD_COLUMNS} FROM agents a");
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();

        if let Some(skill) = &query.skill {
            sql.push_str(" JOIN agent_skills s ON s.agent_id = a.id");
            values.push(SqlValue::Text(skill.0.clone()));
            clauses.push(format!("s.skill_id = ?{}", values.len()));
        }
        if let Some(name) = &query.name {
            values.push(SqlValue::Text(name.clone()));
            clauses.push(format!("a.name = ?{}", values.len()));
        }
        if let Some(owner) = &query.filter.owner {
            values.push(SqlValue::Text(owner.clone()));
            clauses.push(format!("a.owner = ?{}", values.len()));
        }
        if let Some(status) = query.filter.status {
            values.push(SqlValue::Text(status.as_str().to_string()));
            clauses.push(format!("a.status = ?{}", values.len()));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        values.push(SqlValue::Integer(to_sql_int(query.page.limit)));
        let limit_param = values.len();
        values.push(SqlValue::Integer(to_sql_int(query.page.offset)));
        let offset_param = values.len();
        sql.push_str(&format!(
            " ORDER BY a.name ASC, a.version_key DESC, a.version DESC \
             LIMIT ?{limit_param} OFFSET ?{offset_param}"
        ));

        let conn = self.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), RawRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        rows.into_iter().map(RawRecord::decode).collect()
    }
}

/// Columns as read, before JSON and timestamp decoding.
struct RawRecord {
    id: String,
    owner: String,
    published_at: String,
    status: String,
    fingerprint: String,
    card: String,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            published_at: row.get(2)?,
            status: row.get(3)?,
            fingerprint: row.get(4)?,
            card: row.get(5)?,
        })
    }

    fn decode(self) -> Result<StoredAgentRecord, StoreError> {
        let corrupt = |detail: String| StoreError::Corrupt {
            id: self.id.clone(),
            detail,
        };
        let card = serde_json::from_str(&self.card)
            .map_err(|err| corrupt(format!("card: {err}")))?;
        let published_at = DateTime::parse_from_rfc3339(&self.published_at)
            .map_err(|err| corrupt(format!("published_at: {err}")))?
            .with_timezone(&Utc);
        let status = RecordStatus::parse(&self.status)
            .ok_or_else(|| corrupt(format!("unknown status {:?}", self.status)))?;
        Ok(StoredAgentRecord {
            id: RecordId(self.id),
            card,
            owner: self.owner,
            published_at,
            status,
            fingerprint: Fingerprint(self.fingerprint),
        })
    }
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn to_sql_int(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
