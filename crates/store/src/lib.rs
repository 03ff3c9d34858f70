//! `sellercheck-store` — SQLite-backed cache for fetched ads.txt and
//! sellers.json documents.
//!
//! The engine never touches this crate; callers wire a [`DocumentStore`]
//! into provider implementations. Staleness is an explicit, caller-owned
//! TTL passed into every read — the store itself holds no policy.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use sellercheck_engine::FetchStatus;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    kind TEXT NOT NULL,        -- 'adstxt' or 'sellersjson'
    domain TEXT NOT NULL,      -- lowercased
    status TEXT NOT NULL,      -- terminal fetch status
    content TEXT NOT NULL,
    fetched_at TEXT NOT NULL,  -- RFC 3339, UTC
    PRIMARY KEY (kind, domain)
);
"#;

/// Which of the two supply-chain document families a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    AdsTxt,
    SellersJson,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AdsTxt => "adstxt",
            Self::SellersJson => "sellersjson",
        }
    }
}

/// A cached document row.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub status: FetchStatus,
    pub content: String,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum StoreError {
    Open(String),
    Query(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(msg) => write!(f, "cannot open cache: {msg}"),
            Self::Query(msg) => write!(f, "cache query error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

pub struct DocumentStore {
    conn: Connection,
}

impl DocumentStore {
    /// Open (creating if needed) the cache at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Open(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(|e| StoreError::Open(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Open(e.to_string()))?;
        Ok(Self { conn })
    }

    /// In-memory store, used by tests and `--offline` dry runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Open(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Default on-disk location: `<data dir>/sellercheck/cache.db`.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sellercheck")
            .join("cache.db")
    }

    /// Fetch a row younger than `ttl`. Missing and stale rows both come
    /// back as `None`; pass `Duration::MAX` to ignore age.
    pub fn get(
        &self,
        kind: DocumentKind,
        domain: &str,
        ttl: Duration,
    ) -> Result<Option<StoredDocument>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT status, content, fetched_at FROM documents WHERE kind = ?1 AND domain = ?2",
                params![kind.as_str(), domain.to_ascii_lowercase()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let (status, content, fetched_at) = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let status = FetchStatus::parse(&status)
            .ok_or_else(|| StoreError::Query(format!("unknown status '{status}'")))?;
        let fetched_at = DateTime::parse_from_rfc3339(&fetched_at)
            .map_err(|e| StoreError::Query(format!("bad fetched_at: {e}")))?
            .with_timezone(&Utc);

        if Utc::now() - fetched_at > ttl {
            return Ok(None);
        }

        Ok(Some(StoredDocument {
            status,
            content,
            fetched_at,
        }))
    }

    /// Insert or replace a row, stamped now.
    pub fn put(
        &self,
        kind: DocumentKind,
        domain: &str,
        status: FetchStatus,
        content: &str,
    ) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO documents (kind, domain, status, content, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    kind.as_str(),
                    domain.to_ascii_lowercase(),
                    status.as_str(),
                    content,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    /// Delete rows older than `ttl`. Returns how many were removed.
    pub fn purge_expired(&self, ttl: Duration) -> Result<usize, StoreError> {
        let cutoff = (Utc::now() - ttl).to_rfc3339();
        self.conn
            .execute("DELETE FROM documents WHERE fetched_at < ?1", params![cutoff])
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    /// Drop every cached row.
    pub fn clear(&self) -> Result<usize, StoreError> {
        self.conn
            .execute("DELETE FROM documents", [])
            .map_err(|e| StoreError::Query(e.to_string()))
    }
}
