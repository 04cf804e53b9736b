//! Record Store - SQLite persistence for mirrored stars
//!
//! Records accepted during a sync are staged in memory and written in a single
//! transaction per account. Lookups see both staged and committed rows, so
//! duplicate checks cover in-flight work as well as earlier runs.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::model::{parse_pushed_at, StarRecord};

const COLUMNS: &str =
    "starred_by, repo_id, stars, pushed_at, repo_name, repo_url, description, language";

/// Where the store lives, parsed from a connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseUrl {
    Memory,
    File(PathBuf),
}

impl DatabaseUrl {
    /// Parse `sqlite:///relative.db`, `sqlite:////abs.db`, `sqlite::memory:` or a bare path
    pub fn parse(url: &str) -> Result<Self, StoreError> {
        let rest = if let Some(rest) = url.strip_prefix("sqlite://") {
            // sqlite:///x.db is relative, sqlite:////x.db is absolute
            rest.strip_prefix('/').unwrap_or(rest)
        } else if let Some(rest) = url.strip_prefix("sqlite:") {
            rest
        } else if url.contains("://") {
            return Err(StoreError::UnsupportedUrl(url.to_string()));
        } else {
            url
        };

        match rest {
            "" | ":memory:" => Ok(DatabaseUrl::Memory),
            path => Ok(DatabaseUrl::File(PathBuf::from(path))),
        }
    }
}

/// Columns the store can be ordered by
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SortColumn {
    StarredBy,
    RepoId,
    #[default]
    Stars,
    PushedAt,
    RepoName,
    RepoUrl,
    Description,
    Language,
}

impl SortColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::StarredBy => "starred_by",
            SortColumn::RepoId => "repo_id",
            SortColumn::Stars => "stars",
            SortColumn::PushedAt => "pushed_at",
            SortColumn::RepoName => "repo_name",
            SortColumn::RepoUrl => "repo_url",
            SortColumn::Description => "description",
            SortColumn::Language => "language",
        }
    }
}

/// Whether a looked-up record is still in flight or already durable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    Staged,
    Committed,
}

#[derive(Debug, Clone)]
pub struct TrackedStar {
    pub record: StarRecord,
    pub state: RecordState,
}

/// Star database with an uncommitted staging area
pub struct StarStore {
    conn: Connection,
    staged: Vec<StarRecord>,
    staged_index: HashMap<i64, usize>,
}

impl StarStore {
    /// Open or create the store behind a connection string
    pub fn open(url: &str) -> Result<Self, StoreError> {
        match DatabaseUrl::parse(url)? {
            DatabaseUrl::Memory => Self::open_in_memory(),
            DatabaseUrl::File(path) => Self::open_at(path),
        }
    }

    /// Open or create the store at a specific path
    pub fn open_at(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(&path)?;
        let store = Self::with_connection(conn)?;

        info!("Star database opened at {}", path.display());
        Ok(store)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS stars (
                starred_by TEXT,
                repo_id INTEGER PRIMARY KEY,
                stars INTEGER,
                pushed_at TEXT,
                repo_name TEXT,
                repo_url TEXT,
                description TEXT,
                language TEXT
            );
            "#,
        )?;

        debug!("Database schema initialized");
        Ok(Self {
            conn,
            staged: Vec::new(),
            staged_index: HashMap::new(),
        })
    }

    // =========================================================================
    // Staging
    // =========================================================================

    /// Stage a record for the next commit
    pub fn insert(&mut self, record: StarRecord) -> Result<(), StoreError> {
        if let Some(existing) = self.find_by_repo_id(record.repo_id)? {
            return Err(if existing.record.starred_by == record.starred_by {
                StoreError::Conflict {
                    repo_id: record.repo_id,
                    starred_by: record.starred_by,
                }
            } else {
                StoreError::AlreadyTracked {
                    repo_id: record.repo_id,
                    tracked_by: existing.record.starred_by,
                }
            });
        }

        self.staged_index.insert(record.repo_id, self.staged.len());
        self.staged.push(record);
        Ok(())
    }

    /// Look a repository up among staged and committed rows
    pub fn find_by_repo_id(&self, repo_id: i64) -> Result<Option<TrackedStar>, StoreError> {
        if let Some(&idx) = self.staged_index.get(&repo_id) {
            return Ok(Some(TrackedStar {
                record: self.staged[idx].clone(),
                state: RecordState::Staged,
            }));
        }

        let committed = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM stars WHERE repo_id = ?1"),
                params![repo_id],
                row_to_record,
            )
            .optional()?;

        Ok(committed.map(|record| TrackedStar {
            record,
            state: RecordState::Committed,
        }))
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Durably write every staged record in one transaction
    ///
    /// The staging area is emptied whether or not the write succeeds.
    pub fn commit(&mut self) -> Result<usize, StoreError> {
        let staged = std::mem::take(&mut self.staged);
        self.staged_index.clear();

        if staged.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO stars ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ))?;

            for record in &staged {
                stmt.execute(params![
                    record.starred_by,
                    record.repo_id,
                    record.stars,
                    record.pushed_at_string(),
                    record.repo_name,
                    record.repo_url,
                    record.description,
                    record.language,
                ])?;
            }
        }
        tx.commit()?;

        debug!("Committed {} staged stars", staged.len());
        Ok(staged.len())
    }

    /// Drop staged records without writing them
    pub fn rollback(&mut self) -> usize {
        let dropped = self.staged.len();
        self.staged.clear();
        self.staged_index.clear();
        if dropped > 0 {
            debug!("Discarded {} staged stars", dropped);
        }
        dropped
    }

    // =========================================================================
    // Read access
    // =========================================================================

    /// Number of committed records
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM stars", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// All committed records by repository id
    pub fn all(&self) -> Result<Vec<StarRecord>, StoreError> {
        self.select(&format!("SELECT {COLUMNS} FROM stars ORDER BY repo_id ASC"))
    }

    /// Committed records ordered by a column, ties broken by repository id
    pub fn query(
        &self,
        order_by: SortColumn,
        descending: bool,
    ) -> Result<Vec<StarRecord>, StoreError> {
        let direction = if descending { "DESC" } else { "ASC" };
        self.select(&format!(
            "SELECT {COLUMNS} FROM stars ORDER BY {} {direction}, repo_id ASC",
            order_by.as_str()
        ))
    }

    fn select(&self, sql: &str) -> Result<Vec<StarRecord>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let records = stmt
            .query_map([], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<(), StoreError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<StarRecord> {
    let pushed_at: String = row.get(3)?;
    let pushed_at: DateTime<Utc> = parse_pushed_at(&pushed_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(StarRecord {
        starred_by: row.get(0)?,
        repo_id: row.get(1)?,
        stars: row.get(2)?,
        pushed_at,
        repo_name: row.get(4)?,
        repo_url: row.get(5)?,
        description: row.get(6)?,
        language: row.get(7)?,
    })
}
