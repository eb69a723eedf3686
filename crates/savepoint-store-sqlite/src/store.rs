// crates/savepoint-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Metadata Catalog
// Description: Durable SaveStateCatalog backed by SQLite WAL.
// Purpose: Persist save state and cheat records with transactional retention.
// Dependencies: savepoint-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`SaveStateCatalog`] using `SQLite`.
//! Save state records live in a flat table keyed by identifier and indexed
//! by game; cheats are keyed by `(game_id, code)` so re-applying a cheat
//! updates in place. Autosave retention deletes inside the transaction that
//! selected the victims, so a crash can never observe a half-pruned list.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use savepoint_core::CheatId;
use savepoint_core::CheatRecord;
use savepoint_core::CoreId;
use savepoint_core::GameId;
use savepoint_core::SaveStateId;
use savepoint_core::SaveStateRecord;
use savepoint_core::Timestamp;
use savepoint_core::interfaces::CatalogError;
use savepoint_core::interfaces::SaveStateCatalog;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the catalog.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` metadata catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteCatalogConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteCatalogConfig {
    /// Creates a configuration with defaults for the given database path.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` catalog errors.
#[derive(Debug, Error)]
pub enum SqliteCatalogError {
    /// Catalog I/O error.
    #[error("sqlite catalog io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite catalog db error: {0}")]
    Db(String),
    /// Catalog corruption.
    #[error("sqlite catalog corruption: {0}")]
    Corrupt(String),
    /// Catalog schema version mismatch.
    #[error("sqlite catalog version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid catalog data.
    #[error("sqlite catalog invalid data: {0}")]
    Invalid(String),
    /// Record not found for the given identifier.
    #[error("sqlite catalog record not found: {0}")]
    NotFound(String),
}

impl From<SqliteCatalogError> for CatalogError {
    fn from(error: SqliteCatalogError) -> Self {
        match error {
            SqliteCatalogError::Io(message) | SqliteCatalogError::Db(message) => {
                Self::Write(message)
            }
            SqliteCatalogError::Corrupt(message) => Self::Corrupt(message),
            SqliteCatalogError::VersionMismatch(message)
            | SqliteCatalogError::Invalid(message) => Self::Invalid(message),
            SqliteCatalogError::NotFound(message) => Self::NotFound(message),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// `SQLite`-backed metadata catalog with WAL support.
#[derive(Clone)]
pub struct SqliteCatalog {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteCatalog {
    /// Opens an `SQLite`-backed metadata catalog.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteCatalogError`] when the database cannot be opened or
    /// its schema version is unsupported.
    pub fn new(config: SqliteCatalogConfig) -> Result<Self, SqliteCatalogError> {
        validate_catalog_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Runs `body` inside one transaction on the shared connection.
    fn with_transaction<T>(
        &self,
        body: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T, SqliteCatalogError>,
    ) -> Result<T, SqliteCatalogError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| SqliteCatalogError::Db("mutex poisoned".to_string()))?;
        let tx = guard.transaction().map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
        let value = body(&tx)?;
        tx.commit().map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
        drop(guard);
        Ok(value)
    }
}

impl SaveStateCatalog for SqliteCatalog {
    fn insert_save_state(&self, record: &SaveStateRecord) -> Result<(), CatalogError> {
        self.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO save_states (id, game_id, core_id, blob_path, image_path, \
                 is_autosave, created_at, last_opened, core_version) VALUES (?1, ?2, ?3, ?4, ?5, \
                 ?6, ?7, ?8, ?9)",
                params![
                    record.id.as_str(),
                    record.game_id.as_str(),
                    record.core_id.as_str(),
                    path_text(&record.blob_path)?,
                    record.image_path.as_deref().map(path_text).transpose()?,
                    i64::from(record.is_autosave),
                    record.created_at.as_unix_millis(),
                    record.last_opened.map(Timestamp::as_unix_millis),
                    record.created_with_core_version,
                ],
            )
            .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
            Ok(())
        })
        .map_err(CatalogError::from)
    }

    fn save_state(&self, id: &SaveStateId) -> Result<Option<SaveStateRecord>, CatalogError> {
        self.with_transaction(|tx| {
            tx.query_row(
                &format!("{SAVE_STATE_SELECT} WHERE id = ?1"),
                params![id.as_str()],
                save_state_from_row,
            )
            .optional()
            .map_err(|err| SqliteCatalogError::Db(err.to_string()))
        })
        .map_err(CatalogError::from)
    }

    fn update_last_opened(&self, id: &SaveStateId, at: Timestamp) -> Result<(), CatalogError> {
        self.with_transaction(|tx| {
            let updated = tx
                .execute(
                    "UPDATE save_states SET last_opened = ?2 WHERE id = ?1",
                    params![id.as_str(), at.as_unix_millis()],
                )
                .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
            if updated == 0 {
                return Err(SqliteCatalogError::NotFound(id.as_str().to_string()));
            }
            Ok(())
        })
        .map_err(CatalogError::from)
    }

    fn delete_save_state(
        &self,
        id: &SaveStateId,
    ) -> Result<Option<SaveStateRecord>, CatalogError> {
        self.with_transaction(|tx| {
            let record = tx
                .query_row(
                    &format!("{SAVE_STATE_SELECT} WHERE id = ?1"),
                    params![id.as_str()],
                    save_state_from_row,
                )
                .optional()
                .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
            if record.is_some() {
                tx.execute("DELETE FROM save_states WHERE id = ?1", params![id.as_str()])
                    .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
            }
            Ok(record)
        })
        .map_err(|err| CatalogError::Delete(err.to_string()))
    }

    fn list_save_states(&self, game: &GameId) -> Result<Vec<SaveStateRecord>, CatalogError> {
        self.with_transaction(|tx| {
            let mut statement = tx
                .prepare(&format!(
                    "{SAVE_STATE_SELECT} WHERE game_id = ?1 ORDER BY created_at DESC, id DESC"
                ))
                .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
            let rows = statement
                .query_map(params![game.as_str()], save_state_from_row)
                .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|err| SqliteCatalogError::Db(err.to_string()))
        })
        .map_err(CatalogError::from)
    }

    fn prune_autosaves(
        &self,
        game: &GameId,
        keep: usize,
    ) -> Result<Vec<SaveStateRecord>, CatalogError> {
        self.with_transaction(|tx| {
            let mut statement = tx
                .prepare(&format!(
                    "{SAVE_STATE_SELECT} WHERE game_id = ?1 AND is_autosave = 1 ORDER BY \
                     created_at DESC, id DESC"
                ))
                .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
            let autosaves = statement
                .query_map(params![game.as_str()], save_state_from_row)
                .map_err(|err| SqliteCatalogError::Db(err.to_string()))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
            drop(statement);
            if autosaves.len() <= keep {
                return Ok(Vec::new());
            }
            let mut removed: Vec<SaveStateRecord> = autosaves.into_iter().skip(keep).collect();
            removed.reverse();
            for record in &removed {
                tx.execute("DELETE FROM save_states WHERE id = ?1", params![record.id.as_str()])
                    .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
            }
            Ok(removed)
        })
        .map_err(|err| CatalogError::Delete(err.to_string()))
    }

    fn upsert_cheat(&self, record: &CheatRecord) -> Result<CheatId, CatalogError> {
        self.with_transaction(|tx| {
            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM cheats WHERE game_id = ?1 AND code = ?2",
                    params![record.game_id.as_str(), record.code],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
            if let Some(id) = existing {
                tx.execute(
                    "UPDATE cheats SET core_id = ?2, kind = ?3, enabled = ?4, state_path = ?5 \
                     WHERE id = ?1",
                    params![
                        id,
                        record.core_id.as_str(),
                        record.kind,
                        i64::from(record.enabled),
                        record.state_path.as_deref().map(path_text).transpose()?,
                    ],
                )
                .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
                return Ok(CheatId::new(id));
            }
            tx.execute(
                "INSERT INTO cheats (id, game_id, core_id, code, kind, enabled, state_path) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id.as_str(),
                    record.game_id.as_str(),
                    record.core_id.as_str(),
                    record.code,
                    record.kind,
                    i64::from(record.enabled),
                    record.state_path.as_deref().map(path_text).transpose()?,
                ],
            )
            .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
            Ok(record.id.clone())
        })
        .map_err(CatalogError::from)
    }

    fn list_cheats(&self, game: &GameId) -> Result<Vec<CheatRecord>, CatalogError> {
        self.with_transaction(|tx| {
            let mut statement = tx
                .prepare(
                    "SELECT id, game_id, core_id, code, kind, enabled, state_path FROM cheats \
                     WHERE game_id = ?1 ORDER BY id ASC",
                )
                .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
            let rows = statement
                .query_map(params![game.as_str()], cheat_from_row)
                .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|err| SqliteCatalogError::Db(err.to_string()))
        })
        .map_err(CatalogError::from)
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Shared column list for save state queries.
const SAVE_STATE_SELECT: &str = "SELECT id, game_id, core_id, blob_path, image_path, \
                                 is_autosave, created_at, last_opened, core_version FROM \
                                 save_states";

/// Maps a `save_states` row into a record.
fn save_state_from_row(row: &Row<'_>) -> Result<SaveStateRecord, rusqlite::Error> {
    let blob_path: String = row.get(3)?;
    let image_path: Option<String> = row.get(4)?;
    let is_autosave: i64 = row.get(5)?;
    let created_at: i64 = row.get(6)?;
    let last_opened: Option<i64> = row.get(7)?;
    Ok(SaveStateRecord {
        id: SaveStateId::new(row.get::<_, String>(0)?),
        game_id: GameId::new(row.get::<_, String>(1)?),
        core_id: CoreId::new(row.get::<_, String>(2)?),
        blob_path: PathBuf::from(blob_path),
        image_path: image_path.map(PathBuf::from),
        is_autosave: is_autosave != 0,
        created_at: Timestamp::from_unix_millis(created_at),
        last_opened: last_opened.map(Timestamp::from_unix_millis),
        created_with_core_version: row.get(8)?,
    })
}

/// Maps a `cheats` row into a record.
fn cheat_from_row(row: &Row<'_>) -> Result<CheatRecord, rusqlite::Error> {
    let enabled: i64 = row.get(5)?;
    let state_path: Option<String> = row.get(6)?;
    Ok(CheatRecord {
        id: CheatId::new(row.get::<_, String>(0)?),
        game_id: GameId::new(row.get::<_, String>(1)?),
        core_id: CoreId::new(row.get::<_, String>(2)?),
        code: row.get(3)?,
        kind: row.get(4)?,
        enabled: enabled != 0,
        state_path: state_path.map(PathBuf::from),
    })
}

/// Converts a path to its stored text form, rejecting non-UTF-8 paths.
fn path_text(path: &Path) -> Result<String, SqliteCatalogError> {
    path.to_str().map(str::to_owned).ok_or_else(|| {
        SqliteCatalogError::Invalid(format!("path is not valid UTF-8: {}", path.display()))
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the catalog exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteCatalogError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteCatalogError::Io("catalog path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteCatalogError::Io(err.to_string()))
}

/// Validates catalog paths for safety limits.
fn validate_catalog_path(path: &Path) -> Result<(), SqliteCatalogError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteCatalogError::Invalid("catalog path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteCatalogError::Invalid(
                "catalog path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteCatalogError::Invalid(
            "catalog path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteCatalogConfig) -> Result<Connection, SqliteCatalogError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteCatalogConfig,
) -> Result<(), SqliteCatalogError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteCatalogError> {
    let tx = connection.transaction().map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS save_states (
                    id TEXT PRIMARY KEY,
                    game_id TEXT NOT NULL,
                    core_id TEXT NOT NULL,
                    blob_path TEXT NOT NULL,
                    image_path TEXT,
                    is_autosave INTEGER NOT NULL,
                    created_at INTEGER NOT NULL,
                    last_opened INTEGER,
                    core_version TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_save_states_game_id
                    ON save_states (game_id, created_at);
                CREATE TABLE IF NOT EXISTS cheats (
                    id TEXT PRIMARY KEY,
                    game_id TEXT NOT NULL,
                    core_id TEXT NOT NULL,
                    code TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    enabled INTEGER NOT NULL,
                    state_path TEXT,
                    UNIQUE (game_id, code)
                );
                CREATE INDEX IF NOT EXISTS idx_cheats_game_id ON cheats (game_id);",
            )
            .map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteCatalogError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteCatalogError::Db(err.to_string()))?;
    Ok(())
}
