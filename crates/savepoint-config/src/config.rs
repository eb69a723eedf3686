// crates/savepoint-config/src/config.rs
// ============================================================================
// Module: Savepoint Configuration
// Description: Configuration loading and validation for Savepoint.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: savepoint-core, savepoint-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path
//! limits. Autosave thresholds are validated against hard ranges before a
//! session can use them; the durable catalog path defaults to a file inside
//! the save root so a bare config still yields a complete deployment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use savepoint_core::AutosavePolicy;
use savepoint_core::DEFAULT_DEBOUNCE_SECS;
use savepoint_core::DEFAULT_KEEP_AUTOSAVES;
use savepoint_core::DEFAULT_MANUAL_GRACE_SECS;
use savepoint_core::DEFAULT_MINIMUM_PLAY_SECS;
use savepoint_core::DEFAULT_TIMER_INTERVAL_SECS;
use savepoint_store_sqlite::SqliteCatalogConfig;
use savepoint_store_sqlite::SqliteJournalMode;
use savepoint_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "savepoint.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "SAVEPOINT_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default catalog filename inside the save root.
const DEFAULT_CATALOG_NAME: &str = "catalog.sqlite";
/// Default busy timeout for the catalog (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Minimum allowed autosave timer interval in seconds.
pub(crate) const MIN_TIMER_INTERVAL_SECS: u64 = 10;
/// Maximum allowed autosave timer interval in seconds.
pub(crate) const MAX_TIMER_INTERVAL_SECS: u64 = 86_400;
/// Maximum allowed value for autosave threshold fields in seconds.
pub(crate) const MAX_THRESHOLD_SECS: u64 = 86_400;
/// Maximum allowed autosave retention ceiling.
pub(crate) const MAX_KEEP_AUTOSAVES: usize = 100;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Savepoint persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SavepointConfig {
    /// Root directory for save state artifacts.
    pub save_root: PathBuf,
    /// Metadata catalog configuration.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Autosave policy configuration.
    #[serde(default)]
    pub autosave: AutosaveConfig,
}

impl SavepointConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_component_path("save_root", &self.save_root)?;
        if self.save_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("save_root must be set".to_string()));
        }
        self.catalog.validate()?;
        self.autosave.validate()?;
        Ok(())
    }

    /// Returns the effective catalog configuration, defaulting the database
    /// path to a file inside the save root.
    #[must_use]
    pub fn catalog_config(&self) -> SqliteCatalogConfig {
        let path = self
            .catalog
            .path
            .clone()
            .unwrap_or_else(|| self.save_root.join(DEFAULT_CATALOG_NAME));
        SqliteCatalogConfig {
            path,
            busy_timeout_ms: self.catalog.busy_timeout_ms,
            journal_mode: self.catalog.journal_mode,
            sync_mode: self.catalog.sync_mode,
        }
    }
}

/// Metadata catalog configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// `SQLite` database path. Defaults to `catalog.sqlite` under the save
    /// root when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
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

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl CatalogConfig {
    /// Validates catalog configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_component_path("catalog.path", path)?;
        }
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "catalog.busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Autosave policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AutosaveConfig {
    /// Master switch for autosaving.
    #[serde(default = "default_autosave_enabled")]
    pub enabled: bool,
    /// Enable the periodic autosave timer. When disabled, autosaves still
    /// fire on lifecycle events such as backgrounding.
    #[serde(default = "default_timed_autosaves")]
    pub timed_autosaves: bool,
    /// Timer interval in seconds between periodic autosave attempts.
    #[serde(default = "default_timer_interval_secs")]
    pub timer_interval_secs: u64,
    /// Minimum elapsed play time in seconds before the first autosave.
    #[serde(default = "default_minimum_play_secs")]
    pub minimum_play_secs: u64,
    /// Minimum seconds between consecutive autosaves.
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,
    /// Seconds after a manual save during which autosaves are suppressed.
    #[serde(default = "default_manual_grace_secs")]
    pub manual_grace_secs: u64,
    /// Number of autosaves retained per game.
    #[serde(default = "default_keep_autosaves")]
    pub keep_autosaves: usize,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: default_autosave_enabled(),
            timed_autosaves: default_timed_autosaves(),
            timer_interval_secs: default_timer_interval_secs(),
            minimum_play_secs: default_minimum_play_secs(),
            debounce_secs: default_debounce_secs(),
            manual_grace_secs: default_manual_grace_secs(),
            keep_autosaves: default_keep_autosaves(),
        }
    }
}

impl AutosaveConfig {
    /// Validates autosave configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.timer_interval_secs < MIN_TIMER_INTERVAL_SECS
            || self.timer_interval_secs > MAX_TIMER_INTERVAL_SECS
        {
            return Err(ConfigError::Invalid(format!(
                "autosave.timer_interval_secs must be between {MIN_TIMER_INTERVAL_SECS} and \
                 {MAX_TIMER_INTERVAL_SECS}",
            )));
        }
        for (field, value) in [
            ("autosave.minimum_play_secs", self.minimum_play_secs),
            ("autosave.debounce_secs", self.debounce_secs),
            ("autosave.manual_grace_secs", self.manual_grace_secs),
        ] {
            if value > MAX_THRESHOLD_SECS {
                return Err(ConfigError::Invalid(format!(
                    "{field} must not exceed {MAX_THRESHOLD_SECS}"
                )));
            }
        }
        if self.keep_autosaves == 0 || self.keep_autosaves > MAX_KEEP_AUTOSAVES {
            return Err(ConfigError::Invalid(format!(
                "autosave.keep_autosaves must be between 1 and {MAX_KEEP_AUTOSAVES}"
            )));
        }
        Ok(())
    }

    /// Builds the runtime autosave policy from configured thresholds.
    #[must_use]
    pub fn to_policy(&self) -> AutosavePolicy {
        AutosavePolicy {
            minimum_play: Duration::from_secs(self.minimum_play_secs),
            debounce: Duration::from_secs(self.debounce_secs),
            manual_grace: Duration::from_secs(self.manual_grace_secs),
            keep_autosaves: self.keep_autosaves,
            timer_interval: Duration::from_secs(self.timer_interval_secs),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against safety limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path field against safety limits.
fn validate_component_path(field: &str, path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Returns the default busy timeout for the catalog.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default autosave master switch.
const fn default_autosave_enabled() -> bool {
    true
}

/// Returns the default timed-autosave switch.
const fn default_timed_autosaves() -> bool {
    true
}

/// Returns the default autosave timer interval.
const fn default_timer_interval_secs() -> u64 {
    DEFAULT_TIMER_INTERVAL_SECS
}

/// Returns the default minimum play time threshold.
const fn default_minimum_play_secs() -> u64 {
    DEFAULT_MINIMUM_PLAY_SECS
}

/// Returns the default autosave debounce threshold.
const fn default_debounce_secs() -> u64 {
    DEFAULT_DEBOUNCE_SECS
}

/// Returns the default manual save grace threshold.
const fn default_manual_grace_secs() -> u64 {
    DEFAULT_MANUAL_GRACE_SECS
}

/// Returns the default autosave retention ceiling.
const fn default_keep_autosaves() -> usize {
    DEFAULT_KEEP_AUTOSAVES
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("savepoint.toml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn minimal_config_uses_documented_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "save_root = \"/data/saves\"\n");
        let config = SavepointConfig::load(Some(&path)).unwrap();

        assert!(config.autosave.enabled);
        assert!(config.autosave.timed_autosaves);
        assert_eq!(config.autosave.timer_interval_secs, 600);
        assert_eq!(config.autosave.minimum_play_secs, 60);
        assert_eq!(config.autosave.debounce_secs, 60);
        assert_eq!(config.autosave.manual_grace_secs, 60);
        assert_eq!(config.autosave.keep_autosaves, 5);
        assert_eq!(
            config.catalog_config().path,
            PathBuf::from("/data/saves/catalog.sqlite")
        );
    }

    #[test]
    fn explicit_catalog_path_overrides_the_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "save_root = \"/data/saves\"\n[catalog]\npath = \"/data/meta.sqlite\"\n",
        );
        let config = SavepointConfig::load(Some(&path)).unwrap();
        assert_eq!(config.catalog_config().path, PathBuf::from("/data/meta.sqlite"));
    }

    #[test]
    fn policy_reflects_configured_thresholds() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "save_root = \"/data/saves\"\n[autosave]\nminimum_play_secs = 30\nkeep_autosaves = \
             3\n",
        );
        let config = SavepointConfig::load(Some(&path)).unwrap();
        let policy = config.autosave.to_policy();
        assert_eq!(policy.minimum_play, Duration::from_secs(30));
        assert_eq!(policy.keep_autosaves, 3);
        assert_eq!(policy.debounce, Duration::from_secs(60));
    }

    #[test]
    fn missing_save_root_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[autosave]\nenabled = true\n");
        assert!(matches!(
            SavepointConfig::load(Some(&path)),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_retention_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "save_root = \"/data/saves\"\n[autosave]\nkeep_autosaves = 0\n",
        );
        assert!(matches!(
            SavepointConfig::load(Some(&path)),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn out_of_range_timer_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "save_root = \"/data/saves\"\n[autosave]\ntimer_interval_secs = 1\n",
        );
        assert!(matches!(
            SavepointConfig::load(Some(&path)),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(SavepointConfig::load(Some(&path)), Err(ConfigError::Io(_))));
    }

    #[test]
    fn unknown_journal_mode_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "save_root = \"/data/saves\"\n[catalog]\njournal_mode = \"ring\"\n",
        );
        assert!(matches!(
            SavepointConfig::load(Some(&path)),
            Err(ConfigError::Parse(_))
        ));
    }
}
