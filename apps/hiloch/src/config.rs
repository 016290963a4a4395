//! # Host Configuration
//!
//! Loaded from `hiloch.toml` (path overridable with `--config`). Every section
//! and key is optional; a missing file means all defaults.
//!
//! ```toml
//! [course]
//! url = "https://hiloch100.co.il/course"
//! site_root = "https://hiloch100.co.il"
//!
//! [verification]
//! enabled = true
//! delay_ms = 3000
//!
//! [storage]
//! database = "hiloch.db"
//! backend = "redb"
//! ```

use clap::ValueEnum;
use hiloch_core::primitives::{DEFAULT_COURSE_URL, DEFAULT_SITE_ROOT, DEFAULT_VERIFICATION_DELAY_MS};
use hiloch_core::{CourseSession, GatePolicy, HilochError, Profile, StorageBackend};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "hiloch.toml";

/// Root of `hiloch.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub course: CourseConfig,

    #[serde(default)]
    pub verification: VerificationConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// `[course]`: where the embedded browser points.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CourseConfig {
    /// Page the browser opens on.
    #[serde(default = "default_course_url")]
    pub url: String,

    /// Root URL recognised as the home page.
    #[serde(default = "default_site_root")]
    pub site_root: String,
}

fn default_course_url() -> String {
    DEFAULT_COURSE_URL.to_string()
}

fn default_site_root() -> String {
    DEFAULT_SITE_ROOT.to_string()
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            url: default_course_url(),
            site_root: default_site_root(),
        }
    }
}

/// `[verification]`: the delayed re-check of course pages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_delay_ms() -> u64 {
    DEFAULT_VERIFICATION_DELAY_MS
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_ms: default_delay_ms(),
        }
    }
}

/// Storage backend choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Volatile, nothing survives the process.
    Memory,
    /// redb file on disk.
    #[default]
    Redb,
}

impl BackendKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::Redb => "redb",
        }
    }
}

/// `[storage]`: where the start date and expenses live.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default = "default_database")]
    pub database: PathBuf,

    #[serde(default)]
    pub backend: BackendKind,
}

fn default_database() -> PathBuf {
    PathBuf::from("hiloch.db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            backend: BackendKind::default(),
        }
    }
}

impl AppConfig {
    /// Parse a config document.
    pub fn from_toml(raw: &str) -> Result<Self, HilochError> {
        toml::from_str(raw).map_err(|e| HilochError::ConfigError(e.to_string()))
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, HilochError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            HilochError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&raw)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Apply command-line overrides on top of the file values.
    #[must_use]
    pub fn with_overrides(mut self, database: Option<PathBuf>, backend: Option<BackendKind>) -> Self {
        if let Some(database) = database {
            self.storage.database = database;
        }
        if let Some(backend) = backend {
            self.storage.backend = backend;
        }
        self
    }

    #[must_use]
    pub fn policy(&self) -> GatePolicy {
        GatePolicy::new(self.course.site_root.as_str())
    }

    /// A fresh browser session according to `[verification]`.
    #[must_use]
    pub fn session(&self) -> CourseSession {
        if self.verification.enabled {
            CourseSession::with_verification(
                self.policy(),
                Duration::from_millis(self.verification.delay_ms),
            )
        } else {
            CourseSession::new(self.policy())
        }
    }

    /// Open the configured store.
    pub fn open_profile(&self) -> Result<Profile, HilochError> {
        let backend = match self.storage.backend {
            BackendKind::Memory => StorageBackend::default(),
            BackendKind::Redb => StorageBackend::redb(&self.storage.database)?,
        };
        Ok(Profile::new(backend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = AppConfig::from_toml("").expect("parse");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.course.url, DEFAULT_COURSE_URL);
        assert!(!config.verification.enabled);
        assert_eq!(config.storage.backend, BackendKind::Redb);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [verification]
            enabled = true

            [storage]
            backend = "memory"
            "#,
        )
        .expect("parse");
        assert!(config.verification.enabled);
        assert_eq!(config.verification.delay_ms, DEFAULT_VERIFICATION_DELAY_MS);
        assert_eq!(config.storage.backend, BackendKind::Memory);
        assert_eq!(config.storage.database, PathBuf::from("hiloch.db"));
        assert_eq!(config.course.site_root, DEFAULT_SITE_ROOT);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = AppConfig::from_toml("[course]\nuri = \"x\"\n");
        assert!(matches!(result, Err(HilochError::ConfigError(_))));
    }

    #[test]
    fn overrides_win() {
        let config = AppConfig::default()
            .with_overrides(Some(PathBuf::from("other.db")), Some(BackendKind::Memory));
        assert_eq!(config.storage.database, PathBuf::from("other.db"));
        assert_eq!(config.storage.backend, BackendKind::Memory);

        let untouched = AppConfig::default().with_overrides(None, None);
        assert_eq!(untouched, AppConfig::default());
    }

    #[test]
    fn session_follows_verification_switch() {
        let mut config = AppConfig::default();
        assert!(!config.session().verifies_pages());
        config.verification.enabled = true;
        assert!(config.session().verifies_pages());
    }
}
