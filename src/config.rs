//! Persisted settings in `~/.gatorconfig.json`.
//!
//! The file holds the database URL and the name of the user commands run as.
//! A missing or empty file yields defaults (a database next to the config
//! file, nobody logged in); the file is written on the first `login` or
//! `register`.
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error::ErrorKind;

pub const CONFIG_FILE_NAME: &str = ".gatorconfig.json";
const DEFAULT_DB_FILE_NAME: &str = ".gator.db";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HOME environment variable not set")]
    NoHomeDir,

    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON in config file: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid interval {input:?}: {reason}")]
    InvalidInterval { input: String, reason: &'static str },
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Config
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// `sqlite:` URL or plain path of the database file
    pub db_url: String,

    #[serde(default)]
    pub current_user_name: Option<String>,

    /// Where this config was read from and is written back to
    #[serde(skip)]
    path: PathBuf,
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// `$HOME/.gatorconfig.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = std::env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .ok_or(ConfigError::NoHomeDir)?;
        Ok(PathBuf::from(home).join(CONFIG_FILE_NAME))
    }

    /// Defaults for a config living at `path`: the database sits beside it.
    pub fn with_defaults(path: &Path) -> Self {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self {
            db_url: dir.join(DEFAULT_DB_FILE_NAME).to_string_lossy().into_owned(),
            current_user_name: None,
            path: path.to_path_buf(),
        }
    }

    /// Load the config from [`Config::default_path`].
    pub fn read() -> Result<Self, ConfigError> {
        Self::load(&Self::default_path()?)
    }

    /// Load configuration from a JSON file.
    ///
    /// - Missing file → `Ok(Config::with_defaults(path))`
    /// - Empty file → `Ok(Config::with_defaults(path))`
    /// - Invalid JSON or missing `db_url` → `Err(ConfigError::Json)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::with_defaults(path));
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read
                return Ok(Self::with_defaults(path));
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::with_defaults(path));
        }

        let mut config: Config = serde_json::from_str(&content)?;
        config.path = path.to_path_buf();
        // An empty name is how a fresh file spells "nobody"
        if config.current_user_name.as_deref() == Some("") {
            config.current_user_name = None;
        }
        tracing::debug!(path = %path.display(), db_url = %config.db_url, "Loaded configuration");
        Ok(config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Make `name` the current user and persist the change.
    pub fn set_user(&mut self, name: &str) -> Result<(), ConfigError> {
        self.current_user_name = Some(name.to_owned());
        self.write()
    }

    /// Write the config back to its file, atomically.
    pub fn write(&self) -> Result<(), ConfigError> {
        let mut content = serde_json::to_vec_pretty(self)?;
        content.push(b'\n');
        atomic_write(&self.path, &content)?;
        tracing::debug!(path = %self.path.display(), "Saved configuration");
        Ok(())
    }
}

/// Write-to-temp-then-rename, so readers never see a half-written config.
fn atomic_write(dst: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::time::{SystemTime, UNIX_EPOCH};

    // Unpredictable temp name; create_new refuses to follow a planted symlink
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = dst.with_extension(format!("tmp.{:016x}", random_suffix));

    let result = (|| -> std::io::Result<()> {
        let mut temp_file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;
        temp_file.write_all(content)?;
        temp_file.sync_all()?;
        drop(temp_file);

        // On Windows, rename fails if destination exists
        #[cfg(windows)]
        if dst.exists() {
            std::fs::remove_file(dst)?;
        }

        std::fs::rename(&temp_path, dst)
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    result
}

// ============================================================================
// Tests
// ============================================================================
