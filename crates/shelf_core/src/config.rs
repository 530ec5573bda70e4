//! Store configuration consumed by session factories.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreLocation {
    /// SQLite database file, created on first use.
    File { path: PathBuf },
    /// Private in-memory database shared by the sessions of one factory.
    Memory,
}

/// Session factory settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// How long a blocked statement waits for a competing writer.
    pub busy_timeout_ms: u64,
    pub foreign_keys: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::Memory,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            foreign_keys: true,
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File { path: path.into() },
            ..Self::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Rejects settings SQLite would silently reinterpret.
    ///
    /// An empty path would open an anonymous temporary database, and a
    /// `file:` path would be parsed as a URI.
    pub fn validate(&self) -> Result<(), String> {
        if let StoreLocation::File { path } = &self.location {
            let text = path.to_string_lossy();
            if text.trim().is_empty() {
                return Err("store path cannot be empty".to_string());
            }
            if text.starts_with("file:") {
                return Err(format!("store path must be a filesystem path, got `{text}`"));
            }
        }
        Ok(())
    }
}
