mod config;
pub mod database;
pub mod memory;

pub use config::{AudioConfig, Config, LoggingConfig, SessionConfig, StorageConfig};
pub use database::SqliteStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::error::{ConfigError, StorageError};

/// String/bool preferences under one namespace.
///
/// Implementations use interior mutability so a store can be shared by the
/// ledger, the completion recorder and the host at the same time.
pub trait KvStore {
    fn get_string(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn put_string(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Write several keys. Backends that can should make this atomic.
    fn put_strings(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.put_string(key, value)?;
        }
        Ok(())
    }

    /// `None` when the key is absent or does not hold a bool.
    fn get_bool(&self, key: &str) -> Result<Option<bool>, StorageError> {
        Ok(self
            .get_string(key)?
            .and_then(|value| value.parse::<bool>().ok()))
    }

    fn put_bool(&self, key: &str, value: bool) -> Result<(), StorageError> {
        self.put_string(key, if value { "true" } else { "false" })
    }
}

/// Returns `~/.config/seedling[-dev]/`.
///
/// `SEEDLING_DATA_DIR` overrides the location outright; otherwise
/// `SEEDLING_ENV=dev` selects the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("SEEDLING_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("SEEDLING_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("seedling-dev")
            } else {
                base_dir.join("seedling")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
