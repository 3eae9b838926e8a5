//! Local key/value storage for the session token.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

/// Storage key the bearer token is saved under.
pub const TOKEN_KEY: &str = "token";

/// Where the HTTP client reads the bearer token from.
///
/// Read on every request, so a login or logout takes effect on the next call.
pub trait CredentialStore: Send + Sync {
  fn token(&self) -> Option<String>;
  fn set_token(&self, token: &str);
  fn clear(&self);
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS local_storage (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// SQLite-backed key/value store, one file per user.
pub struct LocalStorage {
  conn: Mutex<Connection>,
}

impl LocalStorage {
  /// Open or create the store at the default location
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;
    Self::open_at(&path)
  }

  pub fn open_at(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create storage directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open storage at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  pub fn in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory storage: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(SCHEMA)
      .map_err(|e| eyre!("Failed to run storage migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Get the default database path
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("gymcrm").join("storage.db"))
  }

  fn conn(&self) -> MutexGuard<'_, Connection> {
    self.conn.lock().unwrap_or_else(|e| e.into_inner())
  }

  pub fn get_item(&self, key: &str) -> Result<Option<String>> {
    self
      .conn()
      .query_row(
        "SELECT value FROM local_storage WHERE key = ?1",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read {}: {}", key, e))
  }

  pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
    self
      .conn()
      .execute(
        "INSERT INTO local_storage (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value],
      )
      .map_err(|e| eyre!("Failed to write {}: {}", key, e))?;
    Ok(())
  }

  pub fn remove_item(&self, key: &str) -> Result<()> {
    self
      .conn()
      .execute("DELETE FROM local_storage WHERE key = ?1", params![key])
      .map_err(|e| eyre!("Failed to remove {}: {}", key, e))?;
    Ok(())
  }
}

impl CredentialStore for LocalStorage {
  fn token(&self) -> Option<String> {
    match self.get_item(TOKEN_KEY) {
      Ok(token) => token.filter(|t| !t.is_empty()),
      Err(e) => {
        warn!("{}", e);
        None
      }
    }
  }

  fn set_token(&self, token: &str) {
    if let Err(e) = self.set_item(TOKEN_KEY, token) {
      warn!("{}", e);
    }
  }

  fn clear(&self) {
    if let Err(e) = self.remove_item(TOKEN_KEY) {
      warn!("{}", e);
    }
  }
}

/// Process-local credentials, used for `--token` and in tests.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
  token: Mutex<Option<String>>,
}

impl MemoryCredentials {
  pub fn new(token: Option<String>) -> Self {
    Self {
      token: Mutex::new(token),
    }
  }

  fn slot(&self) -> MutexGuard<'_, Option<String>> {
    self.token.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl CredentialStore for MemoryCredentials {
  fn token(&self) -> Option<String> {
    self.slot().clone()
  }

  fn set_token(&self, token: &str) {
    *self.slot() = Some(token.to_string());
  }

  fn clear(&self) {
    *self.slot() = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_token_roundtrip() {
    let storage = LocalStorage::in_memory().unwrap();
    assert_eq!(storage.token(), None);

    storage.set_token("abc");
    assert_eq!(storage.token(), Some("abc".to_string()));

    storage.set_token("def");
    assert_eq!(storage.token(), Some("def".to_string()));

    storage.clear();
    assert_eq!(storage.token(), None);
  }

  #[test]
  fn test_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("storage.db");

    LocalStorage::open_at(&path).unwrap().set_token("persisted");

    let reopened = LocalStorage::open_at(&path).unwrap();
    assert_eq!(reopened.token(), Some("persisted".to_string()));
  }

  #[test]
  fn test_memory_credentials() {
    let creds = MemoryCredentials::new(None);
    assert_eq!(creds.token(), None);
    creds.set_token("t");
    assert_eq!(creds.token(), Some("t".to_string()));
    creds.clear();
    assert_eq!(creds.token(), None);
  }
}
