//! SQLite-backed preference store.
//!
//! All namespaces share one `prefs` table; a [`SqliteStore`] handle only
//! ever sees rows of its own namespace.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection};

use super::{data_dir, KvStore};
use crate::error::{CoreError, StorageError};

/// Cloneable handle over a single SQLite connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    namespace: String,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open the store at `~/.config/seedling/seedling.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the
    /// database cannot be opened or migrated.
    pub fn open(namespace: &str) -> Result<Self, CoreError> {
        let path = data_dir()?.join("seedling.db");
        Ok(Self::open_at(&path, namespace)?)
    }

    /// Open (or create) the store at an explicit path.
    pub fn open_at(path: &Path, namespace: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn, namespace)
    }

    /// Open an in-memory database.
    pub fn open_memory(namespace: &str) -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, namespace)
    }

    fn with_connection(conn: Connection, namespace: &str) -> Result<Self, StorageError> {
        migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            namespace: namespace.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, rusqlite::Error>,
    ) -> Result<T, StorageError> {
        let mut conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        f(&mut conn).map_err(StorageError::from)
    }
}

fn migrate(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS prefs (
            namespace TEXT NOT NULL,
            key       TEXT NOT NULL,
            value     TEXT NOT NULL,
            PRIMARY KEY (namespace, key)
        );",
    )
}

impl KvStore for SqliteStore {
    fn get_string(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT value FROM prefs WHERE namespace = ?1 AND key = ?2")?;
            match stmt.query_row(params![self.namespace, key], |row| row.get::<_, String>(0)) {
                Ok(v) => Ok(Some(v)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
    }

    fn put_string(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO prefs (namespace, key, value) VALUES (?1, ?2, ?3)",
                params![self.namespace, key, value],
            )?;
            Ok(())
        })
    }

    fn put_strings(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            for (key, value) in entries {
                tx.execute(
                    "INSERT OR REPLACE INTO prefs (namespace, key, value) VALUES (?1, ?2, ?3)",
                    params![self.namespace, key, value],
                )?;
            }
            tx.commit()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let store = SqliteStore::open_memory("focus_data").unwrap();
        assert!(store.get_string("test").unwrap().is_none());
        store.put_string("test", "hello").unwrap();
        assert_eq!(store.get_string("test").unwrap().unwrap(), "hello");
        store.put_string("test", "again").unwrap();
        assert_eq!(store.get_string("test").unwrap().unwrap(), "again");
    }

    #[test]
    fn bools_round_through_strings() {
        let store = SqliteStore::open_memory("focus_data").unwrap();
        assert_eq!(store.get_bool("first_opened").unwrap(), None);
        store.put_bool("first_opened", false).unwrap();
        assert_eq!(store.get_bool("first_opened").unwrap(), Some(false));
        store.put_string("first_opened", "maybe").unwrap();
        assert_eq!(store.get_bool("first_opened").unwrap(), None);
    }

    #[test]
    fn namespaces_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.db");
        let focus = SqliteStore::open_at(&path, "focus_data").unwrap();
        let other = SqliteStore::open_at(&path, "other").unwrap();

        focus.put_string("stored_date", "19-10-2026").unwrap();
        assert!(other.get_string("stored_date").unwrap().is_none());
        assert_eq!(focus.namespace(), "focus_data");
    }

    #[test]
    fn batch_write_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.db");
        {
            let store = SqliteStore::open_at(&path, "focus_data").unwrap();
            store
                .put_strings(&[("a", "1"), ("b", "2")])
                .unwrap();
        }
        let store = SqliteStore::open_at(&path, "focus_data").unwrap();
        assert_eq!(store.get_string("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get_string("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn open_at_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("prefs.db");
        let err = SqliteStore::open_at(&path, "focus_data").unwrap_err();
        assert!(matches!(err, StorageError::OpenFailed { .. }));
    }
}
