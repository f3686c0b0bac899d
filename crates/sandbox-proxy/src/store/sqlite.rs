use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, params};
use sandbox_protocol::{SandboxField, SandboxRecord};

use super::{ProfileStore, StoreError, StoreResult, User, session_verifier};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS sessions (
    verifier TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
);
CREATE TABLE IF NOT EXISTS user_meta (
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    meta_key TEXT NOT NULL,
    meta_value TEXT NOT NULL,
    PRIMARY KEY (user_id, meta_key)
);
";

/// Profile store backed by rusqlite (bundled SQLite).
pub struct SqliteProfileStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteProfileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteProfileStore").finish_non_exhaustive()
    }
}

impl SqliteProfileStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl ProfileStore for SqliteProfileStore {
    fn put_user(&self, email: &str) -> StoreResult<User> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (email) VALUES (?1) ON CONFLICT(email) DO NOTHING",
            params![email],
        )?;
        let id = conn.query_row(
            "SELECT id FROM users WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )?;
        Ok(User {
            id,
            email: email.to_string(),
        })
    }

    fn put_session(&self, token: &str, user_id: i64) -> StoreResult<()> {
        self.conn()?.execute(
            "INSERT INTO sessions (verifier, user_id) VALUES (?1, ?2)
             ON CONFLICT(verifier) DO UPDATE SET user_id = excluded.user_id",
            params![session_verifier(token), user_id],
        )?;
        Ok(())
    }

    fn user_for_session(&self, token: &str) -> StoreResult<Option<User>> {
        let user = self
            .conn()?
            .query_row(
                "SELECT users.id, users.email FROM sessions
                 JOIN users ON users.id = sessions.user_id
                 WHERE sessions.verifier = ?1",
                params![session_verifier(token)],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn put_sandbox(&self, user_id: i64, record: &SandboxRecord) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for (key, value) in record.meta_entries() {
            tx.execute(
                "INSERT INTO user_meta (user_id, meta_key, meta_value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id, meta_key) DO UPDATE SET meta_value = excluded.meta_value",
                params![user_id, key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn sandbox_meta(&self, user_id: i64) -> StoreResult<HashMap<String, String>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT meta_key, meta_value FROM user_meta WHERE user_id = ?1")?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut meta = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            if is_sandbox_key(&key) {
                meta.insert(key, value);
            }
        }
        Ok(meta)
    }

    fn delete_sandbox(&self, user_id: i64) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for key in SandboxField::all_meta_keys() {
            tx.execute(
                "DELETE FROM user_meta WHERE user_id = ?1 AND meta_key = ?2",
                params![user_id, key],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn is_sandbox_key(key: &str) -> bool {
    SandboxField::all_meta_keys().any(|k| k == key)
}
