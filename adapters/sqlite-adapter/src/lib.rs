//! sqlite-adapter — SQLite implementation of the `FriendRepository` port.
//!
//! Purpose
//! - The "managed" storage variant: the SQL engine owns key generation,
//!   indexing and durability, this crate only maps rows to domain types.
//! - Opening is idempotent. The schema is created inside an immediate
//!   transaction and stamped into `PRAGMA user_version`.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - `AUTOINCREMENT` keeps ids from being reused after deletes.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use domain::{CoreError, Friend, FriendId, FriendRepository, NewFriend, SCHEMA_VERSION};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};
use tracing::{debug, info};

/// Default wait on a locked database before a call fails.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed friends repository.
pub struct SqliteFriendRepo {
    conn: Mutex<Connection>,
}

impl SqliteFriendRepo {
    /// Open (or create) a SQLite database at the given path and ensure schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        Self::open_with_busy_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Like [`SqliteFriendRepo::open`] with an explicit lock wait bound.
    pub fn open_with_busy_timeout<P: AsRef<Path>>(
        path: P,
        busy_timeout: Duration,
    ) -> Result<Self, CoreError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| {
                CoreError::StorageUnavailable(format!("cannot create {}: {e}", dir.display()))
            })?;
        }
        let mut conn = Connection::open(path).map_err(map_open_err)?;
        conn.busy_timeout(busy_timeout).map_err(map_open_err)?;
        init_schema(&mut conn)?;
        info!(path = %path.display(), "sqlite friends store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // `on_poison` picks the read or write flavour of the error.
    fn lock(
        &self,
        on_poison: fn(String) -> CoreError,
    ) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.conn.lock().map_err(|_| on_poison("mutex poisoned".into()))
    }
}

fn init_schema(conn: &mut Connection) -> Result<(), CoreError> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(map_open_err)?;
    let found: u32 = tx
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(map_open_err)?;
    if found > SCHEMA_VERSION {
        return Err(CoreError::StorageUnavailable(format!(
            "database schema version {found} is newer than supported version {SCHEMA_VERSION}"
        )));
    }
    if found < SCHEMA_VERSION {
        debug!(from = found, to = SCHEMA_VERSION, "creating friends schema");
        tx.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS friends (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                age INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_friends_name ON friends(name);
            CREATE INDEX IF NOT EXISTS idx_friends_age ON friends(age);
            "#,
        )
        .map_err(map_open_err)?;
        tx.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(map_open_err)?;
    }
    tx.commit().map_err(map_open_err)
}

// Faults meaning the environment will not give us a usable database at all.
fn is_unavailable(e: &rusqlite::Error) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(err, _) => matches!(
            err.code,
            ErrorCode::CannotOpen
                | ErrorCode::ReadOnly
                | ErrorCode::PermissionDenied
                | ErrorCode::NotADatabase
                | ErrorCode::DiskFull
        ),
        _ => false,
    }
}

fn map_open_err(e: rusqlite::Error) -> CoreError {
    CoreError::StorageUnavailable(format!("sqlite error: {e}"))
}

fn map_read_err(e: rusqlite::Error) -> CoreError {
    if is_unavailable(&e) {
        return CoreError::StorageUnavailable(format!("sqlite error: {e}"));
    }
    CoreError::StorageRead(format!("sqlite error: {e}"))
}

fn map_write_err(e: rusqlite::Error) -> CoreError {
    if is_unavailable(&e) {
        return CoreError::StorageUnavailable(format!("sqlite error: {e}"));
    }
    CoreError::StorageWrite(format!("sqlite error: {e}"))
}

fn row_to_friend(row: &rusqlite::Row<'_>) -> rusqlite::Result<Friend> {
    let id: i64 = row.get(0)?;
    Ok(Friend {
        id: FriendId::new(id as u64),
        name: row.get(1)?,
        age: row.get(2)?,
    })
}

impl FriendRepository for SqliteFriendRepo {
    fn list_all(&self) -> Result<Vec<Friend>, CoreError> {
        let conn = self.lock(CoreError::StorageRead)?;
        let mut stmt = conn
            .prepare("SELECT id, name, age FROM friends ORDER BY id")
            .map_err(map_read_err)?;
        let rows = stmt.query_map([], row_to_friend).map_err(map_read_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_read_err)
    }

    fn insert(&self, friend: NewFriend) -> Result<FriendId, CoreError> {
        let conn = self.lock(CoreError::StorageWrite)?;
        conn.execute(
            "INSERT INTO friends(name, age) VALUES (?1, ?2)",
            params![friend.name, friend.age],
        )
        .map_err(map_write_err)?;
        let id = FriendId::new(conn.last_insert_rowid() as u64);
        debug!(%id, "friend inserted");
        Ok(id)
    }

    fn remove(&self, id: FriendId) -> Result<(), CoreError> {
        let conn = self.lock(CoreError::StorageWrite)?;
        conn.execute("DELETE FROM friends WHERE id = ?1", params![id.get() as i64])
            .map_err(map_write_err)?;
        Ok(())
    }

    fn update(&self, id: FriendId, fields: NewFriend) -> Result<(), CoreError> {
        let conn = self.lock(CoreError::StorageWrite)?;
        let changed = conn
            .execute(
                "UPDATE friends SET name = ?1, age = ?2 WHERE id = ?3",
                params![fields.name, fields.age, id.get() as i64],
            )
            .map_err(map_write_err)?;
        if changed == 0 {
            Err(CoreError::NotFound)
        } else {
            Ok(())
        }
    }

    fn get(&self, id: FriendId) -> Result<Option<Friend>, CoreError> {
        let conn = self.lock(CoreError::StorageRead)?;
        conn.query_row(
            "SELECT id, name, age FROM friends WHERE id = ?1",
            params![id.get() as i64],
            row_to_friend,
        )
        .optional()
        .map_err(map_read_err)
    }
}
