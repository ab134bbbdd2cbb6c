//! kv-adapter — raw object-store implementation of the `FriendRepository` port.
//!
//! Purpose
//! - The "raw" storage variant: instead of an SQL engine, friends live in a
//!   plain versioned object database (`object_db`) that this crate opens with
//!   an explicit upgrade step and drives with low-level get/add/put/delete.
//! - The object store's `put` upserts; `update` checks for the record inside
//!   the same exclusive transaction so a missing id is `NotFound`, as in the
//!   SQLite adapter.

pub mod object_db;

use std::path::PathBuf;

use domain::{
    CoreError, Friend, FriendId, FriendRepository, NewFriend, COLLECTION, DATABASE_NAME,
    SCHEMA_VERSION,
};
use serde_json::{json, Value};
use tracing::{debug, info};

pub use object_db::{KvError, ObjectDb};

/// Object-store backed friends repository.
pub struct KvFriendRepo {
    db: ObjectDb,
}

impl KvFriendRepo {
    /// Open (or create) the database document at `path` with the `friends`
    /// store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let db = ObjectDb::open(path, DATABASE_NAME, SCHEMA_VERSION, |up, old| {
            debug!(old, "upgrading friends database");
            if !up.contains_store(COLLECTION) {
                up.create_store(COLLECTION, "id");
            }
        })
        .map_err(map_open_err)?;
        info!(path = %db.path().display(), "object-store friends store opened");
        Ok(Self { db })
    }
}

fn map_open_err(e: KvError) -> CoreError {
    CoreError::StorageUnavailable(e.to_string())
}

fn map_read_err(e: KvError) -> CoreError {
    if e.is_fatal() {
        return CoreError::StorageUnavailable(e.to_string());
    }
    CoreError::StorageRead(e.to_string())
}

fn map_write_err(e: KvError) -> CoreError {
    if e.is_fatal() {
        return CoreError::StorageUnavailable(e.to_string());
    }
    CoreError::StorageWrite(e.to_string())
}

fn decode(value: Value) -> Result<Friend, CoreError> {
    serde_json::from_value(value)
        .map_err(|e| CoreError::StorageRead(format!("bad friend record: {e}")))
}

impl FriendRepository for KvFriendRepo {
    fn list_all(&self) -> Result<Vec<Friend>, CoreError> {
        let values = self
            .db
            .read(|tx| tx.get_all(COLLECTION))
            .map_err(map_read_err)?;
        values.into_iter().map(decode).collect()
    }

    fn insert(&self, friend: NewFriend) -> Result<FriendId, CoreError> {
        let key = self
            .db
            .write(|tx| tx.add(COLLECTION, json!({ "name": friend.name, "age": friend.age })))
            .map_err(map_write_err)?;
        Ok(FriendId::new(key))
    }

    fn remove(&self, id: FriendId) -> Result<(), CoreError> {
        self.db
            .write(|tx| tx.delete(COLLECTION, id.get()))
            .map_err(map_write_err)?;
        Ok(())
    }

    fn update(&self, id: FriendId, fields: NewFriend) -> Result<(), CoreError> {
        let found = self
            .db
            .write(|tx| {
                if tx.get(COLLECTION, id.get())?.is_none() {
                    return Ok(false);
                }
                let record = serde_json::to_value(Friend::from_parts(id, fields))?;
                tx.put(COLLECTION, record)?;
                Ok(true)
            })
            .map_err(map_write_err)?;
        if found {
            Ok(())
        } else {
            Err(CoreError::NotFound)
        }
    }

    fn get(&self, id: FriendId) -> Result<Option<Friend>, CoreError> {
        self.db
            .read(|tx| tx.get(COLLECTION, id.get()))
            .map_err(map_read_err)?
            .map(decode)
            .transpose()
    }
}
