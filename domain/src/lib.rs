//! Domain library for the friends record store.
//!
//! Holds the record types, the storage port (`FriendRepository`), input
//! validation, and the error taxonomy. Storage engines live in the adapter
//! crates; the interactive front-end lives in `apps/friends-app`.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Name of the local database holding the collection.
pub const DATABASE_NAME: &str = "MyDatabase";

/// Name of the single collection of friend records.
pub const COLLECTION: &str = "friends";

/// Schema version every adapter creates and accepts.
pub const SCHEMA_VERSION: u32 = 1;

/// Store-assigned identifier of a persisted friend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FriendId(u64);

impl FriendId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Display for FriendId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Field values of a friend that has not been persisted yet, or the
/// replacement values for an update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFriend {
    pub name: String,
    pub age: i64,
}

impl NewFriend {
    pub fn new<S: Into<String>>(name: S, age: i64) -> Self {
        Self {
            name: name.into(),
            age,
        }
    }
}

/// A persisted friend record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub id: FriendId,
    pub name: String,
    pub age: i64,
}

impl Friend {
    pub fn from_parts(id: FriendId, fields: NewFriend) -> Self {
        Self {
            id,
            name: fields.name,
            age: fields.age,
        }
    }

    /// The field values without the id.
    pub fn fields(&self) -> NewFriend {
        NewFriend::new(self.name.clone(), self.age)
    }
}

/// Storage port for the friends collection.
///
/// An adapter value is the open handle: constructing it opens (and if needed
/// creates) the collection, dropping it closes the store.
pub trait FriendRepository: Send + Sync {
    /// Every persisted record, in ascending id order.
    fn list_all(&self) -> Result<Vec<Friend>, CoreError>;
    /// Persist a new record; the store assigns and returns its id.
    fn insert(&self, friend: NewFriend) -> Result<FriendId, CoreError>;
    /// Delete a record. Missing ids are not an error.
    fn remove(&self, id: FriendId) -> Result<(), CoreError>;
    /// Replace the fields of an existing record, `NotFound` if absent.
    fn update(&self, id: FriendId, fields: NewFriend) -> Result<(), CoreError>;
    fn get(&self, id: FriendId) -> Result<Option<Friend>, CoreError>;
}

impl<T: FriendRepository + ?Sized> FriendRepository for std::sync::Arc<T> {
    fn list_all(&self) -> Result<Vec<Friend>, CoreError> {
        (**self).list_all()
    }
    fn insert(&self, friend: NewFriend) -> Result<FriendId, CoreError> {
        (**self).insert(friend)
    }
    fn remove(&self, id: FriendId) -> Result<(), CoreError> {
        (**self).remove(id)
    }
    fn update(&self, id: FriendId, fields: NewFriend) -> Result<(), CoreError> {
        (**self).update(id, fields)
    }
    fn get(&self, id: FriendId) -> Result<Option<Friend>, CoreError> {
        (**self).get(id)
    }
}

/// Core domain errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// The environment denies persistent storage. Fatal for the session.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("storage read failed: {0}")]
    StorageRead(String),
    #[error("storage write failed: {0}")]
    StorageWrite(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found")]
    NotFound,
}

impl CoreError {
    /// Read/write faults that may succeed when attempted again.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::StorageRead(_) | CoreError::StorageWrite(_))
    }
}

/// Return a short about/version line for the binary to print.
pub fn about() -> String {
    let pkg = env!("CARGO_PKG_NAME");
    let ver = env!("CARGO_PKG_VERSION");
    format!("{} v{}", pkg, ver)
}

pub mod adapters;
pub mod service;
pub mod validate;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
