use tracing::warn;

use crate::validate::validate_friend;
use crate::{CoreError, Friend, FriendId, FriendRepository};

/// Application service in front of a `FriendRepository`.
///
/// Validates raw form text before the store is touched and retries a
/// transient read/write fault once before surfacing it.
pub struct FriendService<R: FriendRepository> {
    repo: R,
}

impl<R: FriendRepository> FriendService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Read the whole collection.
    pub fn list_all(&self) -> Result<Vec<Friend>, CoreError> {
        self.retry_once("list_all", || self.repo.list_all())
    }

    /// Validate the add form and insert a new friend.
    pub fn add(&self, name: &str, age: &str) -> Result<FriendId, CoreError> {
        let fields = validate_friend(name, age)?;
        self.retry_once("insert", || self.repo.insert(fields.clone()))
    }

    /// Validate the edit form and replace the fields of `id`.
    pub fn update(&self, id: FriendId, name: &str, age: &str) -> Result<(), CoreError> {
        let fields = validate_friend(name, age)?;
        self.retry_once("update", || self.repo.update(id, fields.clone()))
    }

    pub fn remove(&self, id: FriendId) -> Result<(), CoreError> {
        self.retry_once("remove", || self.repo.remove(id))
    }

    pub fn get(&self, id: FriendId) -> Result<Option<Friend>, CoreError> {
        self.retry_once("get", || self.repo.get(id))
    }

    // Adapters roll back a failed write, so running it a second time cannot
    // duplicate an insert.
    fn retry_once<T>(
        &self,
        op: &'static str,
        f: impl Fn() -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        match f() {
            Err(e) if e.is_transient() => {
                warn!(op, error = %e, "transient storage fault, retrying once");
                f()
            }
            other => other,
        }
    }
}
