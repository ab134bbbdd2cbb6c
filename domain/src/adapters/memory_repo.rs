use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::{CoreError, Friend, FriendId, FriendRepository, NewFriend};

/// Simple in-memory repository. Data lives as long as the value does.
pub struct InMemoryRepo {
    inner: Mutex<MemoryState>,
}

struct MemoryState {
    next_id: u64,
    friends: BTreeMap<u64, Friend>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryState {
                next_id: 1,
                friends: BTreeMap::new(),
            }),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl FriendRepository for InMemoryRepo {
    fn list_all(&self) -> Result<Vec<Friend>, CoreError> {
        let state = self
            .inner
            .lock()
            .map_err(|_| CoreError::StorageRead("mutex poisoned".into()))?;
        Ok(state.friends.values().cloned().collect())
    }

    fn insert(&self, friend: NewFriend) -> Result<FriendId, CoreError> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| CoreError::StorageWrite("mutex poisoned".into()))?;
        let id = FriendId::new(state.next_id);
        state.next_id = state
            .next_id
            .checked_add(1)
            .ok_or_else(|| CoreError::StorageWrite("id space exhausted".into()))?;
        state.friends.insert(id.get(), Friend::from_parts(id, friend));
        Ok(id)
    }

    fn remove(&self, id: FriendId) -> Result<(), CoreError> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| CoreError::StorageWrite("mutex poisoned".into()))?;
        state.friends.remove(&id.get());
        Ok(())
    }

    fn update(&self, id: FriendId, fields: NewFriend) -> Result<(), CoreError> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| CoreError::StorageWrite("mutex poisoned".into()))?;
        match state.friends.get_mut(&id.get()) {
            Some(friend) => {
                friend.name = fields.name;
                friend.age = fields.age;
                Ok(())
            }
            None => Err(CoreError::NotFound),
        }
    }

    fn get(&self, id: FriendId) -> Result<Option<Friend>, CoreError> {
        let state = self
            .inner
            .lock()
            .map_err(|_| CoreError::StorageRead("mutex poisoned".into()))?;
        Ok(state.friends.get(&id.get()).cloned())
    }
}
