//! Store selection: one repository type covering every configured backend.

use std::time::Duration;

use domain::adapters::memory_repo::InMemoryRepo;
use domain::{CoreError, Friend, FriendId, FriendRepository, NewFriend};
use tracing::{error, info};

use crate::config::{Config, StorageProvider};

enum RepoKind {
    Memory(InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite_adapter::SqliteFriendRepo),
    #[cfg(feature = "kv")]
    Kv(kv_adapter::KvFriendRepo),
    /// The store could not be opened; every call reports why.
    Unavailable(String),
}

/// Repository over whichever backend the configuration selects.
pub struct AnyRepo {
    kind: RepoKind,
}

impl AnyRepo {
    pub fn memory() -> Self {
        Self {
            kind: RepoKind::Memory(InMemoryRepo::new()),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            kind: RepoKind::Unavailable(reason.into()),
        }
    }

    /// Open the configured backend. Failures do not abort: they produce a
    /// repository that reports `StorageUnavailable`, so the front-end can
    /// show the reason.
    pub fn open(cfg: &Config) -> Self {
        let opened = match cfg.storage_provider {
            StorageProvider::Memory => Ok(Self::memory()),
            #[cfg(feature = "sqlite")]
            StorageProvider::Sqlite => sqlite_adapter::SqliteFriendRepo::open_with_busy_timeout(
                &cfg.db_path,
                cfg.store_timeout,
            )
            .map(|r| Self {
                kind: RepoKind::Sqlite(r),
            }),
            #[cfg(feature = "kv")]
            StorageProvider::Kv => kv_adapter::KvFriendRepo::open(&cfg.db_path).map(|r| Self {
                kind: RepoKind::Kv(r),
            }),
            #[allow(unreachable_patterns)]
            other => Err(CoreError::StorageUnavailable(format!(
                "this build has no {} support",
                other.label()
            ))),
        };
        match opened {
            Ok(repo) => {
                info!(
                    provider = cfg.storage_provider.label(),
                    path = %cfg.db_path.display(),
                    "store ready"
                );
                repo
            }
            Err(e) => {
                error!(provider = cfg.storage_provider.label(), error = %e, "failed to open store");
                Self::unavailable(e.to_string())
            }
        }
    }

    fn backend(&self) -> Result<&dyn FriendRepository, CoreError> {
        match &self.kind {
            RepoKind::Memory(r) => Ok(r),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => Ok(r),
            #[cfg(feature = "kv")]
            RepoKind::Kv(r) => Ok(r),
            RepoKind::Unavailable(reason) => Err(CoreError::StorageUnavailable(reason.clone())),
        }
    }
}

impl FriendRepository for AnyRepo {
    fn list_all(&self) -> Result<Vec<Friend>, CoreError> {
        self.backend()?.list_all()
    }

    fn insert(&self, friend: NewFriend) -> Result<FriendId, CoreError> {
        self.backend()?.insert(friend)
    }

    fn remove(&self, id: FriendId) -> Result<(), CoreError> {
        self.backend()?.remove(id)
    }

    fn update(&self, id: FriendId, fields: NewFriend) -> Result<(), CoreError> {
        self.backend()?.update(id, fields)
    }

    fn get(&self, id: FriendId) -> Result<Option<Friend>, CoreError> {
        self.backend()?.get(id)
    }
}

/// Open the configured store off the async runtime, bounded by the
/// configured store timeout.
pub async fn open_with_timeout(cfg: &Config) -> AnyRepo {
    let open_cfg = cfg.clone();
    open_bounded(cfg.store_timeout, move || AnyRepo::open(&open_cfg)).await
}

async fn open_bounded<F>(timeout: Duration, open: F) -> AnyRepo
where
    F: FnOnce() -> AnyRepo + Send + 'static,
{
    let task = tokio::task::spawn_blocking(open);
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(repo)) => repo,
        Ok(Err(e)) => AnyRepo::unavailable(format!("opening the store failed: {e}")),
        Err(_) => {
            error!(timeout_ms = timeout.as_millis() as u64, "opening the store timed out");
            AnyRepo::unavailable(format!(
                "opening the store took longer than {} ms",
                timeout.as_millis()
            ))
        }
    }
}
