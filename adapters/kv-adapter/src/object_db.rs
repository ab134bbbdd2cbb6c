//! File-backed object database.
//!
//! A database has a name and a schema version and holds named object stores.
//! Each store keeps JSON object records under `u64` keys, written into the
//! record at the store's key path, and a key generator that only moves
//! forward. The whole database is one JSON document next to a `.lock` file.
//!
//! Every transaction re-reads the document. Readers take a shared lock,
//! writers an exclusive one and replace the document atomically
//! (write temp file, fsync, rename) only when the closure succeeds.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("cannot access {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("database `{name}` has version {found}, newer than requested {requested}")]
    VersionTooNew {
        name: String,
        found: u32,
        requested: u32,
    },
    #[error("{path} holds database `{found}`, not `{requested}`")]
    NameMismatch {
        path: PathBuf,
        found: String,
        requested: String,
    },
    #[error("database version changed from {opened} to {found} by another connection")]
    VersionChanged { opened: u32, found: u32 },
    #[error("database file {0} no longer exists")]
    Missing(PathBuf),
    #[error("object store `{0}` does not exist")]
    NoSuchStore(String),
    #[error("record is not an object or lacks an integer key at `{0}`")]
    BadRecord(String),
    #[error("key generator exhausted in store `{0}`")]
    KeysExhausted(String),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt database document: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl KvError {
    /// Errors after which this handle can never work again.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            KvError::Unavailable { .. }
                | KvError::VersionTooNew { .. }
                | KvError::NameMismatch { .. }
                | KvError::VersionChanged { .. }
                | KvError::Missing(_)
                | KvError::NoSuchStore(_)
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    name: String,
    version: u32,
    stores: BTreeMap<String, StoreDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreDoc {
    key_path: String,
    next_key: u64,
    records: BTreeMap<u64, Value>,
}

/// Handle to an opened object database.
#[derive(Debug)]
pub struct ObjectDb {
    path: PathBuf,
    lock_path: PathBuf,
    version: u32,
}

impl ObjectDb {
    /// Open `path` as database `name` at `version`.
    ///
    /// When the stored version is older (a missing file counts as version 0),
    /// `upgrade` runs with the old version and may create stores; the result
    /// is persisted before `open` returns. A newer stored version is refused.
    pub fn open<F>(
        path: impl Into<PathBuf>,
        name: &str,
        version: u32,
        upgrade: F,
    ) -> Result<Self, KvError>
    where
        F: FnOnce(&mut Upgrade<'_>, u32),
    {
        let path = path.into();
        let lock_path = sibling(&path, "lock");
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| KvError::Unavailable {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let _guard = FileLock::exclusive(&lock_path)?;
        let mut doc = match read_document(&path)? {
            Some(doc) => doc,
            None => Document {
                name: name.to_string(),
                version: 0,
                stores: BTreeMap::new(),
            },
        };
        if doc.name != name {
            return Err(KvError::NameMismatch {
                path,
                found: doc.name,
                requested: name.to_string(),
            });
        }
        if doc.version > version {
            return Err(KvError::VersionTooNew {
                name: doc.name,
                found: doc.version,
                requested: version,
            });
        }
        if doc.version < version {
            let old = doc.version;
            upgrade(&mut Upgrade { doc: &mut doc }, old);
            doc.version = version;
            write_document(&path, &doc)?;
            info!(path = %path.display(), from = old, to = version, "object database upgraded");
        }

        Ok(Self {
            path,
            lock_path,
            version,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a read-only transaction under a shared lock.
    pub fn read<T>(&self, f: impl FnOnce(&ReadTx<'_>) -> Result<T, KvError>) -> Result<T, KvError> {
        let _guard = FileLock::shared(&self.lock_path)?;
        let doc = self.load()?;
        f(&ReadTx { doc: &doc })
    }

    /// Run a read-write transaction under an exclusive lock. Changes are
    /// committed only if `f` returns `Ok`.
    pub fn write<T>(
        &self,
        f: impl FnOnce(&mut WriteTx<'_>) -> Result<T, KvError>,
    ) -> Result<T, KvError> {
        let _guard = FileLock::exclusive(&self.lock_path)?;
        let mut doc = self.load()?;
        let mut tx = WriteTx {
            doc: &mut doc,
            dirty: false,
        };
        let out = f(&mut tx)?;
        if tx.dirty {
            write_document(&self.path, &doc)?;
        }
        Ok(out)
    }

    fn load(&self) -> Result<Document, KvError> {
        let doc = read_document(&self.path)?.ok_or_else(|| KvError::Missing(self.path.clone()))?;
        if doc.version != self.version {
            return Err(KvError::VersionChanged {
                opened: self.version,
                found: doc.version,
            });
        }
        Ok(doc)
    }
}

/// Schema changes allowed while a database is being upgraded.
pub struct Upgrade<'a> {
    doc: &'a mut Document,
}

impl Upgrade<'_> {
    pub fn contains_store(&self, name: &str) -> bool {
        self.doc.stores.contains_key(name)
    }

    /// Create an auto-incrementing store whose keys live at `key_path`.
    pub fn create_store(&mut self, name: &str, key_path: &str) {
        debug!(store = name, key_path, "creating object store");
        self.doc.stores.insert(
            name.to_string(),
            StoreDoc {
                key_path: key_path.to_string(),
                next_key: 1,
                records: BTreeMap::new(),
            },
        );
    }
}

pub struct ReadTx<'a> {
    doc: &'a Document,
}

impl ReadTx<'_> {
    pub fn get(&self, store: &str, key: u64) -> Result<Option<Value>, KvError> {
        Ok(store_ref(self.doc, store)?.records.get(&key).cloned())
    }

    /// All records of `store` in ascending key order.
    pub fn get_all(&self, store: &str) -> Result<Vec<Value>, KvError> {
        Ok(store_ref(self.doc, store)?.records.values().cloned().collect())
    }
}

pub struct WriteTx<'a> {
    doc: &'a mut Document,
    dirty: bool,
}

impl WriteTx<'_> {
    pub fn get(&self, store: &str, key: u64) -> Result<Option<Value>, KvError> {
        Ok(store_ref(self.doc, store)?.records.get(&key).cloned())
    }

    pub fn get_all(&self, store: &str) -> Result<Vec<Value>, KvError> {
        Ok(store_ref(self.doc, store)?.records.values().cloned().collect())
    }

    /// Insert `value` under a freshly generated key, which is also written
    /// into the record at the store's key path.
    pub fn add(&mut self, store: &str, value: Value) -> Result<u64, KvError> {
        let s = store_mut(self.doc, store)?;
        let Value::Object(mut map) = value else {
            return Err(KvError::BadRecord(s.key_path.clone()));
        };
        let key = s.next_key;
        s.next_key = key
            .checked_add(1)
            .ok_or_else(|| KvError::KeysExhausted(store.to_string()))?;
        map.insert(s.key_path.clone(), Value::from(key));
        s.records.insert(key, Value::Object(map));
        self.dirty = true;
        Ok(key)
    }

    /// Insert or replace the record keyed by the value at the key path.
    pub fn put(&mut self, store: &str, value: Value) -> Result<u64, KvError> {
        let s = store_mut(self.doc, store)?;
        let key = value
            .get(&s.key_path)
            .and_then(Value::as_u64)
            .ok_or_else(|| KvError::BadRecord(s.key_path.clone()))?;
        if key >= s.next_key {
            s.next_key = key
                .checked_add(1)
                .ok_or_else(|| KvError::KeysExhausted(store.to_string()))?;
        }
        s.records.insert(key, value);
        self.dirty = true;
        Ok(key)
    }

    /// Delete the record under `key`. Returns whether one existed.
    pub fn delete(&mut self, store: &str, key: u64) -> Result<bool, KvError> {
        let s = store_mut(self.doc, store)?;
        let existed = s.records.remove(&key).is_some();
        self.dirty |= existed;
        Ok(existed)
    }
}

fn store_ref<'d>(doc: &'d Document, store: &str) -> Result<&'d StoreDoc, KvError> {
    doc.stores
        .get(store)
        .ok_or_else(|| KvError::NoSuchStore(store.to_string()))
}

fn store_mut<'d>(doc: &'d mut Document, store: &str) -> Result<&'d mut StoreDoc, KvError> {
    doc.stores
        .get_mut(store)
        .ok_or_else(|| KvError::NoSuchStore(store.to_string()))
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn read_document(path: &Path) -> Result<Option<Document>, KvError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(KvError::Unavailable {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_document(path: &Path, doc: &Document) -> Result<(), KvError> {
    let bytes = serde_json::to_vec_pretty(doc)?;
    let tmp_path = sibling(path, "tmp");
    let mut file = File::create(&tmp_path)?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;

    // fsync directory for rename durability
    if let Some(dir) = path.parent() {
        if let Ok(d) = File::open(dir) {
            let _ = d.sync_all();
        }
    }
    Ok(())
}

/// Advisory lock on the sidecar lock file, released on drop.
struct FileLock(File);

impl FileLock {
    fn exclusive(path: &Path) -> Result<Self, KvError> {
        let file = open_lock_file(path)?;
        file.lock_exclusive()?;
        Ok(Self(file))
    }

    fn shared(path: &Path) -> Result<Self, KvError> {
        let file = open_lock_file(path)?;
        file.lock_shared()?;
        Ok(Self(file))
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.0.unlock();
    }
}

fn open_lock_file(path: &Path) -> Result<File, KvError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|source| KvError::Unavailable {
            path: path.to_path_buf(),
            source,
        })
}
