//! Centralized configuration for the friends front-end.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than on the first user action.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Storage backend provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageProvider {
    /// In-memory storage (data lost on exit)
    Memory,
    /// SQLite file-based storage
    Sqlite,
    /// Raw object-store document
    Kv,
}

impl StorageProvider {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "sqlite" => Some(Self::Sqlite),
            "kv" | "object-store" => Some(Self::Kv),
            _ => None,
        }
    }

    /// Short label shown in the view title.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
            Self::Kv => "object store",
        }
    }

    fn default_path(&self) -> PathBuf {
        match self {
            Self::Memory => PathBuf::new(),
            Self::Sqlite => PathBuf::from("./data/friends.db"),
            Self::Kv => PathBuf::from("./data/friends.kvdb.json"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Front-end configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage provider (default: sqlite)
    pub storage_provider: StorageProvider,
    /// Store location; defaults depend on the provider, unused for memory
    pub db_path: PathBuf,
    /// Upper bound on a single store call (default: 5s)
    pub store_timeout: Duration,
    /// Log format
    pub log_format: LogFormat,
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Storage provider
        let provider_str = lookup("STORAGE_PROVIDER").unwrap_or_else(|| "sqlite".into());
        let storage_provider =
            StorageProvider::parse(&provider_str).ok_or_else(|| ConfigError {
                field: "STORAGE_PROVIDER",
                message: format!("expected sqlite, kv or memory, got '{}'", provider_str),
            })?;

        // DB path
        let db_path = lookup("DB_PATH")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| storage_provider.default_path());

        // Store timeout
        let store_timeout = match lookup("STORE_TIMEOUT_MS") {
            None => Duration::from_millis(5000),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError {
                        field: "STORE_TIMEOUT_MS",
                        message: format!(
                            "expected a positive number of milliseconds, got '{}'",
                            raw
                        ),
                    })
                }
            },
        };

        // Log format
        let log_format =
            LogFormat::from_str(&lookup("LOG_FORMAT").unwrap_or_else(|| "pretty".into()));

        Ok(Self {
            storage_provider,
            db_path,
            store_timeout,
            log_format,
        })
    }
}
