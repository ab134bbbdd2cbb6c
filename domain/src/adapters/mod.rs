//! Adapters that live inside the domain crate for convenience.
//!
//! The in-memory repository backs unit tests and the `memory` storage
//! provider. Persistent adapters (SQLite, object store) live in separate crates.

pub mod memory_repo;
