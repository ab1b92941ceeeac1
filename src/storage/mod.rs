//! # Storage Module
//!
//! Durable key-value storage used by the tombstone store. Mirrors the
//! async get/set/remove contract of device key-value storage.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod kv;
pub mod sqlite_kv;

pub use kv::{KeyValueStore, MemoryKeyValueStore};
pub use sqlite_kv::SqliteKeyValueStore;
