//! # Feature: Database Reset
//!
//! Last-resort recovery from a corrupted local database: delete the primary
//! file together with its WAL and SHM companions and let the engine recreate
//! an empty, correctly migrated store on next startup.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod files;
pub mod reset;

pub use files::{DatabaseFileSystem, DatabaseFiles, TokioFileSystem};
pub use reset::DatabaseReset;
