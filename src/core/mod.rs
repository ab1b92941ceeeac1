//! # Core Module
//!
//! Configuration and shared result types for the local data layer.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add WriteOutcome so storage degradation is visible without failing the caller
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod outcome;

// Re-export commonly used items
pub use config::Config;
pub use outcome::WriteOutcome;
