//! # Feature: Health-Entry Change Events
//!
//! Process-wide fan-out telling observers that the locally cached health
//! entries changed, so dependent views can refresh without polling.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Handlers return Result; panics are isolated per handler
//! - 1.0.0: Initial release with synchronous subscribe/emit

pub mod bus;

pub use bus::{ChangeKind, HealthEntryChange, HealthEntryEvents, Subscription};
