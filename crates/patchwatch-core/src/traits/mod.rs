//! Core traits for the patchwatch system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`PlatformAdapter`]: Fetch and normalize remote title state
//! - [`HistoryStore`]: Persisted last-seen-version snapshot
//! - [`Notifier`]: Deliver update notifications

pub mod adapter;
pub mod history_store;
pub mod notifier;

pub use adapter::PlatformAdapter;
pub use history_store::{HistorySnapshot, HistoryStore};
pub use notifier::Notifier;
