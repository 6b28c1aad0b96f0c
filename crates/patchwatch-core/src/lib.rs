// # patchwatch-core
//
// Core library for the patchwatch title update watcher.
//
// ## Architecture Overview
//
// This library provides the core functionality for detecting title updates:
// - **PlatformAdapter**: Trait for fetching and normalizing remote title state
// - **HistoryStore**: Trait for the persisted last-seen-version snapshot
// - **Notifier**: Trait for delivering update notifications
// - **Reconciler**: Engine that drives the fetch → diff → notify → commit flow
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Sequential Reconciliation**: One run walks every configured title in order
// 3. **Commit After Delivery**: History is only updated once a notification is
//    confirmed delivered, so failed deliveries retry on the next run
// 4. **Library-First**: All core functionality can be used as a library

pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod platform;
pub mod traits;

// Re-export core types for convenience
pub use config::{TitlesConfig, WatcherConfig, WebhookConfig};
pub use engine::{Reconciler, ReconcilerEvent, RunSummary};
pub use error::{Error, Result};
pub use history::{FileHistoryStore, MemoryHistoryStore};
pub use platform::{Platform, TitleState, TrackedTitle, UpdateEvent};
pub use traits::{HistoryStore, Notifier, PlatformAdapter};
