//! Test doubles for reconciliation contract tests
//!
//! Minimal adapter and notifier doubles with call counters, so the tests can
//! assert ordering properties (notify before commit, one fetch per title per
//! run) without any network.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use patchwatch_core::traits::{Notifier, PlatformAdapter};
use patchwatch_core::{Platform, TitleState, TrackedTitle, UpdateEvent};

/// Build a plain title state for a platform.
pub fn state(platform: Platform, title_id: &str, version: &str) -> TitleState {
    TitleState {
        platform,
        title_id: title_id.to_string(),
        name: format!("Title {}", title_id),
        current_version: version.to_string(),
        region: None,
        url: format!("https://example.com/{}", title_id),
        thumbnail: None,
        image: None,
        build_name: None,
        timestamp: None,
        extra: serde_json::Value::Null,
    }
}

/// An adapter that serves canned states keyed by title id
pub struct ScriptedAdapter {
    platform: Platform,
    states: HashMap<String, TitleState>,
    fetch_calls: Arc<AtomicUsize>,
}

impl ScriptedAdapter {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            states: HashMap::new(),
            fetch_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Serve `version` for `title_id`.
    pub fn with_title(mut self, title_id: &str, version: &str) -> Self {
        self.states
            .insert(title_id.to_string(), state(self.platform, title_id, version));
        self
    }

    /// Serve a fully specified state for a configured id. The state's own
    /// `title_id` may differ, mirroring upstream alias canonicalization.
    pub fn with_state(mut self, configured_id: &str, state: TitleState) -> Self {
        self.states.insert(configured_id.to_string(), state);
        self
    }

    pub fn fetch_calls(&self) -> Arc<AtomicUsize> {
        self.fetch_calls.clone()
    }
}

#[async_trait::async_trait]
impl PlatformAdapter for ScriptedAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch(&self, title: &TrackedTitle) -> patchwatch_core::Result<Option<TitleState>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.states.get(&title.id).cloned())
    }
}

/// An adapter whose fetch always errors
pub struct FailingAdapter {
    platform: Platform,
}

impl FailingAdapter {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

#[async_trait::async_trait]
impl PlatformAdapter for FailingAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch(&self, _title: &TrackedTitle) -> patchwatch_core::Result<Option<TitleState>> {
        Err(patchwatch_core::Error::transport("connection refused"))
    }
}

/// A notifier that records delivered events and can be set to fail
pub struct RecordingNotifier {
    deliver: Arc<AtomicBool>,
    notify_calls: Arc<AtomicUsize>,
    delivered: Arc<std::sync::Mutex<Vec<UpdateEvent>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            deliver: Arc::new(AtomicBool::new(true)),
            notify_calls: Arc::new(AtomicUsize::new(0)),
            delivered: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    /// Handle letting the test flip delivery on or off mid-scenario.
    pub fn delivery_switch(&self) -> Arc<AtomicBool> {
        self.deliver.clone()
    }

    pub fn notify_calls(&self) -> Arc<AtomicUsize> {
        self.notify_calls.clone()
    }

    pub fn delivered(&self) -> Arc<std::sync::Mutex<Vec<UpdateEvent>>> {
        self.delivered.clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &UpdateEvent) -> bool {
        self.notify_calls.fetch_add(1, Ordering::SeqCst);

        if self.deliver.load(Ordering::SeqCst) {
            self.delivered.lock().unwrap().push(event.clone());
            true
        } else {
            false
        }
    }

    fn notifier_name(&self) -> &'static str {
        "recording"
    }
}
