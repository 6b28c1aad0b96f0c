//! Configuration types for the patchwatch system
//!
//! Configuration is one JSON document (`config.json` by default) naming the
//! titles to track per platform, the delivery webhook, and a few run flags.

use serde::{Deserialize, Serialize};

use crate::platform::{Platform, TrackedTitle};

/// Main watcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Tracked titles, per platform
    pub titles: TitlesConfig,

    /// Outbound notification webhook
    pub webhook: WebhookConfig,

    /// Path to the persisted history file
    #[serde(default = "default_history_path")]
    pub history_path: String,

    /// Debug mode: run everything but never persist history
    #[serde(default)]
    pub debug: bool,

    /// Log severity (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl WatcherConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.titles.total() == 0 {
            return Err(crate::Error::config("no titles configured"));
        }

        self.webhook.validate()?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(crate::Error::config(format!(
                    "invalid log level '{}', expected one of trace, debug, info, warn, error",
                    other
                )));
            }
        }

        Ok(())
    }
}

/// Tracked titles, one list per platform
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TitlesConfig {
    /// Battle.net product identifiers with a preferred region
    #[serde(default)]
    pub battlenet: Vec<BattleTitleConfig>,

    /// PlayStation 5 title ids
    #[serde(default)]
    pub prospero: Vec<String>,

    /// PlayStation 4 title ids
    #[serde(default)]
    pub orbis: Vec<String>,

    /// Steam app ids
    #[serde(default)]
    pub steam: Vec<u64>,
}

impl TitlesConfig {
    /// Titles for one platform, as the adapter-facing shape.
    pub fn for_platform(&self, platform: Platform) -> Vec<TrackedTitle> {
        match platform {
            Platform::Battlenet => self
                .battlenet
                .iter()
                .map(|t| TrackedTitle::new(&t.id).with_region(&t.region))
                .collect(),
            Platform::Prospero => self.prospero.iter().map(TrackedTitle::new).collect(),
            Platform::Orbis => self.orbis.iter().map(TrackedTitle::new).collect(),
            Platform::Steam => self
                .steam
                .iter()
                .map(|id| TrackedTitle::new(id.to_string()))
                .collect(),
        }
    }

    /// Total number of configured titles across all platforms.
    pub fn total(&self) -> usize {
        self.battlenet.len() + self.prospero.len() + self.orbis.len() + self.steam.len()
    }
}

/// A Battle.net title entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleTitleConfig {
    /// Product identifier (e.g. "pro", "fenris")
    pub id: String,

    /// Preferred manifest region; falls back to the first listed region when
    /// the manifest has no matching entry
    #[serde(default = "default_region")]
    pub region: String,
}

/// Notification webhook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook delivery URL
    pub url: String,

    /// Display name used for the posting identity
    #[serde(default)]
    pub username: Option<String>,

    /// Avatar used for the posting identity
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl WebhookConfig {
    /// Validate the webhook configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("webhook URL cannot be empty"));
        }

        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "webhook URL must use HTTP or HTTPS, got: {}",
                self.url
            )));
        }

        Ok(())
    }
}

fn default_history_path() -> String {
    "history.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_region() -> String {
    "Americas".to_string()
}
