//! Domain types shared across the watcher
//!
//! - [`Platform`]: the four remote ecosystems patchwatch tracks
//! - [`TrackedTitle`]: a configured title identifier (plus optional region)
//! - [`TitleState`]: the normalized result of one remote fetch
//! - [`UpdateEvent`]: a detected version change, ready for notification

use chrono::{DateTime, Utc};
use std::fmt;

/// One of the four remote platforms patchwatch watches.
///
/// The set is fixed; adapters are selected per variant rather than through
/// a dynamic registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Battle.net, via the BlizzTrack manifest API
    Battlenet,
    /// PlayStation 5, via ProsperoPatches
    Prospero,
    /// PlayStation 4, via OrbisPatches
    Orbis,
    /// Steam, via the SteamCMD info API
    Steam,
}

impl Platform {
    /// All platforms, in canonical processing order.
    pub const ALL: [Platform; 4] = [
        Platform::Battlenet,
        Platform::Prospero,
        Platform::Orbis,
        Platform::Steam,
    ];

    /// Stable key used in the history file and logs.
    pub fn key(&self) -> &'static str {
        match self {
            Platform::Battlenet => "battle",
            Platform::Prospero => "prospero",
            Platform::Orbis => "orbis",
            Platform::Steam => "steam",
        }
    }

    /// Fixed embed color for this platform.
    pub fn color(&self) -> u32 {
        match self {
            Platform::Battlenet => 0x148EFF,
            Platform::Prospero | Platform::Orbis => 0x00439C,
            Platform::Steam => 0x1B2838,
        }
    }

    /// Footer icon shown in notifications for this platform.
    pub fn logo_url(&self) -> &'static str {
        match self {
            Platform::Battlenet => "https://i.imgur.com/dI6bDr7.png",
            Platform::Prospero | Platform::Orbis => "https://i.imgur.com/ccNqLcb.png",
            Platform::Steam => "https://i.imgur.com/oYkhH6s.png",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Battlenet => "Battle.net",
            Platform::Prospero => "Prospero",
            Platform::Orbis => "Orbis",
            Platform::Steam => "Steam",
        };
        f.write_str(name)
    }
}

/// A configured title to track.
///
/// `region` is only meaningful for multi-region platforms (Battle.net) and is
/// `None` elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedTitle {
    /// Platform-specific title identifier (title id, app id, product slug)
    pub id: String,
    /// Preferred region for multi-region platforms
    pub region: Option<String>,
}

impl TrackedTitle {
    /// Create a tracked title without a region preference.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            region: None,
        }
    }

    /// Set the preferred region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

/// Normalized remote state for one title, produced by a platform adapter.
///
/// `current_version` is an opaque token. It is compared for exact equality
/// against history and never parsed or ordered, so a renumbering upstream is
/// reported the same as a regular update.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleState {
    /// Platform this state came from
    pub platform: Platform,
    /// Canonical identifier used as the history key (may differ from the
    /// configured id when the upstream canonicalizes aliases)
    pub title_id: String,
    /// Human-readable display name
    pub name: String,
    /// Opaque version token
    pub current_version: String,
    /// Region of the selected manifest entry, when the platform has regions
    pub region: Option<String>,
    /// Click-through URL for notifications
    pub url: String,
    /// Small icon image
    pub thumbnail: Option<String>,
    /// Large cover/keyart image
    pub image: Option<String>,
    /// Secondary human-readable build identifier
    pub build_name: Option<String>,
    /// Upstream publish timestamp, when the API exposes one
    pub timestamp: Option<DateTime<Utc>>,
    /// Platform-specific carry-over used by secondary lookups when an update
    /// is detected (e.g. Battle.net build config paths)
    pub extra: serde_json::Value,
}

/// A detected version change, ready for notification formatting.
///
/// Only constructed on the changed path of the reconciler, so
/// `previous_version != current_version` always holds. First-seen titles are
/// recorded silently and never produce an event.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateEvent {
    pub platform: Platform,
    pub title_id: String,
    pub name: String,
    pub region: Option<String>,
    pub previous_version: String,
    pub current_version: String,
    pub build_name: Option<String>,
    pub url: String,
    pub thumbnail: Option<String>,
    pub image: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl UpdateEvent {
    /// Build an event from fetched state and the previously recorded version.
    pub fn from_state(previous: &str, state: &TitleState) -> Self {
        Self {
            platform: state.platform,
            title_id: state.title_id.clone(),
            name: state.name.clone(),
            region: state.region.clone(),
            previous_version: previous.to_string(),
            current_version: state.current_version.clone(),
            build_name: state.build_name.clone(),
            url: state.url.clone(),
            thumbnail: state.thumbnail.clone(),
            image: state.image.clone(),
            timestamp: state.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_keys_are_distinct() {
        let keys: std::collections::HashSet<_> =
            Platform::ALL.iter().map(|p| p.key()).collect();
        assert_eq!(keys.len(), Platform::ALL.len());
    }

    #[test]
    fn event_carries_versions_verbatim() {
        let state = TitleState {
            platform: Platform::Steam,
            title_id: "1938090".to_string(),
            name: "Example".to_string(),
            current_version: "101".to_string(),
            region: None,
            url: "https://steamdb.info/app/1938090/patchnotes/".to_string(),
            thumbnail: None,
            image: None,
            build_name: None,
            timestamp: None,
            extra: serde_json::Value::Null,
        };

        let event = UpdateEvent::from_state("100", &state);
        assert_eq!(event.previous_version, "100");
        assert_eq!(event.current_version, "101");
        assert_ne!(event.previous_version, event.current_version);
    }
}
