//! PlayStation adapters, backed by the ProsperoPatches and OrbisPatches
//! lookup APIs.
//!
//! Both generations share one wire format; the adapter is instantiated twice
//! with the matching platform tag and API host.

use async_trait::async_trait;
use tracing::{debug, warn};

use patchwatch_core::traits::PlatformAdapter;
use patchwatch_core::{Platform, TitleState, TrackedTitle};
use patchwatch_transport::Transport;

/// PlayStation 4/5 platform adapter
pub struct PlayStationAdapter {
    platform: Platform,
    base_url: &'static str,
    transport: Transport,
}

impl PlayStationAdapter {
    /// PlayStation 5 adapter.
    pub fn prospero(transport: Transport) -> Self {
        Self {
            platform: Platform::Prospero,
            base_url: "https://prosperopatches.com",
            transport,
        }
    }

    /// PlayStation 4 adapter.
    pub fn orbis(transport: Transport) -> Self {
        Self {
            platform: Platform::Orbis,
            base_url: "https://orbispatches.com",
            transport,
        }
    }
}

#[async_trait]
impl PlatformAdapter for PlayStationAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch(&self, title: &TrackedTitle) -> patchwatch_core::Result<Option<TitleState>> {
        let url = format!("{}/api/lookup?titleid={}", self.base_url, title.id);

        let payload = match self.transport.get_json(&url).await {
            Ok(payload) => payload,
            Err(e) if e.is_transient() => {
                warn!("{} lookup for {} failed, {}", self.platform, title.id, e);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(parse_lookup(
            &payload,
            self.platform,
            self.base_url,
            &title.id,
        ))
    }
}

/// Normalize a patches-API lookup payload into title state.
fn parse_lookup(
    payload: &serde_json::Value,
    platform: Platform,
    base_url: &str,
    title_id: &str,
) -> Option<TitleState> {
    if payload.get("success").and_then(|v| v.as_bool()) != Some(true) {
        debug!("{} lookup for {} reported failure", platform, title_id);
        return None;
    }

    let metadata = payload.get("metadata")?;
    let name = metadata.get("name")?.as_str()?.to_string();
    let current_version = metadata.get("currentVersion")?.as_str()?.to_string();

    if current_version.is_empty() {
        warn!("{} title {} has no current version", platform, name);
        return None;
    }

    Some(TitleState {
        platform,
        title_id: title_id.to_string(),
        name,
        current_version,
        region: non_empty(metadata.get("region")),
        url: format!("{}/{}", base_url, title_id),
        thumbnail: non_empty(metadata.get("icon")),
        image: non_empty(metadata.get("background")),
        build_name: None,
        timestamp: None,
        extra: serde_json::Value::Null,
    })
}

/// The API reports absent fields as empty strings.
fn non_empty(value: Option<&serde_json::Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
