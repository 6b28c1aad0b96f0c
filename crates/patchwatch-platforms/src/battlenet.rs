//! Battle.net adapter, backed by the BlizzTrack manifest API.
//!
//! The versions manifest is the source of truth for the version token. Two
//! secondary lookups run only once an update is confirmed:
//!
//! - the fragments endpoint, for icon and key art hashes
//! - the CDN manifest plus one raw config blob, for the human-readable
//!   build name (e.g. `WOW-53877patch11.0.7_Retail`); skipped entirely for
//!   encrypted manifests, whose config blobs are not readable
//!
//! Both are best-effort; a notification goes out without artwork or a build
//! name rather than not at all.
//!
//! BlizzTrack canonicalizes product aliases, so the `tact` identifier from
//! the manifest (not the configured alias) is used as the history key.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, warn};

use patchwatch_core::traits::PlatformAdapter;
use patchwatch_core::{Platform, TitleState, TrackedTitle, UpdateEvent};
use patchwatch_transport::Transport;

const API_BASE: &str = "https://blizztrack.com/api";

/// Battle.net platform adapter
pub struct BattlenetAdapter {
    transport: Transport,
}

impl BattlenetAdapter {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Fetch icon and key art URLs from the fragments endpoint.
    async fn fetch_artwork(&self, title_id: &str) -> (Option<String>, Option<String>) {
        let url = format!("{}/fragments/{}", API_BASE, title_id);

        match self.transport.get_json(&url).await {
            Ok(payload) => (
                artwork_url(&payload, "icon_medium"),
                artwork_url(&payload, "key_art"),
            ),
            Err(e) => {
                debug!("failed to get artwork for Battle.net title {}, {}", title_id, e);
                (None, None)
            }
        }
    }

    /// Resolve the build name by fetching the raw build config blob from the
    /// CDN listed for the selected region.
    async fn fetch_build_name(
        &self,
        title_id: &str,
        region: &str,
        build_config: &str,
    ) -> Option<String> {
        let url = format!("{}/manifest/{}/cdns", API_BASE, title_id);

        let cdns = match self.transport.get_json(&url).await {
            Ok(payload) => payload,
            Err(e) => {
                debug!(
                    "failed to get CDN manifest for Battle.net title {}, {}",
                    title_id, e
                );
                return None;
            }
        };

        let config_url = cdn_config_url(&cdns, region, build_config)?;

        match self.transport.get_text(&config_url).await {
            Ok(config) => build_name_from_config(&config),
            Err(e) => {
                debug!(
                    "failed to get build config for Battle.net title {}, {}",
                    title_id, e
                );
                None
            }
        }
    }
}

#[async_trait]
impl PlatformAdapter for BattlenetAdapter {
    fn platform(&self) -> Platform {
        Platform::Battlenet
    }

    async fn fetch(&self, title: &TrackedTitle) -> patchwatch_core::Result<Option<TitleState>> {
        let url = format!("{}/manifest/{}/versions", API_BASE, title.id);

        let payload = match self.transport.get_json(&url).await {
            Ok(payload) => payload,
            Err(e) if e.is_transient() => {
                warn!("Battle.net lookup for {} failed, {}", title.id, e);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let region = title.region.as_deref().unwrap_or("Americas");
        Ok(parse_versions(&payload, &title.id, region))
    }

    async fn build_event(&self, previous: &str, state: &TitleState) -> UpdateEvent {
        let mut event = UpdateEvent::from_state(previous, state);

        let (thumbnail, image) = self.fetch_artwork(&state.title_id).await;
        event.thumbnail = thumbnail;
        event.image = image;

        let encrypted = state
            .extra
            .get("encrypted")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if !encrypted
            && let (Some(region), Some(build_config)) = (
                state.region.as_deref(),
                state.extra.get("build_config").and_then(|v| v.as_str()),
            )
        {
            event.build_name = self
                .fetch_build_name(&state.title_id, region, build_config)
                .await;
        }

        event
    }
}

/// Normalize a versions manifest into title state, preferring the entry for
/// `region` and falling back to the first listed entry.
fn parse_versions(
    payload: &serde_json::Value,
    configured_id: &str,
    region: &str,
) -> Option<TitleState> {
    if payload.get("success").and_then(|v| v.as_bool()) != Some(true) {
        debug!("Battle.net lookup for {} reported failure", configured_id);
        return None;
    }

    let result = payload.get("result")?;
    let tact = result.get("tact")?.as_str()?.to_string();
    let name = result.get("name")?.as_str()?.to_string();
    let entries = result.get("data")?.as_array()?;

    let entry = entries
        .iter()
        .find(|e| {
            e.get("name")
                .and_then(|v| v.as_str())
                .is_some_and(|n| n.eq_ignore_ascii_case(region))
        })
        .or_else(|| entries.first())?;

    let current_version = entry.get("version_name")?.as_str()?.to_string();
    let entry_region = entry.get("name")?.as_str()?.to_string();
    let build_config = entry.get("build_config").and_then(|v| v.as_str());
    let encrypted = result
        .get("encrypted")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let timestamp = result
        .get("created_at")
        .and_then(|v| v.as_str())
        .and_then(parse_timestamp);

    Some(TitleState {
        platform: Platform::Battlenet,
        url: format!("https://blizztrack.com/view/{}?type=versions", tact),
        title_id: tact,
        name,
        current_version,
        region: Some(entry_region),
        thumbnail: None,
        image: None,
        build_name: None,
        timestamp,
        extra: serde_json::json!({
            "build_config": build_config,
            "encrypted": encrypted,
        }),
    })
}

/// The manifest timestamp is ISO 8601, with or without an offset.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Resolve a named artwork file (`icon_medium`, `key_art`) from a fragments
/// payload to a displayable URL.
///
/// The image is routed through the wsrv.nl proxy because the upstream host
/// does not return a content type Discord will render inline.
fn artwork_url(payload: &serde_json::Value, kind: &str) -> Option<String> {
    if payload.get("success").and_then(|v| v.as_bool()) != Some(true) {
        return None;
    }

    let result = payload.get("result")?;
    let key = result
        .get("products")?
        .get(0)?
        .get("base")?
        .get(kind)?
        .as_str()?;
    let hash = result
        .get("files")?
        .get("default")?
        .get(key)?
        .get("hash")?
        .as_str()?;

    Some(format!(
        "https://wsrv.nl/?url=https://blizzard.blizzmeta.com/{}",
        hash
    ))
}

/// Build the URL of the raw build config blob from a CDN manifest.
///
/// The path layout (`config/xx/yy/xxyy...`) mirrors how the BlizzTrack
/// front-end links build configs.
fn cdn_config_url(payload: &serde_json::Value, region: &str, build_config: &str) -> Option<String> {
    if payload.get("success").and_then(|v| v.as_bool()) != Some(true) {
        return None;
    }

    // The hash comes verbatim from the remote manifest; anything but plain
    // ASCII hex is garbage and must not reach the byte slicing below.
    if build_config.len() < 4 || !build_config.is_ascii() {
        return None;
    }

    let entry = payload
        .get("result")?
        .get("data")?
        .as_array()?
        .iter()
        .find(|e| {
            e.get("name")
                .and_then(|v| v.as_str())
                .is_some_and(|n| n.eq_ignore_ascii_case(region))
        })?;

    let path = entry.get("path")?.as_str()?;
    let host = entry.get("hosts")?.as_str()?.split(' ').next()?;

    Some(format!(
        "http://{}/{}/config/{}/{}/{}",
        host,
        path,
        &build_config[..2],
        &build_config[2..4],
        build_config
    ))
}

/// Extract the `build-name` value from a raw build config blob.
fn build_name_from_config(config: &str) -> Option<String> {
    config
        .lines()
        .find(|line| line.starts_with("build-name"))
        .and_then(|line| line.split(" = ").nth(1))
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn versions_payload() -> serde_json::Value {
        json!({
            "success": true,
            "result": {
                "tact": "wow",
                "name": "World of Warcraft",
                "encrypted": false,
                "created_at": "2024-12-18T22:21:25+00:00",
                "data": [
                    {
                        "name": "Europe",
                        "version_name": "11.0.7.58162",
                        "build_config": "a1b2c3d4e5"
                    },
                    {
                        "name": "Americas",
                        "version_name": "11.0.7.58163",
                        "build_config": "f6a7b8c9d0"
                    }
                ]
            }
        })
    }

    #[test]
    fn prefers_configured_region() {
        let state = parse_versions(&versions_payload(), "wow_classic", "americas").unwrap();

        assert_eq!(state.title_id, "wow");
        assert_eq!(state.name, "World of Warcraft");
        assert_eq!(state.current_version, "11.0.7.58163");
        assert_eq!(state.region.as_deref(), Some("Americas"));
        assert_eq!(
            state.extra.get("build_config").and_then(|v| v.as_str()),
            Some("f6a7b8c9d0")
        );
        assert_eq!(
            state.url,
            "https://blizztrack.com/view/wow?type=versions"
        );
        assert!(state.timestamp.is_some());
    }

    #[test]
    fn falls_back_to_first_entry_for_unknown_region() {
        let state = parse_versions(&versions_payload(), "wow", "Asia").unwrap();

        assert_eq!(state.region.as_deref(), Some("Europe"));
        assert_eq!(state.current_version, "11.0.7.58162");
    }

    #[test]
    fn encrypted_flag_is_carried() {
        let mut payload = versions_payload();
        payload["result"]["encrypted"] = json!(true);

        let state = parse_versions(&payload, "wow", "Americas").unwrap();
        assert_eq!(
            state.extra.get("encrypted").and_then(|v| v.as_bool()),
            Some(true)
        );
    }

    #[test]
    fn unsuccessful_manifest_is_skipped() {
        let payload = json!({ "success": false });
        assert!(parse_versions(&payload, "wow", "Americas").is_none());
    }

    #[test]
    fn artwork_url_resolves_hash() {
        let payload = json!({
            "success": true,
            "result": {
                "products": [
                    { "base": { "icon_medium": "icon.png", "key_art": "keyart.png" } }
                ],
                "files": {
                    "default": {
                        "icon.png": { "hash": "abc123" },
                        "keyart.png": { "hash": "def456" }
                    }
                }
            }
        });

        assert_eq!(
            artwork_url(&payload, "icon_medium").as_deref(),
            Some("https://wsrv.nl/?url=https://blizzard.blizzmeta.com/abc123")
        );
        assert_eq!(
            artwork_url(&payload, "key_art").as_deref(),
            Some("https://wsrv.nl/?url=https://blizzard.blizzmeta.com/def456")
        );
    }

    fn cdns_payload() -> serde_json::Value {
        json!({
            "success": true,
            "result": {
                "data": [
                    {
                        "name": "Americas",
                        "path": "tpr/wow",
                        "hosts": "us.cdn.blizzard.com eu.cdn.blizzard.com"
                    }
                ]
            }
        })
    }

    #[test]
    fn cdn_config_url_splits_hash_prefixes() {
        assert_eq!(
            cdn_config_url(&cdns_payload(), "americas", "f6a7b8c9d0").as_deref(),
            Some("http://us.cdn.blizzard.com/tpr/wow/config/f6/a7/f6a7b8c9d0")
        );
    }

    #[test]
    fn cdn_config_url_rejects_malformed_hashes() {
        // Too short, or multi-byte characters near the prefix split points.
        assert_eq!(cdn_config_url(&cdns_payload(), "americas", "f6a"), None);
        assert_eq!(cdn_config_url(&cdns_payload(), "americas", "a\u{00e9}bcdef"), None);
        assert_eq!(cdn_config_url(&cdns_payload(), "americas", "ab\u{00e9}cdef"), None);
    }

    #[test]
    fn build_name_parsed_from_config_blob() {
        let config = "# Build Configuration\n\nroot = abc\nbuild-name = WOW-53877patch11.0.7_Retail\nbuild-uid = wow\n";
        assert_eq!(
            build_name_from_config(config).as_deref(),
            Some("WOW-53877patch11.0.7_Retail")
        );
    }

    #[test]
    fn missing_build_name_yields_none() {
        assert_eq!(build_name_from_config("root = abc\n"), None);
    }
}
