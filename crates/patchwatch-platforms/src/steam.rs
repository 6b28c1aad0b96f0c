//! Steam adapter, backed by the SteamCMD info API.
//!
//! The version token is the public branch build id. The SteamCMD endpoint is
//! known to time out or return 5xx on a regular basis, so transient failures
//! are logged quietly and skipped rather than surfaced as errors.

use async_trait::async_trait;
use tracing::{debug, warn};

use patchwatch_core::traits::PlatformAdapter;
use patchwatch_core::{Platform, TitleState, TrackedTitle};
use patchwatch_transport::Transport;

const API_BASE: &str = "https://api.steamcmd.net/v1/info";
const CDN_BASE: &str = "https://cdn.cloudflare.steamstatic.com";

/// Steam platform adapter
pub struct SteamAdapter {
    transport: Transport,
}

impl SteamAdapter {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl PlatformAdapter for SteamAdapter {
    fn platform(&self) -> Platform {
        Platform::Steam
    }

    async fn fetch(&self, title: &TrackedTitle) -> patchwatch_core::Result<Option<TitleState>> {
        let url = format!("{}/{}", API_BASE, title.id);

        let payload = match self.transport.get_json(&url).await {
            Ok(payload) => payload,
            Err(e) => return classify_fetch_failure(e, &title.id),
        };

        Ok(parse_app_info(&payload, &title.id))
    }
}

/// Map a transport failure to the per-title outcome.
///
/// The SteamCMD endpoint answers 5xx routinely for delisted or untracked
/// apps, so a transient failure is a quiet cycle skip rather than an error.
fn classify_fetch_failure(
    e: patchwatch_transport::FetchError,
    app_id: &str,
) -> patchwatch_core::Result<Option<TitleState>> {
    if e.is_transient() {
        debug!("Steam lookup for {} failed, {}", app_id, e);
        Ok(None)
    } else {
        Err(e.into())
    }
}

/// Normalize a SteamCMD info payload into title state.
fn parse_app_info(payload: &serde_json::Value, app_id: &str) -> Option<TitleState> {
    if payload.get("status").and_then(|v| v.as_str()) != Some("success") {
        debug!("Steam lookup for {} reported failure", app_id);
        return None;
    }

    let app = payload.get("data")?.get(app_id)?;
    let common = app.get("common")?;
    let name = common.get("name")?.as_str()?.to_string();

    let Some(build_id) = app
        .get("depots")
        .and_then(|d| d.get("branches"))
        .and_then(|b| b.get("public"))
        .and_then(|p| p.get("buildid"))
        .and_then(version_token)
    else {
        warn!("failed to determine current version for Steam title {}", name);
        return None;
    };

    let thumbnail = common
        .get("icon")
        .and_then(|v| v.as_str())
        .filter(|icon| !icon.is_empty())
        .map(|icon| {
            format!(
                "{}/steamcommunity/public/images/apps/{}/{}.jpg",
                CDN_BASE, app_id, icon
            )
        });

    Some(TitleState {
        platform: Platform::Steam,
        title_id: app_id.to_string(),
        name,
        current_version: build_id,
        region: None,
        url: format!("https://steamdb.info/app/{}/patchnotes/", app_id),
        thumbnail,
        image: Some(format!("{}/steam/apps/{}/header.jpg", CDN_BASE, app_id)),
        build_name: None,
        timestamp: None,
        extra: serde_json::Value::Null,
    })
}

/// Build ids arrive as strings but have been observed as bare numbers.
fn version_token(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> serde_json::Value {
        json!({
            "status": "success",
            "data": {
                "1938090": {
                    "common": {
                        "name": "Call of Duty",
                        "icon": "e3a816c4bbef4f7cf29ca6d0a4a3c4d364b1dfca"
                    },
                    "depots": {
                        "branches": {
                            "public": { "buildid": "13066848" }
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn parses_app_info() {
        let state = parse_app_info(&payload(), "1938090").unwrap();

        assert_eq!(state.platform, Platform::Steam);
        assert_eq!(state.name, "Call of Duty");
        assert_eq!(state.current_version, "13066848");
        assert_eq!(state.url, "https://steamdb.info/app/1938090/patchnotes/");
        assert_eq!(
            state.thumbnail.as_deref(),
            Some(
                "https://cdn.cloudflare.steamstatic.com/steamcommunity/public/images/apps/1938090/e3a816c4bbef4f7cf29ca6d0a4a3c4d364b1dfca.jpg"
            )
        );
        assert_eq!(
            state.image.as_deref(),
            Some("https://cdn.cloudflare.steamstatic.com/steam/apps/1938090/header.jpg")
        );
    }

    #[test]
    fn non_success_status_is_skipped() {
        let payload = json!({ "status": "error" });
        assert!(parse_app_info(&payload, "1938090").is_none());
    }

    #[test]
    fn missing_build_id_is_skipped() {
        let mut payload = payload();
        payload["data"]["1938090"]
            .as_object_mut()
            .unwrap()
            .remove("depots");

        assert!(parse_app_info(&payload, "1938090").is_none());
    }

    #[test]
    fn flaky_server_error_is_a_cycle_skip() {
        let e = patchwatch_transport::FetchError::Status {
            url: "https://api.steamcmd.net/v1/info/1938090".to_string(),
            status: 500,
        };

        assert!(matches!(classify_fetch_failure(e, "1938090"), Ok(None)));
    }

    #[test]
    fn permanent_failure_propagates() {
        let e = patchwatch_transport::FetchError::Status {
            url: "https://api.steamcmd.net/v1/info/1938090".to_string(),
            status: 404,
        };

        assert!(classify_fetch_failure(e, "1938090").is_err());
    }

    #[test]
    fn numeric_build_id_is_stringified() {
        let mut payload = payload();
        payload["data"]["1938090"]["depots"]["branches"]["public"]["buildid"] = json!(13066848);

        let state = parse_app_info(&payload, "1938090").unwrap();
        assert_eq!(state.current_version, "13066848");
    }
}
