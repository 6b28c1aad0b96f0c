// # Discord Webhook Notifier
//
// Notifier implementation delivering title updates as Discord webhook embeds.
//
// ## Delivery semantics
//
// `notify` reports delivery as a plain bool because the reconciler's only
// decision is whether to commit history. Any failure (transport error,
// non-success status) is logged and returned as `false`, which leaves the
// old version in history so the update is re-detected and re-sent on the
// next run. The POST is never retried within a run; a duplicate embed is
// worse than a delayed one.
//
// ## Embed layout
//
// One embed per update: title/url from the platform state, the platform's
// fixed color and footer logo, Previous/Current Version fields rendered as
// diff code blocks, and an optional Build Name field. Image URLs get a
// `?{unix}` suffix appended because the Discord CDN caches aggressively by
// URL and would otherwise serve stale artwork across updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tracing::{debug, warn};

use patchwatch_core::config::WebhookConfig;
use patchwatch_core::traits::Notifier;
use patchwatch_core::UpdateEvent;
use patchwatch_transport::Transport;

/// Discord webhook notifier
pub struct DiscordNotifier {
    webhook_url: String,
    username: Option<String>,
    avatar_url: Option<String>,
    transport: Transport,
}

impl DiscordNotifier {
    pub fn new(config: &WebhookConfig, transport: Transport) -> Self {
        Self {
            webhook_url: config.url.clone(),
            username: config.username.clone(),
            avatar_url: config.avatar_url.clone(),
            transport,
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, event: &UpdateEvent) -> bool {
        let payload = build_payload(
            event,
            self.username.as_deref(),
            self.avatar_url.as_deref(),
            Utc::now(),
        );

        match self.transport.post_json(&self.webhook_url, &payload).await {
            Ok(()) => {
                debug!("delivered update notification for {}", event.name);
                true
            }
            Err(e) => {
                warn!("webhook delivery for {} failed, {}", event.name, e);
                false
            }
        }
    }

    fn notifier_name(&self) -> &'static str {
        "discord"
    }
}

/// Build the webhook payload for one update.
fn build_payload(
    event: &UpdateEvent,
    username: Option<&str>,
    avatar_url: Option<&str>,
    now: DateTime<Utc>,
) -> Value {
    let footer_text = match event.region.as_deref() {
        Some(region) => format!("({}) {}", region, event.title_id),
        None => event.title_id.clone(),
    };

    let mut fields = vec![
        json!({
            "name": "Previous Version",
            "value": format!("```diff\n- {}\n```", event.previous_version),
            "inline": true,
        }),
        json!({
            "name": "Current Version",
            "value": format!("```diff\n+ {}\n```", event.current_version),
            "inline": true,
        }),
    ];

    if let Some(build_name) = &event.build_name {
        fields.push(json!({
            "name": "Build Name",
            "value": format!("```\n{}```", build_name),
            "inline": false,
        }));
    }

    let mut embed = json!({
        "title": event.name,
        "url": event.url,
        "color": event.platform.color(),
        "timestamp": event.timestamp.unwrap_or(now).to_rfc3339(),
        "footer": {
            "text": footer_text,
            "icon_url": event.platform.logo_url(),
        },
        "author": { "name": "patchwatch" },
        "fields": fields,
    });

    if let Some(thumbnail) = &event.thumbnail {
        embed["thumbnail"] = json!({ "url": cache_busted(thumbnail, now) });
    }

    if let Some(image) = &event.image {
        embed["image"] = json!({ "url": cache_busted(image, now) });
    }

    let mut payload = json!({ "embeds": [embed] });

    if let Some(username) = username {
        payload["username"] = json!(username);
    }

    if let Some(avatar_url) = avatar_url {
        payload["avatar_url"] = json!(avatar_url);
    }

    payload
}

/// Append the current unix time so the Discord CDN treats each update's
/// artwork as a fresh URL.
fn cache_busted(url: &str, now: DateTime<Utc>) -> String {
    format!("{}?{}", url, now.timestamp())
}
