//! Seeded demo wiring.
//!
//! Builds an in-memory watch page with a video element and a set of
//! representative overlays, brings the bridge up from the configured flag,
//! and runs controller envelopes against it, printing one JSON response
//! per line.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::info;

use watchdeck_bridge::{MemoryFlagStore, PageAgent, PageBridge};
use watchdeck_page_dom::{MediaState, MemoryDom};

use crate::config::AppConfig;

/// A watch page the way the agent usually finds it: one playing video,
/// a postplay overlay, an interrupt pane and a nag prompt inside a
/// container the heuristics have to find.
pub fn seed_page() -> Arc<MemoryDom> {
    let dom = MemoryDom::new();

    let video = dom.append_media_element(
        dom.body(),
        MediaState {
            paused: false,
            volume: 0.6,
            duration: 2700.0,
            current_time: 310.0,
            video_height: 1080,
            ..MediaState::default()
        },
    );
    let track = dom.append_child_element(video, "track");
    dom.set_attribute(track, "kind", "subtitles");

    let controls = dom.append_child_element(dom.body(), "button");
    dom.set_attribute(controls, "aria-label", "Audio & Subtitles");

    let postplay = dom.append_child_element(dom.body(), "div");
    dom.set_attribute(postplay, "class", "postplay-container");

    let interrupt = dom.append_child_element(dom.body(), "div");
    dom.set_attribute(interrupt, "data-uia", "interrupt-pane");

    let nag = dom.append_child_element(dom.body(), "div");
    dom.set_attribute(nag, "class", "membership-modal-frame");
    let prompt = dom.append_child_element(nag, "p");
    dom.set_text(prompt, "Are you still watching?");

    dom
}

/// The request sequence used when the CLI is given none.
pub fn default_script() -> Vec<Value> {
    vec![
        json!({ "action": "getStatus" }),
        json!({ "action": "removeOverlays" }),
        json!({ "action": "playPause" }),
        json!({ "action": "setVolume", "volume": 80 }),
        json!({ "action": "getStatus" }),
    ]
}

/// Run the demo page against a list of controller envelopes.
pub async fn run(config: &AppConfig, requests: Vec<Value>) -> Result<Vec<Value>> {
    let dom = seed_page();
    let agent = PageAgent::new(dom.clone(), config.agent_config()?);
    let bridge = PageBridge::new(agent);
    let flags = MemoryFlagStore::with_enabled(config.enabled);
    bridge.bootstrap(flags.as_ref()).await;
    info!(enabled = config.enabled, "demo bridge bootstrapped");

    let mut responses = Vec::with_capacity(requests.len());
    for request in requests {
        let response = bridge.handle_request(request).await;
        responses.push(response);
    }

    bridge.apply_enabled(false).await;
    Ok(responses)
}

/// Parse CLI request arguments: raw JSON envelopes, or bare action names
/// as a shorthand.
pub fn parse_requests(args: &[String]) -> Result<Vec<Value>> {
    if args.is_empty() {
        return Ok(default_script());
    }
    args.iter()
        .map(|arg| {
            if arg.trim_start().starts_with('{') {
                serde_json::from_str(arg)
                    .with_context(|| format!("invalid request envelope `{arg}`"))
            } else {
                Ok(json!({ "action": arg }))
            }
        })
        .collect()
}
