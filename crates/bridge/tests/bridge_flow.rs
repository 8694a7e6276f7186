use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::sleep;

use watchdeck_bridge::{AgentConfig, FlagStore, MemoryFlagStore, PageAgent, PageBridge, PanelButton};
use watchdeck_core_types::EngineState;
use watchdeck_page_dom::{MediaState, MemoryDom, PageDom};
use watchdeck_suppressor::SuppressorConfig;

const SETTLE: Duration = Duration::from_millis(150);

fn test_agent_config() -> AgentConfig {
    AgentConfig {
        suppressor: SuppressorConfig {
            debounce: Duration::from_millis(25),
            resweep: Duration::from_secs(3600),
        },
        status_poll: Duration::from_millis(40),
        ..AgentConfig::default()
    }
}

struct Fixture {
    dom: Arc<MemoryDom>,
    bridge: Arc<PageBridge>,
}

fn fixture() -> Fixture {
    let dom = MemoryDom::new();
    let agent = PageAgent::new(dom.clone(), test_agent_config());
    let bridge = PageBridge::new(agent);
    Fixture { dom, bridge }
}

#[tokio::test]
async fn requests_while_disabled_fail_fixed_and_side_effect_free() {
    let fx = fixture();
    // Never bootstrapped: the bridge starts out disabled.
    let suppressor = fx.bridge.agent().suppressor();
    let sweeps_before = suppressor.metrics().sweeps;

    let response = fx
        .bridge
        .handle_request(json!({ "action": "removeOverlays" }))
        .await;

    assert_eq!(
        response,
        json!({ "success": false, "message": "Extension is disabled." })
    );
    assert_eq!(suppressor.metrics().sweeps, sweeps_before);
}

#[tokio::test]
async fn bootstrap_defaults_to_enabled() {
    let fx = fixture();
    let flags = MemoryFlagStore::new();
    fx.bridge.bootstrap(flags.as_ref()).await;

    assert!(fx.bridge.is_enabled());
    assert_eq!(fx.bridge.agent().state(), EngineState::Running);
    assert!(fx.bridge.agent().has_surface());
}

#[tokio::test]
async fn bootstrap_honors_a_persisted_disable() {
    let fx = fixture();
    let flags = MemoryFlagStore::with_enabled(false);
    fx.bridge.bootstrap(flags.as_ref()).await;

    assert!(!fx.bridge.is_enabled());
    assert_eq!(fx.bridge.agent().state(), EngineState::Uninitialized);
    assert!(!fx.bridge.agent().has_surface());
}

#[tokio::test]
async fn success_payload_is_flattened_into_the_response() {
    let fx = fixture();
    fx.dom
        .append_media_element(fx.dom.body(), MediaState::default());
    fx.bridge.bootstrap(MemoryFlagStore::new().as_ref()).await;

    let response = fx
        .bridge
        .handle_request(json!({ "action": "playPause" }))
        .await;
    assert_eq!(response["success"], Value::Bool(true));
    assert_eq!(response["isPlaying"], Value::Bool(true));
    assert!(response.get("payload").is_none());

    let volume = fx
        .bridge
        .handle_request(json!({ "action": "setVolume", "volume": 150 }))
        .await;
    assert_eq!(volume["success"], Value::Bool(true));
    assert_eq!(volume["volume"], json!(100));
    assert_eq!(volume["muted"], Value::Bool(false));
}

#[tokio::test]
async fn failures_carry_only_success_and_message() {
    let fx = fixture();
    fx.bridge.bootstrap(MemoryFlagStore::new().as_ref()).await;

    let response = fx
        .bridge
        .handle_request(json!({ "action": "doStuff" }))
        .await;
    assert_eq!(
        response,
        json!({ "success": false, "message": "Unknown action: doStuff" })
    );

    let missing = fx.bridge.handle_request(json!({ "volume": 10 })).await;
    assert_eq!(missing["success"], Value::Bool(false));
}

#[tokio::test]
async fn disable_then_enable_leaves_exactly_one_subscription() {
    let fx = fixture();
    fx.bridge.bootstrap(MemoryFlagStore::new().as_ref()).await;

    fx.bridge.apply_enabled(false).await;
    sleep(SETTLE).await;
    assert_eq!(fx.dom.mutation_subscriber_count(), 0);
    assert!(!fx.bridge.agent().has_surface());

    fx.bridge.apply_enabled(true).await;
    sleep(SETTLE).await;
    assert_eq!(fx.dom.mutation_subscriber_count(), 1);
    assert!(fx.bridge.agent().has_surface());

    // Teardown count equals setup count after a second full cycle.
    fx.bridge.apply_enabled(false).await;
    sleep(SETTLE).await;
    let metrics = fx.bridge.agent().suppressor().metrics();
    assert_eq!(metrics.starts, metrics.stops);
    assert_eq!(fx.dom.mutation_subscriber_count(), 0);
}

#[tokio::test]
async fn redundant_broadcasts_are_ignored() {
    let fx = fixture();
    fx.bridge.bootstrap(MemoryFlagStore::new().as_ref()).await;
    let starts_before = fx.bridge.agent().suppressor().metrics().starts;

    fx.bridge.apply_enabled(true).await;
    fx.bridge.apply_enabled(true).await;
    assert_eq!(
        fx.bridge.agent().suppressor().metrics().starts,
        starts_before
    );

    fx.bridge.apply_enabled(false).await;
    fx.bridge.apply_enabled(false).await;
    let metrics = fx.bridge.agent().suppressor().metrics();
    assert_eq!(metrics.stops, 1);
}

#[tokio::test]
async fn flag_watch_loop_drives_the_lifecycle() {
    let fx = fixture();
    let flags = MemoryFlagStore::new();
    let cancel = tokio_util::sync::CancellationToken::new();
    let handle = tokio::spawn(
        fx.bridge
            .clone()
            .run(flags.clone() as Arc<dyn watchdeck_bridge::FlagStore>, cancel.clone()),
    );
    sleep(SETTLE).await;
    assert_eq!(fx.bridge.agent().state(), EngineState::Running);

    flags.write_enabled(false).await;
    sleep(SETTLE).await;
    assert_eq!(fx.bridge.agent().state(), EngineState::Deactivated);
    assert!(!fx.bridge.is_enabled());

    flags.write_enabled(true).await;
    sleep(SETTLE).await;
    assert_eq!(fx.bridge.agent().state(), EngineState::Running);

    cancel.cancel();
    let _ = handle.await;
}

#[tokio::test]
async fn panel_ticker_tracks_media_state() {
    let fx = fixture();
    let video = fx
        .dom
        .append_media_element(fx.dom.body(), MediaState::default());
    fx.bridge.bootstrap(MemoryFlagStore::new().as_ref()).await;

    fx.dom.update_media(video, |state| {
        state.paused = false;
        state.volume = 0.3;
    });
    sleep(SETTLE).await;

    let panel = fx.bridge.agent().panel_state().expect("surface is up");
    assert!(panel.is_playing);
    assert_eq!(panel.volume, 30);
    assert!(!panel.muted);
}

#[tokio::test]
async fn panel_buttons_and_slider_reach_the_dispatcher() {
    let fx = fixture();
    let video = fx
        .dom
        .append_media_element(fx.dom.body(), MediaState::default());
    fx.bridge.bootstrap(MemoryFlagStore::new().as_ref()).await;

    let pressed = fx
        .bridge
        .agent()
        .press_panel_button(PanelButton::PlayPause)
        .await
        .expect("surface is up");
    assert!(pressed.is_ok());
    assert!(!fx.dom.media_props(video).await.unwrap().paused);

    let slid = fx
        .bridge
        .agent()
        .slide_panel_volume(65)
        .await
        .expect("surface is up");
    assert_eq!(slid.field("volume"), Some(&json!(65)));

    fx.bridge.apply_enabled(false).await;
    assert!(fx
        .bridge
        .agent()
        .press_panel_button(PanelButton::Mute)
        .await
        .is_none());
}

#[tokio::test]
async fn panel_marker_exists_iff_running() {
    let fx = fixture();
    fx.bridge.bootstrap(MemoryFlagStore::new().as_ref()).await;
    let markers = fx
        .dom
        .query_all("aside[data-role=\"watchdeck-panel\"]")
        .await
        .unwrap();
    assert_eq!(markers.len(), 1);

    fx.bridge.apply_enabled(false).await;
    let markers = fx
        .dom
        .query_all("aside[data-role=\"watchdeck-panel\"]")
        .await
        .unwrap();
    assert!(markers.is_empty());

    // A fresh enable mounts exactly one surface again.
    fx.bridge.apply_enabled(true).await;
    let markers = fx
        .dom
        .query_all("aside[data-role=\"watchdeck-panel\"]")
        .await
        .unwrap();
    assert_eq!(markers.len(), 1);
}
