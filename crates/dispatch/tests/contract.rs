use std::sync::Arc;

use serde_json::{json, Value};
use url::Url;

use watchdeck_core_types::{ActionRequest, ActionResult};
use watchdeck_dispatch::{
    pending, ActionCtx, ActionRegistry, DispatchError, Dispatcher, HandlerOutcome, Payload,
};
use watchdeck_media_probe::MediaProbe;
use watchdeck_page_dom::{MediaState, MemoryDom, NodeId, PageDom};
use watchdeck_suppressor::{Suppressor, SuppressorConfig};

struct Fixture {
    dom: Arc<MemoryDom>,
    dispatcher: Arc<Dispatcher>,
    suppressor: Arc<Suppressor>,
}

fn fixture() -> Fixture {
    let dom = MemoryDom::new();
    let probe = MediaProbe::new(dom.clone());
    let suppressor = Suppressor::new(dom.clone(), SuppressorConfig::default());
    let ctx = ActionCtx::new(
        dom.clone(),
        probe,
        suppressor.clone(),
        Url::parse("https://www.netflix.com/browse").unwrap(),
    );
    let dispatcher = Dispatcher::new(ActionRegistry::with_defaults(), ctx);
    Fixture {
        dom,
        dispatcher,
        suppressor,
    }
}

fn add_video(dom: &MemoryDom) -> NodeId {
    dom.append_media_element(dom.body(), MediaState::default())
}

#[tokio::test]
async fn unknown_action_names_the_request_and_invokes_nothing() {
    let fx = fixture();
    let before = fx.suppressor.metrics().sweeps;

    let result = fx
        .dispatcher
        .dispatch(ActionRequest::new("doStuff"))
        .await;

    assert_eq!(result.message(), Some("Unknown action: doStuff"));
    assert_eq!(fx.suppressor.metrics().sweeps, before);
}

#[tokio::test]
async fn get_status_never_fails_without_media() {
    let fx = fixture();
    let result = fx.dispatcher.dispatch(ActionRequest::new("getStatus")).await;

    assert!(result.is_ok());
    assert_eq!(result.field("connection"), Some(&json!("Connected")));
    assert_eq!(result.field("isPlaying"), Some(&json!(false)));
    assert_eq!(result.field("volume"), Some(&json!(50)));
    assert_eq!(result.field("muted"), Some(&json!(false)));
    assert_eq!(result.field("quality"), Some(&json!("Unknown")));
    assert_eq!(result.field("videoCount"), Some(&json!(0)));
}

#[tokio::test]
async fn get_status_counts_visible_overlays() {
    let fx = fixture();
    let overlay = fx.dom.append_child_element(fx.dom.body(), "div");
    fx.dom.set_attribute(overlay, "class", "interstitial");

    let result = fx.dispatcher.dispatch(ActionRequest::new("getStatus")).await;
    assert_eq!(result.field("overlayCount"), Some(&json!(1)));
}

#[tokio::test]
async fn play_pause_round_trip() {
    let fx = fixture();
    add_video(&fx.dom);

    let started = fx.dispatcher.dispatch(ActionRequest::new("playPause")).await;
    assert_eq!(started.field("isPlaying"), Some(&json!(true)));

    let stopped = fx.dispatcher.dispatch(ActionRequest::new("playPause")).await;
    assert_eq!(stopped.field("isPlaying"), Some(&json!(false)));
}

#[tokio::test]
async fn play_pause_without_media_reports_not_found() {
    let fx = fixture();
    let result = fx.dispatcher.dispatch(ActionRequest::new("playPause")).await;
    assert_eq!(result.message(), Some("No video player found"));
}

#[tokio::test]
async fn toggle_mute_is_its_own_inverse() {
    let fx = fixture();
    add_video(&fx.dom);

    let first = fx.dispatcher.dispatch(ActionRequest::new("toggleMute")).await;
    assert_eq!(first.field("muted"), Some(&json!(true)));
    let second = fx.dispatcher.dispatch(ActionRequest::new("toggleMute")).await;
    assert_eq!(second.field("muted"), Some(&json!(false)));
}

#[tokio::test]
async fn set_volume_clamps_instead_of_rejecting() {
    let fx = fixture();
    add_video(&fx.dom);

    let high = fx
        .dispatcher
        .dispatch(ActionRequest::new("setVolume").with_param("volume", 150))
        .await;
    assert_eq!(high.field("volume"), Some(&json!(100)));
    assert_eq!(high.field("muted"), Some(&json!(false)));

    let low = fx
        .dispatcher
        .dispatch(ActionRequest::new("setVolume").with_param("volume", -5))
        .await;
    assert_eq!(low.field("volume"), Some(&json!(0)));
    assert_eq!(low.field("muted"), Some(&json!(false)));
}

#[tokio::test]
async fn set_volume_accepts_numeric_strings() {
    let fx = fixture();
    add_video(&fx.dom);

    let result = fx
        .dispatcher
        .dispatch(ActionRequest::new("setVolume").with_param("volume", "73"))
        .await;
    assert_eq!(result.field("volume"), Some(&json!(73)));
}

#[tokio::test]
async fn set_volume_with_garbage_fails_synchronously() {
    let fx = fixture();
    add_video(&fx.dom);

    let result = fx
        .dispatcher
        .dispatch(ActionRequest::new("setVolume").with_param("volume", "loud"))
        .await;
    assert_eq!(result.message(), Some("volume must be a number"));
}

#[tokio::test]
async fn toggle_fullscreen_round_trip_and_rejection() {
    let fx = fixture();

    let entered = fx
        .dispatcher
        .dispatch(ActionRequest::new("toggleFullscreen"))
        .await;
    assert_eq!(entered.field("fullscreen"), Some(&json!(true)));

    let exited = fx
        .dispatcher
        .dispatch(ActionRequest::new("toggleFullscreen"))
        .await;
    assert_eq!(exited.field("fullscreen"), Some(&json!(false)));

    fx.dom.set_fullscreen_denied(true);
    let denied = fx
        .dispatcher
        .dispatch(ActionRequest::new("toggleFullscreen"))
        .await;
    assert_eq!(
        denied.message(),
        Some("Fullscreen toggle failed: fullscreen request rejected")
    );
    // A rejected request leaves the document state untouched.
    assert!(fx.dom.fullscreen_element().await.is_none());
}

#[tokio::test]
async fn subtitles_and_quality_reach_the_same_control() {
    let fx = fixture();
    let control = fx.dom.append_child_element(fx.dom.body(), "button");
    fx.dom
        .set_attribute(control, "aria-label", "Audio & Subtitles");

    let subtitles = fx
        .dispatcher
        .dispatch(ActionRequest::new("toggleSubtitles"))
        .await;
    assert_eq!(
        subtitles.field("message"),
        Some(&json!("Audio & Subtitles menu opened successfully"))
    );

    let quality = fx
        .dispatcher
        .dispatch(ActionRequest::new("toggleQuality"))
        .await;
    assert_eq!(quality.field("message"), Some(&json!("Quality menu opened")));

    assert_eq!(fx.dom.clicks(), vec![control, control]);
}

#[tokio::test]
async fn subtitles_without_control_reports_not_found() {
    let fx = fixture();
    let result = fx
        .dispatcher
        .dispatch(ActionRequest::new("toggleSubtitles"))
        .await;
    assert_eq!(result.message(), Some("Audio & Subtitles control not found"));

    let quality = fx
        .dispatcher
        .dispatch(ActionRequest::new("toggleQuality"))
        .await;
    assert_eq!(quality.message(), Some("Quality control not found"));
}

#[tokio::test]
async fn remove_overlays_reports_structural_count_only() {
    let fx = fixture();
    let structural = fx.dom.append_child_element(fx.dom.body(), "div");
    fx.dom.set_attribute(structural, "class", "billboard-modal");
    let container = fx.dom.append_child_element(fx.dom.body(), "div");
    fx.dom.set_attribute(container, "class", "promo-popup");
    let leaf = fx.dom.append_child_element(container, "span");
    fx.dom.set_text(leaf, "Skip Intro");

    let result = fx
        .dispatcher
        .dispatch(ActionRequest::new("removeOverlays"))
        .await;
    assert_eq!(result.field("count"), Some(&json!(1)));
    assert_eq!(result.field("message"), Some(&json!("Removed 1 overlays")));
    assert!(!fx.dom.is_attached(container).await);
}

#[tokio::test]
async fn go_home_navigates_fire_and_forget() {
    let fx = fixture();
    let result = fx.dispatcher.dispatch(ActionRequest::new("goHome")).await;
    assert_eq!(result.field("message"), Some(&json!("Navigating to home")));
    assert_eq!(
        fx.dom.navigations(),
        vec!["https://www.netflix.com/browse".to_string()]
    );
}

#[tokio::test]
async fn skip_forward_advances_ten_seconds() {
    let fx = fixture();
    let video = add_video(&fx.dom);
    fx.dom.update_media(video, |state| state.duration = 600.0);

    let result = fx.dispatcher.dispatch(ActionRequest::new("skipForward")).await;
    assert_eq!(
        result.field("message"),
        Some(&json!("Skipped forward 10 seconds"))
    );
    assert_eq!(fx.dom.media_props(video).await.unwrap().current_time, 10.0);
}

#[tokio::test]
async fn enhance_video_applies_the_fixed_filter() {
    let fx = fixture();
    let video = add_video(&fx.dom);

    let result = fx
        .dispatcher
        .dispatch(ActionRequest::new("enhanceVideo"))
        .await;
    assert_eq!(
        result.field("message"),
        Some(&json!("Video enhancements applied"))
    );
    assert!(fx
        .dom
        .media_props(video)
        .await
        .unwrap()
        .filter
        .is_some());
}

#[tokio::test]
async fn immediate_and_pending_failures_share_one_contract() {
    let fx = fixture();
    let registry = ActionRegistry::with_defaults();
    registry.register("failNow", |_ctx, _params| {
        HandlerOutcome::Immediate(Err(DispatchError::InvalidState("boom".into())))
    });
    registry.register("failLater", |_ctx, _params| {
        pending(async { Err(DispatchError::InvalidState("boom".into())) })
    });
    registry.register("answerNow", |_ctx, _params| {
        let mut payload = Payload::new();
        payload.insert("ready".into(), Value::Bool(true));
        HandlerOutcome::Immediate(Ok(payload))
    });

    let probe = MediaProbe::new(fx.dom.clone());
    let suppressor = Suppressor::new(fx.dom.clone(), SuppressorConfig::default());
    let ctx = ActionCtx::new(
        fx.dom.clone(),
        probe,
        suppressor,
        Url::parse("https://example.com/").unwrap(),
    );
    let dispatcher = Dispatcher::new(registry, ctx);

    let now = dispatcher.dispatch(ActionRequest::new("failNow")).await;
    let later = dispatcher.dispatch(ActionRequest::new("failLater")).await;
    assert_eq!(now, later);
    assert_eq!(now, ActionResult::err("boom"));

    let sync_ok = dispatcher.dispatch(ActionRequest::new("answerNow")).await;
    assert_eq!(sync_ok.field("ready"), Some(&json!(true)));
}
