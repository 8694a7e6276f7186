//! The canonical action handlers.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use watchdeck_page_dom::PageDom;

use crate::context::ActionCtx;
use crate::errors::DispatchError;
use crate::registry::{pending, ActionRegistry, HandlerOutcome, Payload};

/// Selectors that reach the page's audio/subtitle control. The quality
/// action deliberately lands on the same control; the page nests both
/// behind one menu.
const SUBTITLE_CONTROL_SELECTORS: &[&str] = &[
    "[data-uia=\"player-controls-item-button-audio-subtitle\"]",
    "[aria-label=\"Audio & Subtitles\"]",
];

pub(crate) fn install(registry: &ActionRegistry) {
    registry.register("getStatus", |ctx, _params| {
        pending(async move { get_status(ctx).await })
    });
    registry.register("playPause", |ctx, _params| {
        pending(async move { play_pause(ctx).await })
    });
    registry.register("toggleMute", |ctx, _params| {
        pending(async move { toggle_mute(ctx).await })
    });
    registry.register("setVolume", |ctx, params| {
        // Parameter validation fails synchronously, before any page work.
        match parse_volume(&params) {
            Ok(volume) => pending(async move { set_volume(ctx, volume).await }),
            Err(err) => HandlerOutcome::Immediate(Err(err)),
        }
    });
    registry.register("toggleFullscreen", |ctx, _params| {
        pending(async move { toggle_fullscreen(ctx).await })
    });
    registry.register("toggleSubtitles", |ctx, _params| {
        pending(async move { toggle_subtitles(ctx).await })
    });
    registry.register("toggleQuality", |ctx, _params| {
        pending(async move { toggle_quality(ctx).await })
    });
    registry.register("removeOverlays", |ctx, _params| {
        pending(async move { remove_overlays(ctx).await })
    });
    registry.register("goHome", |ctx, _params| {
        pending(async move { go_home(ctx).await })
    });
    registry.register("skipForward", |ctx, _params| {
        pending(async move { skip_forward(ctx).await })
    });
    registry.register("enhanceVideo", |ctx, _params| {
        pending(async move { enhance_video(ctx).await })
    });
}

fn object(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

fn parse_volume(params: &Payload) -> Result<i64, DispatchError> {
    let raw = params
        .get("volume")
        .ok_or_else(|| DispatchError::InvalidState("volume parameter is required".into()))?;
    match raw {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f.round() as i64))
            .ok_or_else(|| DispatchError::InvalidState("volume must be a number".into())),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| DispatchError::InvalidState("volume must be a number".into())),
        _ => Err(DispatchError::InvalidState(
            "volume must be a number".into(),
        )),
    }
}

async fn get_status(ctx: Arc<ActionCtx>) -> Result<Payload, DispatchError> {
    let visible = ctx.suppressor.count_visible().await;
    let snapshot = ctx.probe.snapshot(visible).await;
    let mut payload = serde_json::to_value(&snapshot)
        .map(object)
        .unwrap_or_default();
    payload.insert("connection".into(), Value::String("Connected".into()));
    Ok(payload)
}

async fn play_pause(ctx: Arc<ActionCtx>) -> Result<Payload, DispatchError> {
    let playing = ctx.probe.toggle_play().await?;
    Ok(object(json!({ "isPlaying": playing })))
}

async fn toggle_mute(ctx: Arc<ActionCtx>) -> Result<Payload, DispatchError> {
    let muted = ctx.probe.toggle_mute().await?;
    Ok(object(json!({ "muted": muted })))
}

async fn set_volume(ctx: Arc<ActionCtx>, volume: i64) -> Result<Payload, DispatchError> {
    let applied = ctx.probe.set_volume(volume).await?;
    Ok(object(json!({ "volume": applied, "muted": false })))
}

async fn toggle_fullscreen(ctx: Arc<ActionCtx>) -> Result<Payload, DispatchError> {
    let result = if ctx.dom.fullscreen_element().await.is_none() {
        ctx.dom.request_fullscreen().await
    } else {
        ctx.dom.exit_fullscreen().await
    };
    result.map_err(|err| DispatchError::InvalidState(format!("Fullscreen toggle failed: {err}")))?;
    let fullscreen = ctx.dom.fullscreen_element().await.is_some();
    Ok(object(json!({ "fullscreen": fullscreen })))
}

async fn click_page_control(ctx: &ActionCtx) -> Result<bool, DispatchError> {
    for selector in SUBTITLE_CONTROL_SELECTORS {
        if let Ok(Some(control)) = ctx.dom.query_first(selector).await {
            if ctx.dom.click(control).await.is_ok() {
                debug!(selector, "clicked page control");
                return Ok(true);
            }
        }
    }
    Ok(false)
}

async fn toggle_subtitles(ctx: Arc<ActionCtx>) -> Result<Payload, DispatchError> {
    if click_page_control(&ctx).await? {
        Ok(object(json!({
            "message": "Audio & Subtitles menu opened successfully"
        })))
    } else {
        Err(DispatchError::NotFound(
            "Audio & Subtitles control not found".into(),
        ))
    }
}

async fn toggle_quality(ctx: Arc<ActionCtx>) -> Result<Payload, DispatchError> {
    if click_page_control(&ctx).await? {
        Ok(object(json!({ "message": "Quality menu opened" })))
    } else {
        Err(DispatchError::NotFound("Quality control not found".into()))
    }
}

async fn remove_overlays(ctx: Arc<ActionCtx>) -> Result<Payload, DispatchError> {
    let count = ctx.suppressor.sweep().await;
    Ok(object(json!({
        "message": format!("Removed {count} overlays"),
        "count": count,
    })))
}

async fn go_home(ctx: Arc<ActionCtx>) -> Result<Payload, DispatchError> {
    ctx.dom.navigate(ctx.home_url.as_str()).await;
    Ok(object(json!({ "message": "Navigating to home" })))
}

async fn skip_forward(ctx: Arc<ActionCtx>) -> Result<Payload, DispatchError> {
    ctx.probe.skip_forward().await?;
    Ok(object(json!({ "message": "Skipped forward 10 seconds" })))
}

async fn enhance_video(ctx: Arc<ActionCtx>) -> Result<Payload, DispatchError> {
    ctx.probe.enhance().await?;
    Ok(object(json!({ "message": "Video enhancements applied" })))
}
