use std::sync::Arc;

use watchdeck_core_types::QualityTier;
use watchdeck_media_probe::{MediaProbe, ProbeError};
use watchdeck_page_dom::{MediaState, MemoryDom, PageDom};

fn dom_with_video(height: u32) -> (Arc<MemoryDom>, watchdeck_page_dom::NodeId) {
    let dom = MemoryDom::new();
    let video = dom.append_media_element(
        dom.body(),
        MediaState {
            video_height: height,
            duration: 3600.0,
            ..MediaState::default()
        },
    );
    (dom, video)
}

#[tokio::test]
async fn snapshot_defaults_when_no_media_element() {
    let dom = MemoryDom::new();
    let probe = MediaProbe::new(dom.clone());

    let snapshot = probe.snapshot(3).await;
    assert!(!snapshot.playing);
    assert_eq!(snapshot.volume_level, 50);
    assert!(!snapshot.muted);
    assert_eq!(snapshot.quality, QualityTier::Unknown);
    assert_eq!(snapshot.overlay_count, 3);
    assert_eq!(snapshot.media_element_count, 0);
}

#[tokio::test]
async fn snapshot_reports_live_media_fields() {
    let (dom, video) = dom_with_video(1080);
    dom.update_media(video, |state| {
        state.paused = false;
        state.volume = 0.8;
        state.current_time = 125.9;
    });
    let track = dom.append_child_element(video, "track");
    dom.set_attribute(track, "kind", "subtitles");

    let probe = MediaProbe::new(dom.clone());
    let snapshot = probe.snapshot(0).await;
    assert!(snapshot.playing);
    assert_eq!(snapshot.volume_level, 80);
    assert_eq!(snapshot.current_time_sec, 125);
    assert_eq!(snapshot.duration_sec, 3600);
    assert_eq!(snapshot.quality, QualityTier::P1080);
    assert!(snapshot.subtitles_available);
    assert_eq!(snapshot.media_element_count, 1);
}

#[tokio::test]
async fn zero_height_video_reports_0p() {
    let (dom, _) = dom_with_video(0);
    let probe = MediaProbe::new(dom.clone());
    let snapshot = probe.snapshot(0).await;
    assert_eq!(snapshot.quality.to_string(), "0p");
}

#[tokio::test]
async fn resolve_forgets_a_detached_element() {
    let (dom, video) = dom_with_video(720);
    let probe = MediaProbe::new(dom.clone());

    assert_eq!(probe.resolve().await, Some(video));

    dom.remove(video).await.unwrap();
    assert_eq!(probe.resolve().await, None);
    assert!(matches!(
        probe.toggle_play().await,
        Err(ProbeError::NoPlayer)
    ));
}

#[tokio::test]
async fn resolve_prefers_a_fresh_document_query() {
    let (dom, first) = dom_with_video(720);
    let probe = MediaProbe::new(dom.clone());
    assert_eq!(probe.resolve().await, Some(first));

    // The page swaps its player: the stale id must not win.
    dom.remove(first).await.unwrap();
    let second = dom.append_media_element(dom.body(), MediaState::default());
    assert_eq!(probe.resolve().await, Some(second));
}

#[tokio::test]
async fn set_volume_clamps_and_unmutes() {
    let (dom, video) = dom_with_video(720);
    dom.update_media(video, |state| state.muted = true);
    let probe = MediaProbe::new(dom.clone());

    assert_eq!(probe.set_volume(150).await.unwrap(), 100);
    assert_eq!(probe.set_volume(-5).await.unwrap(), 0);
    let props = dom.media_props(video).await.unwrap();
    assert!(!props.muted);
    assert_eq!(props.volume, 0.0);
}

#[tokio::test]
async fn toggle_mute_is_an_involution() {
    let (dom, video) = dom_with_video(720);
    let probe = MediaProbe::new(dom.clone());

    let initial = dom.media_props(video).await.unwrap().muted;
    let flipped = probe.toggle_mute().await.unwrap();
    assert_ne!(initial, flipped);
    let restored = probe.toggle_mute().await.unwrap();
    assert_eq!(initial, restored);
}

#[tokio::test]
async fn skip_and_enhance_touch_the_element() {
    let (dom, video) = dom_with_video(720);
    let probe = MediaProbe::new(dom.clone());

    probe.skip_forward().await.unwrap();
    probe.skip_forward().await.unwrap();
    let props = dom.media_props(video).await.unwrap();
    assert_eq!(props.current_time, 20.0);

    probe.enhance().await.unwrap();
    let props = dom.media_props(video).await.unwrap();
    assert_eq!(
        props.filter.as_deref(),
        Some("contrast(1.05) saturate(1.1) brightness(1.02)")
    );
}
