//! Media state reader.
//!
//! Locates the page's primary media element and reports normalized
//! snapshots. Resolution is weak by design: the probe keeps the last known
//! node id purely as a performance fallback and re-resolves on every read,
//! so a page that silently swaps its player never leaves the probe holding
//! a dead handle as truth.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use watchdeck_core_types::{MediaSnapshot, QualityTier};
use watchdeck_page_dom::{DomError, NodeId, PageDom};

const MEDIA_SELECTOR: &str = "video";
const SUBTITLE_TRACK_SELECTOR: &str = "video track[kind=\"subtitles\"]";

/// Playback position advance applied by `skip_forward`.
const SKIP_STEP_SECS: f64 = 10.0;

/// Fixed visual-filter adjustment applied by `enhance`.
const ENHANCE_FILTER: &str = "contrast(1.05) saturate(1.1) brightness(1.02)";

#[derive(Debug, Error, Clone)]
pub enum ProbeError {
    #[error("No video player found")]
    NoPlayer,
}

impl From<DomError> for ProbeError {
    // Any per-node failure means the element went away between resolution
    // and the operation; callers observe that as "no player".
    fn from(err: DomError) -> Self {
        debug!(%err, "media operation failed, treating element as gone");
        ProbeError::NoPlayer
    }
}

pub struct MediaProbe {
    dom: Arc<dyn PageDom>,
    last_known: Mutex<Option<NodeId>>,
}

impl MediaProbe {
    pub fn new(dom: Arc<dyn PageDom>) -> Arc<Self> {
        Arc::new(Self {
            dom,
            last_known: Mutex::new(None),
        })
    }

    /// Locate the primary media element.
    ///
    /// A fresh document query wins; the remembered element is only returned
    /// while it is still attached. Never errors.
    pub async fn resolve(&self) -> Option<NodeId> {
        match self.dom.query_first(MEDIA_SELECTOR).await {
            Ok(Some(node)) => {
                *self.last_known.lock() = Some(node);
                Some(node)
            }
            Ok(None) | Err(_) => {
                let remembered = *self.last_known.lock();
                match remembered {
                    Some(node) if self.dom.is_attached(node).await => Some(node),
                    _ => {
                        *self.last_known.lock() = None;
                        None
                    }
                }
            }
        }
    }

    async fn require(&self) -> Result<NodeId, ProbeError> {
        self.resolve().await.ok_or(ProbeError::NoPlayer)
    }

    /// Full media snapshot. Always well-formed: with no media element the
    /// defaulted snapshot is returned rather than an error.
    pub async fn snapshot(&self, visible_overlays: u32) -> MediaSnapshot {
        let fullscreen = self.dom.fullscreen_element().await.is_some();
        let media_element_count = self
            .dom
            .query_all(MEDIA_SELECTOR)
            .await
            .map(|nodes| nodes.len() as u32)
            .unwrap_or(0);

        let Some(node) = self.resolve().await else {
            return MediaSnapshot::absent(fullscreen, visible_overlays, media_element_count);
        };
        let Some(props) = self.dom.media_props(node).await else {
            return MediaSnapshot::absent(fullscreen, visible_overlays, media_element_count);
        };

        let subtitles_available = self
            .dom
            .query_all(SUBTITLE_TRACK_SELECTOR)
            .await
            .map(|tracks| !tracks.is_empty())
            .unwrap_or(false);

        MediaSnapshot {
            playing: !props.paused,
            volume_level: (props.volume * 100.0).round() as u8,
            muted: props.muted,
            current_time_sec: props.current_time.max(0.0) as u64,
            duration_sec: props.duration.max(0.0) as u64,
            fullscreen,
            quality: QualityTier::from_height(props.video_height),
            subtitles_available,
            overlay_count: visible_overlays,
            media_element_count,
        }
    }

    /// Toggle playback; returns whether the element is now playing.
    pub async fn toggle_play(&self) -> Result<bool, ProbeError> {
        let node = self.require().await?;
        let props = self.dom.media_props(node).await.ok_or(ProbeError::NoPlayer)?;
        if props.paused {
            self.dom.media_play(node).await?;
            Ok(true)
        } else {
            self.dom.media_pause(node).await?;
            Ok(false)
        }
    }

    /// Flip the muted flag; returns the new value.
    pub async fn toggle_mute(&self) -> Result<bool, ProbeError> {
        let node = self.require().await?;
        let props = self.dom.media_props(node).await.ok_or(ProbeError::NoPlayer)?;
        let next = !props.muted;
        self.dom.media_set_muted(node, next).await?;
        Ok(next)
    }

    /// Set the volume as a percentage, clamped to `[0, 100]`, and unmute.
    /// Returns the applied percentage.
    pub async fn set_volume(&self, percent: i64) -> Result<u8, ProbeError> {
        let node = self.require().await?;
        let clamped = percent.clamp(0, 100) as u8;
        self.dom
            .media_set_volume(node, f64::from(clamped) / 100.0)
            .await?;
        self.dom.media_set_muted(node, false).await?;
        Ok(clamped)
    }

    pub async fn skip_forward(&self) -> Result<(), ProbeError> {
        let node = self.require().await?;
        self.dom.media_seek_by(node, SKIP_STEP_SECS).await?;
        Ok(())
    }

    pub async fn enhance(&self) -> Result<(), ProbeError> {
        let node = self.require().await?;
        self.dom.media_set_filter(node, ENHANCE_FILTER).await?;
        Ok(())
    }
}
