//! Floating control surface model.
//!
//! Visual layout is a collaborator concern; this model carries what the
//! surface needs to stay honest: the command buttons, the volume slider
//! and a one-second status ticker that diffs `getStatus` into the panel's
//! own play/volume state. The panel exists only while the agent runs.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use watchdeck_core_types::{ActionRequest, ActionResult};
use watchdeck_dispatch::Dispatcher;
use watchdeck_page_dom::{NodeId, PageDom};

const PANEL_TAG: &str = "aside";
const PANEL_ROLE: &str = "watchdeck-panel";

/// The six fixed command buttons.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PanelButton {
    PlayPause,
    Mute,
    Fullscreen,
    Subtitles,
    Skip,
    RemoveOverlays,
}

impl PanelButton {
    pub const ALL: [PanelButton; 6] = [
        PanelButton::PlayPause,
        PanelButton::Mute,
        PanelButton::Fullscreen,
        PanelButton::Subtitles,
        PanelButton::Skip,
        PanelButton::RemoveOverlays,
    ];

    pub fn action(self) -> &'static str {
        match self {
            PanelButton::PlayPause => "playPause",
            PanelButton::Mute => "toggleMute",
            PanelButton::Fullscreen => "toggleFullscreen",
            PanelButton::Subtitles => "toggleSubtitles",
            PanelButton::Skip => "skipForward",
            PanelButton::RemoveOverlays => "removeOverlays",
        }
    }
}

/// What the surface renders from: kept current by the status ticker.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PanelState {
    pub is_playing: bool,
    pub volume: u8,
    pub muted: bool,
}

pub struct ControlPanel {
    dom: Arc<dyn PageDom>,
    dispatcher: Arc<Dispatcher>,
    marker: Option<NodeId>,
    state: Arc<Mutex<PanelState>>,
    cancel: CancellationToken,
}

impl ControlPanel {
    pub(crate) async fn mount(
        dom: Arc<dyn PageDom>,
        dispatcher: Arc<Dispatcher>,
        poll: Duration,
    ) -> Self {
        let marker = dom
            .append_element(
                None,
                PANEL_TAG,
                &[("data-role".to_string(), PANEL_ROLE.to_string())],
            )
            .await
            .ok();
        let state = Arc::new(Mutex::new(PanelState {
            is_playing: false,
            volume: 50,
            muted: false,
        }));
        let cancel = CancellationToken::new();

        let ticker_state = Arc::clone(&state);
        let ticker_dispatcher = Arc::clone(&dispatcher);
        let ticker_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + poll, poll);
            loop {
                tokio::select! {
                    _ = ticker_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let result = ticker_dispatcher
                            .dispatch(ActionRequest::new("getStatus"))
                            .await;
                        if let Some(next) = panel_state_from(&result) {
                            let mut current = ticker_state.lock();
                            if *current != next {
                                debug!(?next, "panel state refreshed");
                                *current = next;
                            } else {
                                trace!("panel state unchanged");
                            }
                        }
                    }
                }
            }
        });

        Self {
            dom,
            dispatcher,
            marker,
            state,
            cancel,
        }
    }

    /// Press one of the fixed command buttons.
    pub async fn press(&self, button: PanelButton) -> ActionResult {
        self.dispatcher
            .dispatch(ActionRequest::new(button.action()))
            .await
    }

    /// Slider input: issues `setVolume` for every event.
    pub async fn slide_volume(&self, volume: i64) -> ActionResult {
        self.dispatcher
            .dispatch(ActionRequest::new("setVolume").with_param("volume", volume))
            .await
    }

    pub fn state(&self) -> PanelState {
        self.state.lock().clone()
    }

    pub(crate) async fn unmount(&self) {
        self.cancel.cancel();
        if let Some(marker) = self.marker {
            let _ = self.dom.remove(marker).await;
        }
    }
}

fn panel_state_from(result: &ActionResult) -> Option<PanelState> {
    if !result.is_ok() {
        return None;
    }
    Some(PanelState {
        is_playing: result.field("isPlaying")?.as_bool()?,
        volume: result.field("volume")?.as_u64()? as u8,
        muted: result.field("muted")?.as_bool()?,
    })
}
