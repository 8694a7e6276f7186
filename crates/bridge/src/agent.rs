//! The page agent: one explicit engine object per page context.
//!
//! All lifecycle state lives here as fields, never as ambient globals:
//! the page handle, the media probe, the suppression engine, the control
//! surface and the running flag. Start and shutdown are idempotent.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::info;
use url::Url;

use watchdeck_core_types::{ActionResult, EngineState};
use watchdeck_dispatch::{ActionCtx, ActionRegistry, Dispatcher};
use watchdeck_media_probe::MediaProbe;
use watchdeck_page_dom::PageDom;
use watchdeck_suppressor::{Suppressor, SuppressorConfig};

use crate::panel::{ControlPanel, PanelButton, PanelState};

#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Navigation target for `goHome`.
    pub home_url: Url,
    pub suppressor: SuppressorConfig,
    /// Control-surface status poll cadence.
    pub status_poll: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            home_url: Url::parse("https://www.netflix.com/browse")
                .expect("default home url parses"),
            suppressor: SuppressorConfig::default(),
            status_poll: Duration::from_secs(1),
        }
    }
}

pub struct PageAgent {
    dom: Arc<dyn PageDom>,
    probe: Arc<MediaProbe>,
    suppressor: Arc<Suppressor>,
    dispatcher: Arc<Dispatcher>,
    status_poll: Duration,
    panel: Mutex<Option<Arc<ControlPanel>>>,
    state: Mutex<EngineState>,
    // Serializes start/shutdown transitions across await points.
    transition: tokio::sync::Mutex<()>,
}

impl PageAgent {
    pub fn new(dom: Arc<dyn PageDom>, config: AgentConfig) -> Arc<Self> {
        let probe = MediaProbe::new(Arc::clone(&dom));
        let suppressor = Suppressor::new(Arc::clone(&dom), config.suppressor);
        let ctx = ActionCtx::new(
            Arc::clone(&dom),
            Arc::clone(&probe),
            Arc::clone(&suppressor),
            config.home_url,
        );
        let dispatcher = Dispatcher::new(ActionRegistry::with_defaults(), ctx);
        Arc::new(Self {
            dom,
            probe,
            suppressor,
            dispatcher,
            status_poll: config.status_poll,
            panel: Mutex::new(None),
            state: Mutex::new(EngineState::Uninitialized),
            transition: tokio::sync::Mutex::new(()),
        })
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn suppressor(&self) -> Arc<Suppressor> {
        Arc::clone(&self.suppressor)
    }

    pub fn probe(&self) -> Arc<MediaProbe> {
        Arc::clone(&self.probe)
    }

    pub fn state(&self) -> EngineState {
        *self.state.lock()
    }

    /// Whether the control surface currently exists. Running iff true.
    pub fn has_surface(&self) -> bool {
        self.panel.lock().is_some()
    }

    pub fn panel(&self) -> Option<Arc<ControlPanel>> {
        self.panel.lock().clone()
    }

    pub fn panel_state(&self) -> Option<PanelState> {
        self.panel.lock().as_deref().map(ControlPanel::state)
    }

    /// Forward a panel button press. `None` while the surface is down.
    pub async fn press_panel_button(&self, button: PanelButton) -> Option<ActionResult> {
        match self.panel() {
            Some(panel) => Some(panel.press(button).await),
            None => None,
        }
    }

    /// Forward a panel volume-slider event. `None` while the surface is down.
    pub async fn slide_panel_volume(&self, volume: i64) -> Option<ActionResult> {
        match self.panel() {
            Some(panel) => Some(panel.slide_volume(volume).await),
            None => None,
        }
    }

    /// Bring the engine up: suppression first, then the control surface.
    /// Re-entering while already running is a no-op.
    pub async fn start(self: &Arc<Self>) {
        let _guard = self.transition.lock().await;
        if self.state() == EngineState::Running {
            return;
        }
        self.suppressor.start().await;
        let panel = ControlPanel::mount(
            Arc::clone(&self.dom),
            self.dispatcher(),
            self.status_poll,
        )
        .await;
        *self.panel.lock() = Some(Arc::new(panel));
        *self.state.lock() = EngineState::Running;
        info!("page agent running");
    }

    /// Full teardown: suppression subscription, timers and surface. Safe
    /// to call when not running.
    pub async fn shutdown(&self) {
        let _guard = self.transition.lock().await;
        if self.state() != EngineState::Running {
            return;
        }
        self.suppressor.stop();
        let panel = self.panel.lock().take();
        if let Some(panel) = panel {
            panel.unmount().await;
        }
        *self.state.lock() = EngineState::Deactivated;
        info!("page agent deactivated");
    }
}
