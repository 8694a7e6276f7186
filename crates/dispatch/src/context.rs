use std::sync::Arc;

use url::Url;

use watchdeck_media_probe::MediaProbe;
use watchdeck_page_dom::PageDom;
use watchdeck_suppressor::Suppressor;

/// Everything a handler may touch: the page, the media probe, the
/// suppression engine and the navigation target for `goHome`.
pub struct ActionCtx {
    pub dom: Arc<dyn PageDom>,
    pub probe: Arc<MediaProbe>,
    pub suppressor: Arc<Suppressor>,
    pub home_url: Url,
}

impl ActionCtx {
    pub fn new(
        dom: Arc<dyn PageDom>,
        probe: Arc<MediaProbe>,
        suppressor: Arc<Suppressor>,
        home_url: Url,
    ) -> Arc<Self> {
        Arc::new(Self {
            dom,
            probe,
            suppressor,
            home_url,
        })
    }
}
