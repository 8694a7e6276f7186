//! The host-page port.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::errors::DomError;
use crate::ids::NodeId;
use crate::mutation::MutationBatch;

/// Live media element properties as reported by the page.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaProps {
    pub paused: bool,
    /// Linear volume in `[0.0, 1.0]`.
    pub volume: f64,
    pub muted: bool,
    pub current_time: f64,
    pub duration: f64,
    pub video_height: u32,
    pub filter: Option<String>,
}

/// Everything the agent needs from the page it augments.
///
/// Query and mutation methods take selector strings so implementations can
/// forward them verbatim to a remote document; the reference [`crate::MemoryDom`]
/// evaluates them with the bundled [`crate::Selector`] engine.
#[async_trait]
pub trait PageDom: Send + Sync {
    /// All attached elements matching `selector`, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError>;

    async fn query_first(&self, selector: &str) -> Result<Option<NodeId>, DomError> {
        Ok(self.query_all(selector).await?.into_iter().next())
    }

    /// Nearest self-or-ancestor matching `selector`.
    async fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, DomError>;

    async fn is_attached(&self, node: NodeId) -> bool;

    /// The element's direct text, excluding descendants.
    async fn own_text(&self, node: NodeId) -> Option<String>;

    async fn class_names(&self, node: NodeId) -> Vec<String>;

    /// Whether layout currently gives the element a rendered box.
    async fn has_rendered_box(&self, node: NodeId) -> bool;

    /// Detach the node and its subtree from the document.
    async fn remove(&self, node: NodeId) -> Result<(), DomError>;

    /// Append a fresh element; `parent` of `None` targets the document body.
    async fn append_element(
        &self,
        parent: Option<NodeId>,
        tag: &str,
        attrs: &[(String, String)],
    ) -> Result<NodeId, DomError>;

    async fn click(&self, node: NodeId) -> Result<(), DomError>;

    /// Fire-and-forget navigation.
    async fn navigate(&self, url: &str);

    async fn fullscreen_element(&self) -> Option<NodeId>;

    async fn request_fullscreen(&self) -> Result<(), DomError>;

    async fn exit_fullscreen(&self) -> Result<(), DomError>;

    async fn media_props(&self, node: NodeId) -> Option<MediaProps>;

    async fn media_play(&self, node: NodeId) -> Result<(), DomError>;

    async fn media_pause(&self, node: NodeId) -> Result<(), DomError>;

    /// Set linear volume; values outside `[0.0, 1.0]` are clamped.
    async fn media_set_volume(&self, node: NodeId, volume: f64) -> Result<(), DomError>;

    async fn media_set_muted(&self, node: NodeId, muted: bool) -> Result<(), DomError>;

    async fn media_seek_by(&self, node: NodeId, seconds: f64) -> Result<(), DomError>;

    async fn media_set_filter(&self, node: NodeId, filter: &str) -> Result<(), DomError>;

    /// Subscribe to the live mutation feed (subtree additions/removals plus
    /// `style`/`class` attribute changes).
    fn subscribe_mutations(&self) -> broadcast::Receiver<MutationBatch>;
}
