use thiserror::Error;

use crate::ids::NodeId;

/// Errors surfaced by the host-page port.
#[derive(Debug, Error, Clone)]
pub enum DomError {
    #[error("invalid selector `{0}`: {1}")]
    Selector(String, String),

    #[error("{0} is not part of the document")]
    Detached(NodeId),

    #[error("{0} does not exist")]
    UnknownNode(NodeId),

    #[error("{0} is not a media element")]
    NotMedia(NodeId),

    /// The environment refused to enter or leave fullscreen.
    #[error("fullscreen request rejected")]
    FullscreenRejected,
}
