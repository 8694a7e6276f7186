use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle to an element in the page document.
///
/// Handles stay valid after detachment; operations on a detached node
/// report [`crate::DomError::Detached`] instead of panicking.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}
