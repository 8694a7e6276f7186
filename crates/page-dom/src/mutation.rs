//! Mutation feed records.
//!
//! The page implementation publishes one [`MutationBatch`] per logical
//! change set, mirroring how a browser observer delivers grouped records.

use serde::{Deserialize, Serialize};

use crate::ids::NodeId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MutationKind {
    ChildAdded,
    ChildRemoved,
    AttributeChanged { name: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub target: NodeId,
    pub kind: MutationKind,
}

impl MutationRecord {
    pub fn child_added(target: NodeId) -> Self {
        Self {
            target,
            kind: MutationKind::ChildAdded,
        }
    }

    pub fn child_removed(target: NodeId) -> Self {
        Self {
            target,
            kind: MutationKind::ChildRemoved,
        }
    }

    pub fn attribute_changed(target: NodeId, name: impl Into<String>) -> Self {
        Self {
            target,
            kind: MutationKind::AttributeChanged { name: name.into() },
        }
    }
}

pub type MutationBatch = Vec<MutationRecord>;
