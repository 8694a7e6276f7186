//! Host-page access layer.
//!
//! The agent never touches a concrete document directly: everything goes
//! through the [`PageDom`] port. `MemoryDom` is the in-process reference
//! implementation backing tests and the demo page; a transport-backed
//! implementation can be dropped in without touching the engine crates.

pub mod errors;
mod ids;
mod memory;
mod mutation;
pub mod ports;
pub mod selector;

pub use errors::DomError;
pub use ids::NodeId;
pub use memory::{MediaState, MemoryDom};
pub use mutation::{MutationBatch, MutationKind, MutationRecord};
pub use ports::{MediaProps, PageDom};
pub use selector::Selector;
