//! Controller-facing message bridge.
//!
//! Inbound requests arrive as `{action, ...params}` envelopes over an
//! assumed-reliable channel; responses flatten the handler payload into a
//! `{success, ...}` object. The bridge also owns the enabled gate: while
//! disabled every request is answered with a fixed failure before any
//! handler lookup, and enable/disable broadcasts from the flag store drive
//! the page agent's lifecycle.

mod agent;
mod bridge;
mod flags;
mod panel;

pub use agent::{AgentConfig, PageAgent};
pub use bridge::{BridgeError, BridgeEvent, PageBridge};
pub use flags::{FlagStore, MemoryFlagStore};
pub use panel::{ControlPanel, PanelButton, PanelState};
