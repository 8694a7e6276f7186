//! Action registry and dispatcher.
//!
//! Remote operations are named handlers over a shared [`ActionCtx`]. A
//! handler either answers immediately or hands back a pending computation;
//! the dispatcher normalizes both into one [`ActionResult`] contract, so
//! callers cannot tell a synchronous failure from an asynchronous one
//! beyond latency.

mod context;
mod dispatcher;
pub mod errors;
mod handlers;
mod registry;

pub use context::ActionCtx;
pub use dispatcher::Dispatcher;
pub use errors::DispatchError;
pub use registry::{pending, ActionRegistry, Handler, HandlerOutcome, Payload};
