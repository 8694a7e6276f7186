//! Overlay suppression engine.
//!
//! One sweep removes every structural-pattern match outright and then runs
//! the content-heuristic pass. While running, the engine re-sweeps on a
//! debounced mutation trigger and on a slow proactive interval. Lifecycle
//! is strict: subscription and timers exist iff the engine is running, and
//! every transition out of running releases them.

mod engine;
mod metrics;

pub use engine::{Suppressor, SuppressorConfig};
pub use metrics::MetricsSnapshot;
