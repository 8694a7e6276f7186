//! The persisted enabled-flag port.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

/// Boolean persistence collaborator behind the enable/disable checkbox.
/// The flag defaults to enabled when it was never written.
#[async_trait]
pub trait FlagStore: Send + Sync {
    async fn read_enabled(&self) -> bool;

    async fn write_enabled(&self, enabled: bool);

    /// Change notifications; the receiver's current value is the flag.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// In-memory store backing tests and the demo.
pub struct MemoryFlagStore {
    value: watch::Sender<bool>,
}

impl MemoryFlagStore {
    pub fn new() -> Arc<Self> {
        Self::with_enabled(true)
    }

    pub fn with_enabled(enabled: bool) -> Arc<Self> {
        let (value, _) = watch::channel(enabled);
        Arc::new(Self { value })
    }
}

#[async_trait]
impl FlagStore for MemoryFlagStore {
    async fn read_enabled(&self) -> bool {
        *self.value.borrow()
    }

    async fn write_enabled(&self, enabled: bool) {
        self.value.send_replace(enabled);
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.value.subscribe()
    }
}
