use std::sync::Arc;

use tracing::debug;

use watchdeck_core_types::{ActionRequest, ActionResult};

use crate::context::ActionCtx;
use crate::errors::DispatchError;
use crate::registry::{ActionRegistry, HandlerOutcome};

/// Looks handlers up by name and normalizes whatever they return.
pub struct Dispatcher {
    registry: ActionRegistry,
    ctx: Arc<ActionCtx>,
}

impl Dispatcher {
    pub fn new(registry: ActionRegistry, ctx: Arc<ActionCtx>) -> Arc<Self> {
        Arc::new(Self { registry, ctx })
    }

    pub fn action_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Invoke the named handler. Unknown names fail without touching any
    /// handler; immediate and pending failures share one message contract.
    pub async fn dispatch(&self, request: ActionRequest) -> ActionResult {
        let Some(handler) = self.registry.get(&request.name) else {
            return ActionResult::err(
                DispatchError::UnknownAction(request.name).to_string(),
            );
        };

        let outcome = handler(Arc::clone(&self.ctx), request.params);
        let result = match outcome {
            HandlerOutcome::Immediate(result) => result,
            HandlerOutcome::Pending(future) => future.await,
        };

        match result {
            Ok(payload) => ActionResult::ok(payload),
            Err(err) => {
                debug!(action = %request.name, %err, "action failed");
                ActionResult::err(err.to_string())
            }
        }
    }
}
