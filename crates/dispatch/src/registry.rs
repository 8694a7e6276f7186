use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::{Map, Value};

use crate::context::ActionCtx;
use crate::errors::DispatchError;
use crate::handlers;

pub type Payload = Map<String, Value>;

/// What a handler hands back: a finished result, or a computation still in
/// flight. The dispatcher treats both identically after normalization.
pub enum HandlerOutcome {
    Immediate(Result<Payload, DispatchError>),
    Pending(BoxFuture<'static, Result<Payload, DispatchError>>),
}

/// Box a handler future as a pending outcome.
pub fn pending<F>(future: F) -> HandlerOutcome
where
    F: Future<Output = Result<Payload, DispatchError>> + Send + 'static,
{
    HandlerOutcome::Pending(Box::pin(future))
}

pub type Handler = Arc<dyn Fn(Arc<ActionCtx>, Payload) -> HandlerOutcome + Send + Sync>;

/// Name-keyed handler table.
pub struct ActionRegistry {
    handlers: DashMap<String, Handler>,
}

impl ActionRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Registry carrying the canonical action set.
    pub fn with_defaults() -> Self {
        let registry = Self::empty();
        handlers::install(&registry);
        registry
    }

    pub fn register<F>(&self, name: &str, handler: F)
    where
        F: Fn(Arc<ActionCtx>, Payload) -> HandlerOutcome + Send + Sync + 'static,
    {
        self.handlers.insert(name.to_string(), Arc::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .handlers
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }
}
