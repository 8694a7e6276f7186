use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use watchdeck_core_types::{ActionRequest, ActionResult};
use watchdeck_dispatch::DispatchError;

use crate::agent::PageAgent;
use crate::flags::FlagStore;

const EVENT_CAPACITY: usize = 64;

/// Malformed controller envelopes, reported before dispatch.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BridgeError {
    #[error("Request envelope must be an object.")]
    MalformedEnvelope,
    #[error("Request is missing an action name.")]
    MissingAction,
}

/// Events emitted to bridge observers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BridgeEvent {
    AgentStarted {
        recorded_at: DateTime<Utc>,
    },
    AgentStopped {
        recorded_at: DateTime<Utc>,
    },
    RequestHandled {
        request_id: Uuid,
        action: String,
        ok: bool,
        recorded_at: DateTime<Utc>,
    },
}

/// Receives controller envelopes, gates them on the enabled flag, and
/// reacts to flag broadcasts by starting or tearing down the agent.
pub struct PageBridge {
    agent: Arc<PageAgent>,
    enabled: AtomicBool,
    events: broadcast::Sender<BridgeEvent>,
}

impl PageBridge {
    pub fn new(agent: Arc<PageAgent>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            agent,
            enabled: AtomicBool::new(false),
            events,
        })
    }

    pub fn agent(&self) -> Arc<PageAgent> {
        Arc::clone(&self.agent)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Startup: read the persisted flag (default enabled) and bring the
    /// agent up accordingly.
    pub async fn bootstrap(&self, flags: &dyn FlagStore) {
        let enabled = flags.read_enabled().await;
        self.enabled.store(enabled, Ordering::SeqCst);
        if enabled {
            self.agent.start().await;
            let _ = self.events.send(BridgeEvent::AgentStarted {
                recorded_at: Utc::now(),
            });
        } else {
            info!("disabled by persisted flag");
        }
    }

    /// Handle one inbound controller envelope.
    ///
    /// The disabled check runs before any handler lookup; a disabled bridge
    /// produces no side effects whatsoever.
    pub async fn handle_request(&self, envelope: Value) -> Value {
        if !self.is_enabled() {
            return failure_response(&DispatchError::Disabled.to_string());
        }

        let request = match parse_envelope(envelope) {
            Ok(request) => request,
            Err(err) => return failure_response(&err.to_string()),
        };

        let action = request.name.clone();
        let result = self.agent.dispatcher().dispatch(request).await;
        let _ = self.events.send(BridgeEvent::RequestHandled {
            request_id: Uuid::new_v4(),
            action,
            ok: result.is_ok(),
            recorded_at: Utc::now(),
        });
        flatten_result(result)
    }

    /// React to one enabled-flag broadcast. Broadcasts that do not change
    /// the current state are ignored; no redundant start/stop.
    pub async fn apply_enabled(&self, enabled: bool) {
        let previous = self.enabled.swap(enabled, Ordering::SeqCst);
        if previous == enabled {
            debug!(enabled, "flag broadcast without a state change");
            return;
        }
        if enabled {
            info!("enabling page agent");
            self.agent.start().await;
            let _ = self.events.send(BridgeEvent::AgentStarted {
                recorded_at: Utc::now(),
            });
        } else {
            info!("disabling page agent");
            self.agent.shutdown().await;
            let _ = self.events.send(BridgeEvent::AgentStopped {
                recorded_at: Utc::now(),
            });
        }
    }

    /// Long-running loop: bootstrap from the store, then follow its change
    /// notifications until cancelled.
    pub async fn run(self: Arc<Self>, flags: Arc<dyn FlagStore>, cancel: CancellationToken) {
        // Subscribe before the initial read so no flag write can slip
        // between bootstrap and the change loop.
        let mut changes = flags.subscribe();
        self.bootstrap(flags.as_ref()).await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = changes.changed() => {
                    if changed.is_err() {
                        warn!("flag store dropped, bridge loop ending");
                        break;
                    }
                    let enabled = *changes.borrow_and_update();
                    self.apply_enabled(enabled).await;
                }
            }
        }
    }
}

fn parse_envelope(envelope: Value) -> Result<ActionRequest, BridgeError> {
    let Value::Object(mut fields) = envelope else {
        return Err(BridgeError::MalformedEnvelope);
    };
    let action = match fields.remove("action") {
        Some(Value::String(name)) if !name.is_empty() => name,
        _ => return Err(BridgeError::MissingAction),
    };
    Ok(ActionRequest {
        name: action,
        params: fields,
    })
}

/// Spread the payload into the response object; `success` is the sole
/// success signal.
fn flatten_result(result: ActionResult) -> Value {
    match result {
        ActionResult::Ok { payload } => {
            let mut response = Map::new();
            response.insert("success".into(), Value::Bool(true));
            for (key, value) in payload {
                response.insert(key, value);
            }
            Value::Object(response)
        }
        ActionResult::Err { message } => failure_response(&message),
    }
}

fn failure_response(message: &str) -> Value {
    json!({ "success": false, "message": message })
}
