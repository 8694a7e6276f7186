use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use watchdeck_page_dom::{MutationKind, MutationRecord, PageDom};
use watchdeck_patterns as patterns;

use crate::metrics::{Counters, MetricsSnapshot};

/// Debounce/interval tuning for the engine.
#[derive(Clone, Copy, Debug)]
pub struct SuppressorConfig {
    /// Delay between a relevant mutation and the coalesced sweep.
    pub debounce: Duration,
    /// Proactive sweep cadence while running.
    pub resweep: Duration,
}

impl Default for SuppressorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            resweep: Duration::from_secs(30),
        }
    }
}

/// Pattern-driven overlay remover.
///
/// Owns its mutation-feed subscription and timers exclusively; both are
/// guarded by one cancellation token that is replaced on every `start` and
/// cancelled on every `stop`.
pub struct Suppressor {
    dom: Arc<dyn PageDom>,
    config: SuppressorConfig,
    cancel: Mutex<Option<CancellationToken>>,
    metrics: Counters,
}

impl Suppressor {
    pub fn new(dom: Arc<dyn PageDom>, config: SuppressorConfig) -> Arc<Self> {
        Arc::new(Self {
            dom,
            config,
            cancel: Mutex::new(None),
            metrics: Counters::default(),
        })
    }

    pub fn is_running(&self) -> bool {
        self.cancel
            .lock()
            .as_ref()
            .map(|token| !token.is_cancelled())
            .unwrap_or(false)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Subscribe to the mutation feed, sweep once, and spawn the reactive
    /// and proactive loops. Calling `start` while running is a no-op.
    pub async fn start(self: &Arc<Self>) {
        let token = {
            let mut guard = self.cancel.lock();
            if guard.as_ref().map(|t| !t.is_cancelled()).unwrap_or(false) {
                return;
            }
            let token = CancellationToken::new();
            *guard = Some(token.clone());
            token
        };
        Counters::bump(&self.metrics.starts);

        let feed = self.dom.subscribe_mutations();
        self.sweep().await;

        let engine = Arc::clone(self);
        let mutation_token = token.clone();
        tokio::spawn(async move {
            engine.mutation_loop(feed, mutation_token).await;
        });

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine.resweep_loop(token).await;
        });

        info!("suppression engine running");
    }

    /// Cancel the subscription and timers and release the handle. Safe to
    /// call when not running.
    pub fn stop(&self) {
        let token = self.cancel.lock().take();
        if let Some(token) = token {
            if !token.is_cancelled() {
                token.cancel();
                Counters::bump(&self.metrics.stops);
                info!("suppression engine deactivated");
            }
        }
    }

    /// One full pass: ordered structural removals, then the content
    /// heuristics. Returns the count of structural removals only; the
    /// heuristic pass is deliberately uncounted so the reported number
    /// stays comparable across controller versions.
    pub async fn sweep(&self) -> u32 {
        let mut removed = 0u32;
        for pattern in patterns::structural_patterns().iter().copied() {
            let nodes = match self.dom.query_all(pattern).await {
                Ok(nodes) => nodes,
                Err(err) => {
                    warn!(pattern, %err, "structural pattern query failed");
                    continue;
                }
            };
            for node in nodes {
                match self.dom.remove(node).await {
                    Ok(()) => {
                        removed += 1;
                        debug!(%node, pattern, "removed overlay");
                    }
                    // Already detached, e.g. an earlier pattern took an
                    // ancestor with it. Best effort per element.
                    Err(err) => debug!(%node, %err, "overlay removal skipped"),
                }
            }
        }

        self.heuristic_pass().await;

        Counters::bump(&self.metrics.sweeps);
        Counters::add(&self.metrics.nodes_removed, u64::from(removed));
        removed
    }

    /// Remove the nearest container-like ancestor of every element whose
    /// direct text carries an overlay heuristic. Leaves without such an
    /// ancestor stay untouched.
    async fn heuristic_pass(&self) {
        let container_selector = patterns::container_patterns().join(", ");
        let candidates = match self.dom.query_all("*").await {
            Ok(nodes) => nodes,
            Err(err) => {
                warn!(%err, "document walk failed, skipping heuristic pass");
                return;
            }
        };

        for node in candidates {
            if !self.dom.is_attached(node).await {
                continue;
            }
            let Some(text) = self.dom.own_text(node).await else {
                continue;
            };
            let text = text.trim();
            if text.is_empty()
                || !patterns::text_heuristics().iter().any(|h| text.contains(h))
            {
                continue;
            }
            match self.dom.closest(node, &container_selector).await {
                Ok(Some(container)) => match self.dom.remove(container).await {
                    Ok(()) => debug!(%container, "removed overlay container by content"),
                    Err(err) => debug!(%container, %err, "container removal skipped"),
                },
                Ok(None) => {}
                Err(err) => warn!(%err, "container lookup failed"),
            }
        }
    }

    /// Structural-pattern matches that currently have a rendered box.
    /// Status reporting only; independent from `sweep`.
    pub async fn count_visible(&self) -> u32 {
        let mut visible = 0u32;
        for pattern in patterns::structural_patterns().iter().copied() {
            let nodes = match self.dom.query_all(pattern).await {
                Ok(nodes) => nodes,
                Err(_) => continue,
            };
            for node in nodes {
                if self.dom.has_rendered_box(node).await {
                    visible += 1;
                }
            }
        }
        visible
    }

    async fn record_is_relevant(&self, record: &MutationRecord) -> bool {
        let kind_matches = match &record.kind {
            MutationKind::ChildAdded => true,
            MutationKind::AttributeChanged { name } => name == "style" || name == "class",
            MutationKind::ChildRemoved => false,
        };
        if !kind_matches {
            return false;
        }
        self.dom
            .class_names(record.target)
            .await
            .iter()
            .any(|token| patterns::token_is_overlay_like(token))
    }

    async fn batch_is_relevant(&self, batch: &[MutationRecord]) -> bool {
        for record in batch {
            if self.record_is_relevant(record).await {
                return true;
            }
        }
        false
    }

    /// Reactive loop: one pending-sweep flag and one timer. A relevant
    /// batch arms the timer once; further relevant batches inside the
    /// window are absorbed by the already-pending sweep.
    async fn mutation_loop(
        self: Arc<Self>,
        mut feed: tokio::sync::broadcast::Receiver<watchdeck_page_dom::MutationBatch>,
        cancel: CancellationToken,
    ) {
        let far_future = Duration::from_secs(86_400);
        let timer = tokio::time::sleep(far_future);
        tokio::pin!(timer);
        let mut pending = false;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = feed.recv() => match received {
                    Ok(batch) => {
                        Counters::bump(&self.metrics.batches_seen);
                        if self.batch_is_relevant(&batch).await {
                            Counters::bump(&self.metrics.batches_relevant);
                            if !pending {
                                pending = true;
                                timer.as_mut().reset(Instant::now() + self.config.debounce);
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Dropped notifications may have carried an overlay;
                        // sweep rather than guess.
                        warn!(skipped, "mutation feed lagged");
                        if !pending {
                            pending = true;
                            timer.as_mut().reset(Instant::now() + self.config.debounce);
                        }
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = timer.as_mut(), if pending => {
                    pending = false;
                    timer.as_mut().reset(Instant::now() + far_future);
                    self.sweep().await;
                }
            }
        }
    }

    /// Proactive loop: slow interval sweeps while running.
    async fn resweep_loop(self: Arc<Self>, cancel: CancellationToken) {
        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.config.resweep, self.config.resweep);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.sweep().await;
                }
            }
        }
    }
}
