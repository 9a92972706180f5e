//! Pipeline runtime
//!
//! Owns the started tasks of one pipeline and drives its lifecycle:
//!
//! ```text
//! Unstarted ──start()──→ Starting ──→ Running ──close()──→ Closing ──→ Closed
//! ```
//!
//! Startup order: sinks, rules (+ window managers), event-type catalog,
//! sources with their dispatch loops. Shutdown is the strict reverse of the
//! data flow: cancel sources and drain them, stop window managers, let rule
//! loops finish and close their rules, let sinks drain, flush states.
//! `close` is idempotent; a second call waits for the first to finish and
//! returns without further effect.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use weir_event::{DecoderRegistry, Event, EventCatalog};
use weir_state::State;

use crate::error::{PipelineError, Result};
use crate::graph::{Nodes, RuleNode, SinkNode, SourceNode};
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::window::WindowManager;

/// Lifecycle state of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Unstarted,
    Starting,
    Running,
    Closing,
    Closed,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unstarted => "unstarted",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

#[derive(Default)]
struct Tasks {
    sources: Vec<JoinHandle<()>>,
    dispatchers: Vec<JoinHandle<()>>,
    rules: Vec<JoinHandle<()>>,
    windows: Vec<JoinHandle<()>>,
    sinks: Vec<JoinHandle<()>>,
}

/// A built pipeline: a DAG of driver tasks connected by channels.
///
/// All methods take `&self`; the pipeline is shared behind an `Arc` between
/// the task that runs it and whoever may close it.
pub struct Pipeline {
    id: Uuid,
    raw: Bytes,
    event_folder: String,
    decoders: Arc<DecoderRegistry>,
    metrics: Arc<PipelineMetrics>,

    status: parking_lot::Mutex<PipelineStatus>,
    nodes: parking_lot::Mutex<Option<Nodes>>,
    states: BTreeMap<String, Arc<State>>,
    tasks: tokio::sync::Mutex<Tasks>,

    /// Whether any rule→rule forwarder edge exists; decides the shutdown
    /// cancellation order
    has_forward_edges: bool,

    /// Serializes close() so a second caller waits for the first
    close_lock: tokio::sync::Mutex<()>,

    source_cancel: CancellationToken,
    window_cancel: CancellationToken,
    shutdown: CancellationToken,
}

impl Pipeline {
    pub(crate) fn from_parts(
        id: Uuid,
        raw: Bytes,
        event_folder: String,
        decoders: Arc<DecoderRegistry>,
        nodes: Nodes,
        states: BTreeMap<String, Arc<State>>,
        has_forward_edges: bool,
    ) -> Self {
        Self {
            id,
            raw,
            event_folder,
            decoders,
            metrics: Arc::new(PipelineMetrics::new()),
            status: parking_lot::Mutex::new(PipelineStatus::Unstarted),
            nodes: parking_lot::Mutex::new(Some(nodes)),
            states,
            tasks: tokio::sync::Mutex::new(Tasks::default()),
            has_forward_edges,
            close_lock: tokio::sync::Mutex::new(()),
            source_cancel: CancellationToken::new(),
            window_cancel: CancellationToken::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The exact bytes this pipeline was built from
    pub fn raw_config(&self) -> &[u8] {
        &self.raw
    }

    pub fn status(&self) -> PipelineStatus {
        *self.status.lock()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Launch every node task. Valid only from `Unstarted`; a failure
    /// mid-start tears the partially started pipeline down again.
    pub async fn start(&self) -> Result<()> {
        {
            let mut status = self.status.lock();
            if *status != PipelineStatus::Unstarted {
                return Err(PipelineError::invalid_transition("start", status.as_str()));
            }
            *status = PipelineStatus::Starting;
        }

        match self.start_nodes().await {
            Ok(()) => {
                *self.status.lock() = PipelineStatus::Running;
                tracing::info!(pipeline = %self.id, "pipeline running");
                Ok(())
            }
            Err(e) => {
                tracing::error!(pipeline = %self.id, error = %e, "pipeline start failed");
                self.close().await;
                Err(e)
            }
        }
    }

    async fn start_nodes(&self) -> Result<()> {
        let nodes = {
            let mut guard = self.nodes.lock();
            guard
                .take()
                .ok_or_else(|| PipelineError::invalid_transition("start", "consumed"))?
        };
        let Nodes {
            sources,
            rules,
            sinks,
            discards,
        } = nodes;
        let mut tasks = self.tasks.lock().await;

        // 1. Sinks first so everything downstream is draining before
        //    records can flow.
        for (name, node) in sinks {
            let SinkNode { mut driver, in_rx } = node;
            driver.init().await?;
            tracing::info!(pipeline = %self.id, sink = %name, "starting sink");
            tasks.sinks.push(tokio::spawn(driver.run(in_rx)));
        }
        for mut rx in discards {
            tasks.sinks.push(tokio::spawn(async move {
                while rx.recv().await.is_some() {}
            }));
        }

        // 2. Rules and their window managers. The process loops block on
        //    their input channels until dispatch starts pushing.
        let mut rule_inputs: HashMap<String, mpsc::Sender<Event>> = HashMap::new();
        for (name, node) in rules {
            let RuleNode {
                rule,
                window_interval,
                in_tx,
                mut in_rx,
                out_tx,
            } = node;
            tracing::info!(pipeline = %self.id, rule = %name, "starting rule");
            rule_inputs.insert(name.clone(), in_tx);

            let loop_rule = Arc::clone(&rule);
            let loop_out = out_tx.clone();
            let loop_metrics = Arc::clone(&self.metrics);
            let loop_name = name.clone();
            tasks.rules.push(tokio::spawn(async move {
                while let Some(event) = in_rx.recv().await {
                    let output = loop_rule.lock().process(&event);
                    loop_metrics.record_rule_output(output.is_some());
                    if loop_out.send(output).await.is_err() {
                        tracing::warn!(rule = %loop_name, "output channel closed, stopping rule");
                        break;
                    }
                }
                loop_rule.lock().close();
                tracing::debug!(rule = %loop_name, "rule loop finished");
            }));

            if window_interval > 0 {
                let manager = WindowManager::new(
                    name,
                    rule,
                    out_tx,
                    Duration::from_secs(window_interval),
                    self.window_cancel.child_token(),
                    Arc::clone(&self.metrics),
                );
                tasks.windows.push(tokio::spawn(manager.run()));
            }
        }

        // 3. Event types, loaded fresh per start.
        let catalog = Arc::new(EventCatalog::load(&self.event_folder, &self.decoders)?);

        // 4. Sources and their dispatch loops.
        for (name, node) in sources {
            let SourceNode {
                mut driver,
                tx,
                rx,
                children,
            } = node;
            driver.init().await?;
            tracing::info!(pipeline = %self.id, source = %name, "starting source");
            tasks
                .sources
                .push(tokio::spawn(driver.retrieve(tx, self.source_cancel.child_token())));

            let child_inputs: Vec<(String, mpsc::Sender<Event>)> = children
                .iter()
                .filter_map(|child| {
                    rule_inputs
                        .get(child)
                        .map(|tx| (child.clone(), tx.clone()))
                })
                .collect();
            tasks.dispatchers.push(tokio::spawn(dispatch(
                name,
                rx,
                Arc::clone(&catalog),
                child_inputs,
                Arc::clone(&self.metrics),
            )));
        }

        Ok(())
    }

    /// Start the pipeline and block until an interrupt/terminate signal
    /// arrives or `close` is invoked from elsewhere, then shut down.
    pub async fn run(&self) -> Result<()> {
        self.start().await?;

        tokio::select! {
            _ = interrupt_signal() => {
                tracing::info!(pipeline = %self.id, "received shutdown signal, exiting");
            }
            _ = self.shutdown.cancelled() => {}
        }

        self.close().await;
        Ok(())
    }

    /// Shut the pipeline down in strict order. Idempotent: subsequent
    /// calls wait for the in-flight shutdown and then return.
    pub async fn close(&self) {
        let _guard = self.close_lock.lock().await;

        {
            let mut status = self.status.lock();
            match *status {
                PipelineStatus::Closed => return,
                PipelineStatus::Unstarted => {
                    *status = PipelineStatus::Closed;
                    drop(status);
                    // Nothing ever ran; release the built nodes and states.
                    self.nodes.lock().take();
                    self.close_states();
                    return;
                }
                _ => *status = PipelineStatus::Closing,
            }
        }
        tracing::debug!(pipeline = %self.id, "closing pipeline");
        self.shutdown.cancel();

        let mut tasks = self.tasks.lock().await;

        // 1. Sources stop producing; dispatchers drain what is in flight
        //    and drop the rule input channels. With rule→rule forwarder
        //    edges the window timers must be cancelled alongside the
        //    sources: a forward source only finishes once the producer
        //    rule's window manager has released the output channel, so
        //    waiting for the sources first would deadlock on a chained
        //    windowed rule.
        self.source_cancel.cancel();
        if self.has_forward_edges {
            self.window_cancel.cancel();
        }
        for handle in tasks.sources.drain(..) {
            let _ = handle.await;
        }
        for handle in tasks.dispatchers.drain(..) {
            let _ = handle.await;
        }

        // 2. Window managers stop (each fires once more to drain pending
        //    batch state), rule loops finish and close their rules; their
        //    output channels close as the last senders drop.
        self.window_cancel.cancel();
        for handle in tasks.windows.drain(..) {
            let _ = handle.await;
        }
        for handle in tasks.rules.drain(..) {
            let _ = handle.await;
        }

        // 3. Sinks drain and return.
        for handle in tasks.sinks.drain(..) {
            let _ = handle.await;
        }

        // 4. States flush last.
        self.close_states();

        *self.status.lock() = PipelineStatus::Closed;
        tracing::info!(pipeline = %self.id, "pipeline closed");
    }

    fn close_states(&self) {
        for (name, state) in &self.states {
            if let Err(e) = state.close() {
                tracing::warn!(pipeline = %self.id, state = %name, error = %e, "state close failed");
            }
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish()
    }
}

/// Read raw records from one source, classify each against the event-type
/// catalog and fan the decoded event out to every child rule. Records that
/// match no event type are dropped here.
async fn dispatch(
    source: String,
    mut rx: mpsc::Receiver<Bytes>,
    catalog: Arc<EventCatalog>,
    children: Vec<(String, mpsc::Sender<Event>)>,
    metrics: Arc<PipelineMetrics>,
) {
    while let Some(raw) = rx.recv().await {
        metrics.record_received(raw.len() as u64);
        match catalog.match_event(&raw) {
            Ok(event) => {
                metrics.record_dispatched();
                for (child, tx) in &children {
                    if tx.send(event.clone()).await.is_err() {
                        tracing::warn!(source = %source, rule = %child, "rule input closed, dropping event");
                    }
                }
            }
            Err(e) => {
                metrics.record_decode_miss();
                tracing::info!(source = %source, error = %e, "no event type matched, dropping record");
            }
        }
    }
    tracing::debug!(source = %source, "dispatch loop finished");
}

/// Resolves when the process receives an interrupt or terminate signal
async fn interrupt_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(terminate) => terminate,
            Err(e) => {
                tracing::warn!(error = %e, "unable to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
