//! Pipeline DAG construction
//!
//! Turns a validated config into a runnable [`Pipeline`]:
//!
//! 1. Reject cyclic graphs (Kahn's in-degree pass over the name graph).
//! 2. Create states, then a node with its channel(s) per source, sink and
//!    rule.
//! 3. Realize rule→rule edges as a forward sink on the producer side and a
//!    forward source on the consumer side, joined by an intermediate
//!    channel — the interior topology stays uniformly source → rule → sink.
//! 4. Wire each rule into its parent source's child list; a rule whose
//!    source never materializes is an orphan and fails the build.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;
use weir_config::PipelineConfig;
use weir_event::{DecoderRegistry, Event, Record};
use weir_rules::{Rule, RuleRegistry};
use weir_sinks::{ForwardSink, Sink, SinkFactory, SinkInput};
use weir_sources::{ForwardSource, Source, SourceFactory};
use weir_state::State;

use crate::error::{PipelineError, Result};
use crate::runtime::Pipeline;
use crate::NODE_CHANNEL_CAPACITY;

/// A source and the rules it feeds
pub(crate) struct SourceNode {
    pub driver: Box<dyn Source>,
    pub tx: mpsc::Sender<Bytes>,
    pub rx: mpsc::Receiver<Bytes>,
    pub children: Vec<String>,
}

/// A rule, its channels and its window interval
pub(crate) struct RuleNode {
    pub rule: Arc<Mutex<Box<dyn Rule>>>,
    pub window_interval: u64,
    pub in_tx: mpsc::Sender<Event>,
    pub in_rx: mpsc::Receiver<Event>,
    pub out_tx: mpsc::Sender<SinkInput>,
}

/// A sink and its input channel
pub(crate) struct SinkNode {
    pub driver: Box<dyn Sink>,
    pub in_rx: mpsc::Receiver<SinkInput>,
}

/// Everything the runtime needs to start the pipeline
pub(crate) struct Nodes {
    pub sources: BTreeMap<String, SourceNode>,
    pub rules: BTreeMap<String, RuleNode>,
    pub sinks: BTreeMap<String, SinkNode>,
    /// Receivers draining rules that declare no sink
    pub discards: Vec<mpsc::Receiver<SinkInput>>,
}

/// Builds pipelines from raw config bytes.
///
/// Holds the pluggable driver factories and the rule/decoder registries;
/// the pipeline manager owns one and tests inject doubles.
pub struct PipelineBuilder {
    source_factory: Arc<dyn SourceFactory>,
    sink_factory: Arc<dyn SinkFactory>,
    rules: Arc<RuleRegistry>,
    decoders: Arc<DecoderRegistry>,
}

impl PipelineBuilder {
    pub fn new(
        source_factory: Arc<dyn SourceFactory>,
        sink_factory: Arc<dyn SinkFactory>,
        rules: Arc<RuleRegistry>,
        decoders: Arc<DecoderRegistry>,
    ) -> Self {
        Self {
            source_factory,
            sink_factory,
            rules,
            decoders,
        }
    }

    /// Parse, validate and assemble a pipeline from raw JSON bytes.
    ///
    /// The raw bytes are carried on the pipeline verbatim for persistence.
    pub fn build(&self, id: Uuid, raw: &[u8]) -> Result<Pipeline> {
        let config = PipelineConfig::from_slice(raw)?;
        self.build_config(id, Bytes::copy_from_slice(raw), config)
    }

    /// Assemble a pipeline from an already-parsed config
    pub fn build_config(
        &self,
        id: Uuid,
        raw: Bytes,
        config: PipelineConfig,
    ) -> Result<Pipeline> {
        config.validate()?;
        check_acyclic(&config)?;

        let mut states: BTreeMap<String, Arc<State>> = BTreeMap::new();
        for (name, state_config) in &config.states {
            states.insert(name.clone(), State::create(state_config)?);
        }

        let mut sources: BTreeMap<String, SourceNode> = BTreeMap::new();
        for (name, source_config) in &config.sources {
            let driver = self.source_factory.create(name, source_config)?;
            let (tx, rx) = mpsc::channel(NODE_CHANNEL_CAPACITY);
            sources.insert(
                name.clone(),
                SourceNode {
                    driver,
                    tx,
                    rx,
                    children: Vec::new(),
                },
            );
        }

        let mut sinks: BTreeMap<String, SinkNode> = BTreeMap::new();
        let mut sink_txs: HashMap<String, mpsc::Sender<SinkInput>> = HashMap::new();
        for (name, sink_config) in &config.sinks {
            let driver = self.sink_factory.create(name, sink_config)?;
            let (tx, rx) = mpsc::channel(NODE_CHANNEL_CAPACITY);
            sink_txs.insert(name.clone(), tx);
            sinks.insert(name.clone(), SinkNode { driver, in_rx: rx });
        }

        // Rule→rule edges: a forward sink keyed by the consumer feeds an
        // intermediate channel; a forward source keyed by the producer
        // drains it back into the classification path.
        let mut has_forward_edges = false;
        for (producer, rule_config) in &config.rules {
            if !config.rules.contains_key(&rule_config.sink) {
                continue;
            }
            has_forward_edges = true;
            let consumer = rule_config.sink.clone();
            let (fwd_tx, fwd_rx) = mpsc::channel::<Record>(NODE_CHANNEL_CAPACITY);

            let (tx, rx) = mpsc::channel(NODE_CHANNEL_CAPACITY);
            sources.insert(
                producer.clone(),
                SourceNode {
                    driver: Box::new(ForwardSource::new(fwd_rx)),
                    tx,
                    rx,
                    children: Vec::new(),
                },
            );

            let (sink_tx, sink_rx) = mpsc::channel(NODE_CHANNEL_CAPACITY);
            sink_txs.insert(consumer.clone(), sink_tx);
            sinks.insert(
                consumer.clone(),
                SinkNode {
                    driver: Box::new(ForwardSink::new(fwd_tx)),
                    in_rx: sink_rx,
                },
            );
        }

        let mut rules: BTreeMap<String, RuleNode> = BTreeMap::new();
        let mut discards: Vec<mpsc::Receiver<SinkInput>> = Vec::new();
        for (name, rule_config) in &config.rules {
            let state = match rule_config.state.as_str() {
                "" => None,
                state_name => states.get(state_name).cloned(),
            };
            let rule = self.rules.load(Path::new(&rule_config.plugin), state)?;
            let window_interval = rule.window_interval();

            let out_tx = match sink_txs.get(&rule_config.sink) {
                Some(tx) => tx.clone(),
                None => {
                    // No sink declared: drain and drop this rule's output.
                    let (tx, rx) = mpsc::channel(NODE_CHANNEL_CAPACITY);
                    discards.push(rx);
                    tx
                }
            };

            let (in_tx, in_rx) = mpsc::channel(NODE_CHANNEL_CAPACITY);
            rules.insert(
                name.clone(),
                RuleNode {
                    rule: Arc::new(Mutex::new(rule)),
                    window_interval,
                    in_tx,
                    in_rx,
                    out_tx,
                },
            );

            match sources.get_mut(&rule_config.source) {
                Some(parent) => parent.children.push(name.clone()),
                None => return Err(PipelineError::missing_source(&rule_config.source)),
            }
        }

        tracing::info!(
            pipeline = %id,
            sources = sources.len(),
            rules = rules.len(),
            sinks = sinks.len(),
            states = states.len(),
            "pipeline built"
        );

        Ok(Pipeline::from_parts(
            id,
            raw,
            config.event_folder.clone(),
            Arc::clone(&self.decoders),
            Nodes {
                sources,
                rules,
                sinks,
                discards,
            },
            states,
            has_forward_edges,
        ))
    }
}

/// Verify a topological order exists over the configured name graph.
///
/// Nodes are all declared sources, rules and sinks; each rule contributes
/// a `source → rule` and, when a sink is declared, a `rule → sink` edge.
fn check_acyclic(config: &PipelineConfig) -> Result<()> {
    let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
    let mut edges: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for name in config
        .sources
        .keys()
        .chain(config.rules.keys())
        .chain(config.sinks.keys())
    {
        in_degree.entry(name).or_default();
    }

    for (name, rule) in &config.rules {
        edges.entry(&rule.source).or_default().push(name);
        *in_degree.entry(name).or_default() += 1;
        if !rule.sink.is_empty() {
            edges.entry(name).or_default().push(&rule.sink);
            *in_degree.entry(&rule.sink).or_default() += 1;
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| *name)
        .collect();
    let mut visited = 0usize;
    while let Some(name) = queue.pop_front() {
        visited += 1;
        if let Some(children) = edges.get(name) {
            for &child in children {
                // Every edge target was given an in-degree entry above.
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(child);
                    }
                }
            }
        }
    }

    if visited == in_degree.len() {
        Ok(())
    } else {
        let mut remaining: Vec<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree > 0)
            .map(|(name, _)| *name)
            .collect();
        remaining.sort_unstable();
        Err(PipelineError::cycle(remaining.join(", ")))
    }
}
