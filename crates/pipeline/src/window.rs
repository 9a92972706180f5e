//! Window manager
//!
//! One timer task per windowed rule. A coarse one-second scheduler tick
//! checks whether the rule's interval has elapsed since the last firing; if
//! so it invokes the rule's `window` callback and forwards the returned
//! batch, in order, through the rule's output channel — the same channel
//! `process` feeds, so batches interleave with per-record outputs.
//!
//! Window errors are logged and suppressed; one rule's failing window must
//! not stop the others. On shutdown the manager fires once more before
//! exiting, so batch state accumulated since the last tick is emitted
//! rather than lost.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use weir_event::Record;
use weir_rules::Rule;
use weir_sinks::SinkInput;

use crate::metrics::PipelineMetrics;

/// Scheduler tick granularity
const TICK: Duration = Duration::from_secs(1);

pub struct WindowManager {
    rule_name: String,
    rule: Arc<Mutex<Box<dyn Rule>>>,
    out: mpsc::Sender<SinkInput>,
    interval: Duration,
    cancel: CancellationToken,
    metrics: Arc<PipelineMetrics>,
}

impl WindowManager {
    pub fn new(
        rule_name: impl Into<String>,
        rule: Arc<Mutex<Box<dyn Rule>>>,
        out: mpsc::Sender<SinkInput>,
        interval: Duration,
        cancel: CancellationToken,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            rule,
            out,
            interval,
            cancel,
            metrics,
        }
    }

    /// Run until cancelled
    pub async fn run(self) {
        tracing::debug!(
            rule = %self.rule_name,
            interval_secs = self.interval.as_secs(),
            "window manager starting"
        );

        let mut ticker = tokio::time::interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_fired = Instant::now();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    // One final firing so batch state accumulated since the
                    // last tick is emitted instead of dropped at shutdown.
                    self.fire().await;
                    break;
                }
                _ = ticker.tick() => {
                    if last_fired.elapsed() < self.interval {
                        continue;
                    }
                    if !self.fire().await {
                        break;
                    }
                    last_fired = Instant::now();
                }
            }
        }
        tracing::debug!(rule = %self.rule_name, "window manager stopped");
    }

    /// Invoke the rule's window callback and forward its batch.
    /// Returns `false` once the output channel is gone.
    async fn fire(&self) -> bool {
        let outputs = {
            let mut rule = self.rule.lock();
            rule.window()
        };
        self.metrics.record_window_firing();

        let outputs = match outputs {
            Ok(outputs) => outputs,
            Err(e) => {
                self.metrics.record_window_error();
                tracing::error!(rule = %self.rule_name, error = %e, "window callback failed");
                return true;
            }
        };

        for output in outputs {
            if self.out.send(Some(Record::event(output))).await.is_err() {
                tracing::debug!(rule = %self.rule_name, "output channel closed during window");
                return false;
            }
        }
        true
    }
}
