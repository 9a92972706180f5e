//! Forward sink: in-process channel adapter
//!
//! The producing half of a rule→rule edge: receives the upstream rule's
//! output and pushes every non-`None` record into the intermediate channel
//! whose other end feeds a forward source.

use async_trait::async_trait;
use tokio::sync::mpsc;
use weir_event::Record;

use crate::error::Result;
use crate::sink::{Sink, SinkInput};

pub struct ForwardSink {
    tx: mpsc::Sender<Record>,
}

impl ForwardSink {
    pub fn new(tx: mpsc::Sender<Record>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Sink for ForwardSink {
    async fn init(&mut self) -> Result<()> {
        Ok(())
    }

    async fn run(self: Box<Self>, mut input: mpsc::Receiver<SinkInput>) {
        while let Some(value) = input.recv().await {
            let Some(record) = value else { continue };
            if self.tx.send(record).await.is_err() {
                // Downstream edge is gone; drain the rest quietly.
                tracing::debug!("forward target closed, discarding remaining records");
                while input.recv().await.is_some() {}
                return;
            }
        }
    }
}
