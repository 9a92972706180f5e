//! Forward source: in-process channel adapter
//!
//! The consuming half of a rule→rule edge. The DAG builder creates an
//! intermediate channel, hands the sending half to a forward sink on the
//! producer rule and the receiving half to this source, which feeds the
//! consumer rule through the normal source path (including event-type
//! classification of the forwarded bytes).

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use weir_event::Record;

use crate::error::Result;
use crate::source::Source;

pub struct ForwardSource {
    rx: mpsc::Receiver<Record>,
}

impl ForwardSource {
    pub fn new(rx: mpsc::Receiver<Record>) -> Self {
        Self { rx }
    }
}

#[async_trait]
impl Source for ForwardSource {
    async fn init(&mut self) -> Result<()> {
        Ok(())
    }

    async fn retrieve(mut self: Box<Self>, out: mpsc::Sender<Bytes>, cancel: CancellationToken) {
        // Deliberately ignores cancellation: the intermediate channel is
        // guaranteed to close once the producer rule shuts down (the graph
        // is acyclic), and draining it first means records already emitted
        // by the upstream rule are not lost at shutdown.
        let _ = cancel;
        while let Some(record) = self.rx.recv().await {
            if out.send(record.into_bytes()).await.is_err() {
                break;
            }
        }
    }
}
