//! File source: one record per line

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SourceError};
use crate::source::Source;

/// Reads a regular file and emits each line as one raw record, then closes.
pub struct FileSource {
    path: String,
    file: Option<File>,
}

impl FileSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }
}

#[async_trait]
impl Source for FileSource {
    async fn init(&mut self) -> Result<()> {
        let file = File::open(&self.path)
            .await
            .map_err(|e| SourceError::init(format!("unable to open file {}: {e}", self.path)))?;
        self.file = Some(file);
        Ok(())
    }

    async fn retrieve(self: Box<Self>, out: mpsc::Sender<Bytes>, cancel: CancellationToken) {
        let Some(file) = self.file else {
            tracing::error!(path = %self.path, "file source was not initialized");
            return;
        };

        tracing::debug!(path = %self.path, "file source reading");
        let mut lines = BufReader::new(file).lines();
        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => break,
                line = lines.next_line() => line,
            };
            match line {
                Ok(Some(line)) => {
                    let sent = tokio::select! {
                        _ = cancel.cancelled() => false,
                        res = out.send(Bytes::from(line)) => res.is_ok(),
                    };
                    if !sent {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(path = %self.path, error = %e, "unable to read file");
                    break;
                }
            }
        }
        tracing::debug!(path = %self.path, "file source finished");
    }
}
