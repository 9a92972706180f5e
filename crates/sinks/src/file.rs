//! File sink: append, one value per line, durable per write

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use weir_event::Record;

use crate::error::{Result, SinkError};
use crate::sink::{Sink, SinkInput};

/// Appends each record to a file as one line and fsyncs after every write.
///
/// Raw records are written verbatim, so a pass-through pipeline reproduces
/// its input bytes; structured records are written as JSON.
pub struct FileSink {
    path: String,
    file: Option<File>,
}

impl FileSink {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    fn encode(record: &Record) -> Vec<u8> {
        match record {
            Record::Raw(bytes) => bytes.to_vec(),
            other => serde_json::to_vec(&other.to_json()).unwrap_or_default(),
        }
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn init(&mut self) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await
            .map_err(|e| SinkError::init(format!("unable to open file {}: {e}", self.path)))?;
        self.file = Some(file);
        Ok(())
    }

    async fn run(self: Box<Self>, mut input: mpsc::Receiver<SinkInput>) {
        let Some(mut file) = self.file else {
            tracing::error!(path = %self.path, "file sink was not initialized");
            return;
        };

        tracing::debug!(path = %self.path, "file sink writing");
        while let Some(value) = input.recv().await {
            let Some(record) = value else { continue };

            let mut line = Self::encode(&record);
            line.push(b'\n');
            if let Err(e) = file.write_all(&line).await {
                tracing::error!(path = %self.path, error = %e, "unable to write to file");
                continue;
            }
            if let Err(e) = file.sync_data().await {
                tracing::error!(path = %self.path, error = %e, "unable to sync file");
            }
        }
        let _ = file.flush().await;
        tracing::debug!(path = %self.path, "file sink finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;

    async fn run_sink(path: &std::path::Path, values: Vec<SinkInput>) {
        let mut sink = FileSink::new(path.display().to_string());
        sink.init().await.unwrap();

        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(Box::new(sink).run(rx));
        for value in values {
            tx.send(value).await.unwrap();
        }
        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");

        run_sink(
            &path,
            vec![
                Some(Record::Raw(Bytes::from_static(b"a"))),
                Some(Record::Value(json!(1))),
            ],
        )
        .await;

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "a\n1\n");
    }

    #[tokio::test]
    async fn test_none_markers_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");

        run_sink(&path, vec![None, None, None]).await;

        // The file exists but holds no lines.
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.is_empty());
    }

    #[tokio::test]
    async fn test_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        std::fs::write(&path, "existing\n").unwrap();

        run_sink(&path, vec![Some(Record::Raw(Bytes::from_static(b"new")))]).await;

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "existing\nnew\n");
    }

    #[tokio::test]
    async fn test_unwritable_path_fails_init() {
        let mut sink = FileSink::new("/definitely/not/a/dir/out.log");
        assert!(sink.init().await.is_err());
    }
}
