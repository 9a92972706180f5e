//! Shared handler state

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;
use weir_control::PipelineManager;
use weir_pipeline::Pipeline;

/// State shared by all handlers: the manager plus the pipelines this
/// server has started.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<PipelineManager>,
    running: Arc<Mutex<HashMap<Uuid, Arc<Pipeline>>>>,
}

impl AppState {
    pub fn new(manager: Arc<PipelineManager>) -> Self {
        Self {
            manager,
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Track a started pipeline for shutdown
    pub async fn track(&self, pipeline: Arc<Pipeline>) {
        self.running.lock().await.insert(pipeline.id(), pipeline);
    }

    /// Number of pipelines currently tracked
    pub async fn running_count(&self) -> usize {
        self.running.lock().await.len()
    }

    /// Close every tracked pipeline (used at server shutdown)
    pub async fn close_all(&self) {
        let pipelines: Vec<Arc<Pipeline>> = self.running.lock().await.drain().map(|(_, p)| p).collect();
        for pipeline in pipelines {
            pipeline.close().await;
        }
    }
}
