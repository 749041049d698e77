//! Application state for the query server

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::config::RagConfig;
use crate::error::Result;
use crate::pipeline::RagPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pipeline: RagPipeline,
    /// Serialises queries that rebuild the shared collection
    collection_lock: Mutex<()>,
    /// Backends answered the last health check
    ready: RwLock<bool>,
}

impl AppState {
    /// Create state backed by Ollama
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing query server state...");
        let state = Self::from_pipeline(RagPipeline::from_config(config)?);

        if !state.refresh_ready().await {
            tracing::warn!(
                "Ollama is not reachable at {}; queries will fail until it is",
                state.config().llm.base_url
            );
        }

        Ok(state)
    }

    /// Wrap an existing pipeline
    pub fn from_pipeline(pipeline: RagPipeline) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                pipeline,
                collection_lock: Mutex::new(()),
                ready: RwLock::new(false),
            }),
        }
    }

    pub fn pipeline(&self) -> &RagPipeline {
        &self.inner.pipeline
    }

    pub fn config(&self) -> &RagConfig {
        self.inner.pipeline.config()
    }

    /// Exclusive access to the shared collection
    ///
    /// Versioned collections are private to their query, so no guard is needed.
    pub async fn collection_guard(&self) -> Option<MutexGuard<'_, ()>> {
        if self.config().index.versioned {
            None
        } else {
            Some(self.inner.collection_lock.lock().await)
        }
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }

    /// Re-check both backends and record the result
    pub async fn refresh_ready(&self) -> bool {
        let pipeline = &self.inner.pipeline;
        let embedder_ok = pipeline.embedder().health_check().await.unwrap_or(false);
        let llm_ok = pipeline.llm().health_check().await.unwrap_or(false);

        let ready = embedder_ok && llm_ok;
        self.set_ready(ready);
        ready
    }
}
