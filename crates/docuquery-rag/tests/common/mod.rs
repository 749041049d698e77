//! Deterministic providers shared by the integration tests

#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use docuquery_rag::providers::{EmbeddingProvider, LlmProvider};
use docuquery_rag::{Error, RagConfig, RagPipeline, Result};

pub const DIMENSIONS: usize = 512;

/// Bag-of-words embedder: each lowercase word is hashed onto one axis
#[derive(Default)]
pub struct BagOfWordsEmbedder {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl BagOfWordsEmbedder {
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::embedding("embedding backend unreachable"));
        }

        let mut vector = vec![0.0f32; DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % DIMENSIONS as u64) as usize] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn model(&self) -> &str {
        "bag-of-words"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// How [`ScriptedLlm`] replies
pub enum Reply {
    /// Return the context section of the prompt
    EchoContext,
    Fixed(&'static str),
    Fail,
}

/// LLM that records prompts and answers from a script
pub struct ScriptedLlm {
    pub reply: Reply,
    pub calls: AtomicUsize,
    pub prompts: parking_lot::Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            prompts: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());

        match self.reply {
            Reply::EchoContext => {
                let body = prompt
                    .split_once("context:\n")
                    .map(|(_, rest)| rest)
                    .unwrap_or(prompt);
                let context = body.split("\nQuestion:").next().unwrap_or(body);
                Ok(context.trim().to_string())
            }
            Reply::Fixed(text) => Ok(text.to_string()),
            Reply::Fail => Err(Error::generation("model backend timed out")),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!matches!(self.reply, Reply::Fail))
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Config that persists under `dir` and embeds into [`DIMENSIONS`]
pub fn test_config(dir: &Path) -> RagConfig {
    let mut config = RagConfig::default();
    config.embeddings.dimensions = DIMENSIONS;
    config.index.persist_dir = dir.to_path_buf();
    config
}

pub fn pipeline(
    config: RagConfig,
    embedder: Arc<BagOfWordsEmbedder>,
    llm: Arc<ScriptedLlm>,
) -> RagPipeline {
    RagPipeline::new(config, embedder, llm).expect("valid test config")
}
