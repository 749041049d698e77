//! Query orchestration: extract, chunk, index, retrieve, answer

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::{AnswerGenerator, Generated};
use crate::ingestion::{DocumentExtractor, ExtractionFailure, TextChunker};
use crate::providers::{EmbeddingProvider, LlmProvider, OllamaProvider};
use crate::retrieval::{IndexBuilder, IndexHandle, RetrievedContext, Retriever};
use crate::types::{Answer, PipelineStage, QueryOptions, QueryOutcome, UploadedFile};

/// Everything a query produced besides the answer itself
#[derive(Debug, Clone)]
pub struct QueryReport {
    pub answer: Answer,
    /// Files skipped because their type has no handler
    pub unsupported: Vec<String>,
    /// Files whose extraction failed
    pub failures: Vec<ExtractionFailure>,
    /// Collection the query was answered from, if one was built
    pub collection: Option<String>,
    /// Last stage reached
    pub stage: PipelineStage,
}

impl QueryReport {
    fn short_circuit(outcome: QueryOutcome, stage: PipelineStage) -> Self {
        Self {
            answer: Answer::short_circuit(outcome),
            unsupported: Vec::new(),
            failures: Vec::new(),
            collection: None,
            stage,
        }
    }
}

/// Deletes a versioned build's file when the query ends, however it ends
struct ScratchCollection(IndexHandle);

impl Drop for ScratchCollection {
    fn drop(&mut self) {
        if let Err(e) = self.0.discard() {
            tracing::warn!("Failed to remove collection '{}': {}", self.0.collection, e);
        }
    }
}

/// Answers a question from a set of uploaded documents
///
/// Each query indexes only the files it was given. Backends are injected so
/// tests can substitute deterministic providers.
pub struct RagPipeline {
    config: RagConfig,
    extractor: DocumentExtractor,
    chunker: Arc<TextChunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
}

impl RagPipeline {
    /// Create a pipeline with explicit providers
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        config.validate()?;
        let chunker = Arc::new(TextChunker::from_config(&config.chunking)?);

        Ok(Self {
            config,
            extractor: DocumentExtractor::new(),
            chunker,
            embedder,
            llm,
        })
    }

    /// Create a pipeline backed by Ollama for both embeddings and generation
    pub fn from_config(config: RagConfig) -> Result<Self> {
        let (embedder, llm) =
            OllamaProvider::new(&config.llm, config.embeddings.dimensions)?.split();
        tracing::info!(
            "Using Ollama at {} (embed: {}, generate: {})",
            config.llm.base_url,
            config.llm.embed_model,
            config.llm.generate_model
        );
        Self::new(config, Arc::new(embedder), Arc::new(llm))
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Answer `question` using only the content of `files`
    pub async fn answer_query(&self, files: &[UploadedFile], question: &str) -> Result<Answer> {
        Ok(self.run(files, question, &QueryOptions::default()).await?.answer)
    }

    /// Answer `question` and report what happened to each file
    pub async fn run(
        &self,
        files: &[UploadedFile],
        question: &str,
        options: &QueryOptions,
    ) -> Result<QueryReport> {
        if files.is_empty() {
            tracing::info!("[{}] No files uploaded", PipelineStage::NoFiles);
            return Ok(QueryReport::short_circuit(
                QueryOutcome::NoFiles,
                PipelineStage::NoFiles,
            ));
        }

        let top_k = options.top_k.unwrap_or(self.config.retrieval.top_k);
        if top_k == 0 {
            return Err(Error::Config("top_k must be at least 1".to_string()));
        }

        // Decoders are CPU-bound and the PDF path may block on a worker thread
        let extractor = self.extractor.clone();
        let owned = files.to_vec();
        let extraction = tokio::task::spawn_blocking(move || extractor.extract(&owned))
            .await
            .map_err(|e| Error::internal(format!("Extraction task failed: {}", e)))?;

        tracing::info!(
            "[{}] {} of {} files extracted ({} failed, {} unsupported)",
            PipelineStage::Extracted,
            extraction.texts.len(),
            files.len(),
            extraction.failures.len(),
            extraction.unsupported.len()
        );

        let mut report = QueryReport {
            answer: Answer::short_circuit(QueryOutcome::NoText),
            unsupported: extraction.unsupported.clone(),
            failures: extraction.failures.clone(),
            collection: None,
            stage: PipelineStage::Extracted,
        };

        if extraction.is_blank() {
            tracing::info!("[{}] No text extracted", PipelineStage::Extracted);
            return Ok(report);
        }

        let chunks = self.chunker.chunk(&extraction.texts)?;
        report.stage = PipelineStage::Chunked;
        tracing::info!("[{}] {} chunks", PipelineStage::Chunked, chunks.len());

        let persist_dir = self.config.index.persist_dir.as_path();
        let handle = IndexBuilder::new(Arc::clone(&self.embedder))
            .versioned(self.config.index.versioned)
            .build(&chunks, &self.config.index.collection_name, Some(persist_dir))
            .await?;
        let _scratch = self
            .config
            .index
            .versioned
            .then(|| ScratchCollection(handle.clone()));
        report.stage = PipelineStage::Indexed;
        report.collection = Some(handle.collection.clone());
        tracing::info!(
            "[{}] Collection '{}' built",
            PipelineStage::Indexed,
            handle.collection
        );

        let results = Retriever::new(Arc::clone(&self.embedder))
            .retrieve(&handle, question, top_k)
            .await?;
        let context = RetrievedContext::from_results(&results);
        report.stage = PipelineStage::Retrieved;
        tracing::info!(
            "[{}] {} chunks retrieved (best similarity {:.3})",
            PipelineStage::Retrieved,
            results.len(),
            results.first().map(|r| r.similarity).unwrap_or(0.0)
        );

        if context.is_blank() {
            report.answer = Answer::short_circuit(QueryOutcome::NoContext);
            return Ok(report);
        }

        let generated = AnswerGenerator::new(Arc::clone(&self.llm))
            .generate(&context.text, question)
            .await?;
        report.stage = PipelineStage::Answered;

        report.answer = match generated {
            Generated::Answer(text) => Answer::answered(text, context.sources),
            Generated::NoContext => Answer::short_circuit(QueryOutcome::NoContext),
        };
        tracing::info!(
            "[{}] {} chars, outcome {:?}",
            PipelineStage::Answered,
            report.answer.text.len(),
            report.answer.outcome
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct PanicEmbedder;

    #[async_trait]
    impl EmbeddingProvider for PanicEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            panic!("embedder must not be called");
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn model(&self) -> &str {
            "none"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "panic"
        }
    }

    struct CountingLlm(AtomicUsize);

    #[async_trait]
    impl LlmProvider for CountingLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok("unused".to_string())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "counting"
        }

        fn model(&self) -> &str {
            "counting"
        }
    }

    fn pipeline(llm: Arc<CountingLlm>) -> RagPipeline {
        let mut config = RagConfig::default();
        config.embeddings.dimensions = 3;
        RagPipeline::new(config, Arc::new(PanicEmbedder), llm).unwrap()
    }

    #[tokio::test]
    async fn test_no_files_short_circuits() {
        let llm = Arc::new(CountingLlm(AtomicUsize::new(0)));
        let answer = pipeline(llm.clone())
            .answer_query(&[], "What color is the sky?")
            .await
            .unwrap();

        assert_eq!(answer.text, "No documents uploaded.");
        assert_eq!(answer.outcome, QueryOutcome::NoFiles);
        assert_eq!(llm.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_text_short_circuits_before_embedding() {
        let llm = Arc::new(CountingLlm(AtomicUsize::new(0)));
        let files = vec![
            UploadedFile::new("empty.txt", ""),
            UploadedFile::new("notes.xlsx", vec![1u8, 2, 3]),
        ];

        let report = pipeline(llm.clone())
            .run(&files, "anything", &QueryOptions::default())
            .await
            .unwrap();

        assert_eq!(report.answer.text, "No text extracted from documents.");
        assert_eq!(report.answer.outcome, QueryOutcome::NoText);
        assert_eq!(report.unsupported, vec!["notes.xlsx".to_string()]);
        assert_eq!(llm.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_top_k_is_rejected() {
        let llm = Arc::new(CountingLlm(AtomicUsize::new(0)));
        let files = vec![UploadedFile::new("a.txt", "text")];
        let options = QueryOptions { top_k: Some(0) };

        let result = pipeline(llm).run(&files, "q", &options).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
