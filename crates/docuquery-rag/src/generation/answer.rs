//! Answer generator: grounded prompt + one model call

use std::sync::Arc;

use crate::error::Result;
use crate::providers::LlmProvider;
use crate::types::response::NO_CONTEXT_MESSAGE;

use super::prompt::PromptBuilder;

/// What the generator produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    /// Model output, returned verbatim
    Answer(String),
    /// Nothing to answer from: blank context or a blank model reply
    NoContext,
}

impl Generated {
    /// Text shown to the user
    pub fn text(&self) -> &str {
        match self {
            Self::Answer(text) => text,
            Self::NoContext => NO_CONTEXT_MESSAGE,
        }
    }
}

/// Produces an answer from retrieved context and a question
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Generate an answer using only `context`
    ///
    /// Blank context gives [`Generated::NoContext`] without calling the
    /// model, as does a blank model reply. Backend failures are returned
    /// as-is.
    pub async fn generate(&self, context: &str, question: &str) -> Result<Generated> {
        if context.trim().is_empty() {
            tracing::info!("Empty context, skipping model call");
            return Ok(Generated::NoContext);
        }

        let prompt = PromptBuilder::build_grounded_prompt(context, question);
        tracing::debug!(
            "Prompt: {} chars for {} ({})",
            prompt.len(),
            self.llm.name(),
            self.llm.model()
        );

        let answer = self.llm.generate(&prompt).await?;
        if answer.trim().is_empty() {
            tracing::warn!("{} returned a blank answer", self.llm.model());
            return Ok(Generated::NoContext);
        }

        Ok(Generated::Answer(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLlm {
        calls: AtomicUsize,
        fail: bool,
        reply: Option<&'static str>,
    }

    #[async_trait]
    impl LlmProvider for CountingLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::generation("model offline"));
            }
            match self.reply {
                Some(reply) => Ok(reply.to_string()),
                None => Ok(format!("echo: {}", prompt)),
            }
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(!self.fail)
        }

        fn name(&self) -> &str {
            "counting"
        }

        fn model(&self) -> &str {
            "test"
        }
    }

    fn llm(fail: bool) -> Arc<CountingLlm> {
        Arc::new(CountingLlm {
            calls: AtomicUsize::new(0),
            fail,
            reply: None,
        })
    }

    #[tokio::test]
    async fn test_blank_context_skips_model() {
        let backend = llm(false);
        let generator = AnswerGenerator::new(backend.clone());

        let answer = generator.generate(" \n\t", "What color is the sky?").await.unwrap();

        assert_eq!(answer, Generated::NoContext);
        assert_eq!(answer.text(), NO_CONTEXT_MESSAGE);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_context_is_sent_once() {
        let backend = llm(false);
        let generator = AnswerGenerator::new(backend.clone());

        let answer = generator
            .generate("The sky is blue.", "What color is the sky?")
            .await
            .unwrap();

        assert!(answer.text().contains("The sky is blue."));
        assert!(answer.text().contains("Question: What color is the sky?"));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_reply_becomes_canned_message() {
        let backend = Arc::new(CountingLlm {
            calls: AtomicUsize::new(0),
            fail: false,
            reply: Some("  \n"),
        });
        let generator = AnswerGenerator::new(backend.clone());

        let answer = generator.generate("The sky is blue.", "q").await.unwrap();

        assert_eq!(answer, Generated::NoContext);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reply_matching_canned_text_is_still_an_answer() {
        let backend = Arc::new(CountingLlm {
            calls: AtomicUsize::new(0),
            fail: false,
            reply: Some(NO_CONTEXT_MESSAGE),
        });
        let generator = AnswerGenerator::new(backend);

        let answer = generator.generate("The sky is blue.", "q").await.unwrap();

        assert_eq!(answer, Generated::Answer(NO_CONTEXT_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn test_backend_failure_is_not_retried() {
        let backend = llm(true);
        let generator = AnswerGenerator::new(backend.clone());

        let err = generator.generate("ctx", "q").await.unwrap_err();

        assert!(matches!(err, Error::Generation(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }
}
