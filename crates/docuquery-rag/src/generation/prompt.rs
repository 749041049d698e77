//! Prompt templates for grounded answers

use crate::providers::VectorSearchResult;

/// Prompt builder for context-grounded answers
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join retrieved chunk texts, best match first, into one context string
    pub fn build_context(results: &[VectorSearchResult]) -> String {
        results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Build the prompt that restricts the model to the supplied context
    pub fn build_grounded_prompt(context: &str, question: &str) -> String {
        format!(
            "Answer the question based only on the following context:\n{context}\nQuestion: {question}\n",
            context = context,
            question = question
        )
    }
}
