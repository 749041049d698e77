//! Grounded answer generation

pub mod answer;
pub mod ollama;
pub mod prompt;

pub use answer::{AnswerGenerator, Generated};
pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;
