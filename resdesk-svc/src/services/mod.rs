//! Service layer: LLM gateway, prompt construction, analysis, pipeline

pub mod analyst;
pub mod gemini;
pub mod pipeline;
pub mod prompt;

pub use analyst::Analyst;
pub use gemini::{GeminiClient, ModelGateway};
pub use pipeline::{ClassificationPipeline, PipelineSession};
