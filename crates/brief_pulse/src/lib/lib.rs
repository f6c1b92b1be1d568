pub mod acquire;
pub mod analyze;
pub mod checkpoint;
pub mod chunk;
mod error;
mod llm;
mod processor;
pub mod quote;
pub mod report;
pub mod subtitle;
pub mod tracing;

pub use error::Error;
pub use llm::openai;
pub use llm::{
    summarizer::Summarizer,
    transcriber::{AudioInput, TranscribeResponse, TranscribeSegment, Transcriber},
};
pub use processor::{builder::JobProcessorBuilder, ChunkingConfig, JobProcessor};
