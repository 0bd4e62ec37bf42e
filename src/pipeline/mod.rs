pub mod segment;
pub mod classify;
pub mod generation;
pub mod postprocess;
pub mod refine;
pub mod context;
pub mod orchestrator;

pub use context::*;
pub use orchestrator::*;

use thiserror::Error;

use generation::GenerationError;

/// Construction-time failures. Document content never produces one of these.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unknown generation mode: {0}")]
    UnknownMode(String),

    #[error("Unknown LLM provider: {0}")]
    UnknownProvider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generator setup failed: {0}")]
    Generation(#[from] GenerationError),
}
