pub mod config;
pub mod models;
pub mod pipeline;
pub mod pipeline_config;

pub use models::{GeneratedTask, TaskGenerationRequest, TaskGenerationResponse};
pub use pipeline::{PipelineCache, PipelineError, TaskGenerationPipeline};
pub use pipeline_config::PipelineConfig;

use tracing_subscriber::EnvFilter;

/// Install the global log subscriber. `RUST_LOG` wins over `LOG_LEVEL`.
/// Logs go to stderr so stdout stays clean for JSON output.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    // A second call (tests, embedding hosts) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
