//! # Cutout Inference
//!
//! Inference-job orchestration for on-device portrait background removal.
//! This crate wraps a third-party inference engine behind a typed capability
//! surface and owns everything between "caller hands us an image" and
//! "caller gets a PNG artifact or a normalized error":
//!
//! - **One-shot engine configuration**: best-effort, idempotent setup of the
//!   engine's execution environment (single CPU worker, debug off, cached
//!   model fetches). Failures are logged and swallowed; inference is never
//!   blocked by configuration problems.
//! - **Lazy engine loading**: the heavy engine module is loaded on first
//!   use and memoized; a failed load is retried on the next job.
//! - **Deadline-raced execution**: each job races the engine call against a
//!   hard 120 second deadline. The losing side is abandoned, not cancelled.
//! - **Progress reporting**: inference-stage progress is forwarded to the
//!   caller as a 0-100 percentage; other engine stages go to logging only.
//! - **Result packaging**: raw engine output becomes a typed PNG artifact
//!   with a derived name and fresh timestamp.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cutout_inference::{ImageArtifact, Orchestrator, OrchestratorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OrchestratorConfig::from_env()?;
//!     let orchestrator = Orchestrator::with_sidecar(config);
//!
//!     let input = ImageArtifact::new("employee.jpg", "image/jpeg", vec![0u8; 16]);
//!     let result = orchestrator.run(input).await?;
//!     assert_eq!(result.mime_type, "image/png");
//!     Ok(())
//! }
//! ```

// Core modules
pub mod artifact;
pub mod config;
pub mod error;
pub mod progress;

// Engine capability surface and adapters
pub mod engine;

// Job orchestration
pub mod job;
pub mod orchestrator;
pub mod setup;

// Re-export core types for convenience
pub use artifact::{derive_output_name, ImageArtifact, RESULT_MIME_TYPE};
pub use config::{
    CachePolicy, Device, EngineSettings, ModelVariant, OrchestratorConfig,
    OrchestratorConfigBuilder, OutputFormat, TransformOptions,
};
pub use engine::{
    ConfigureCapability, EngineError, EngineLoader, EngineModule, PreloadCapability,
    SidecarEngineLoader,
};
pub use error::{CutoutConfigError, CutoutError, CutoutResult};
pub use job::{InferenceJob, JobState};
pub use orchestrator::Orchestrator;
pub use progress::{percent_complete, ProgressCallback, ProgressReporter, ProgressStage};
pub use setup::{ConfigurationManager, ConfigurationState};

/// Hard deadline for one inference job, in milliseconds
pub const DEFAULT_DEADLINE_MS: u64 = 120_000;

/// Engine sidecar binary resolved from PATH when not configured explicitly
pub const DEFAULT_ENGINE_BINARY: &str = "cutout-engine";

/// Current version of the Cutout inference crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
