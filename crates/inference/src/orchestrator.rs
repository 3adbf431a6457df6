//! Inference orchestration
//!
//! One [`Orchestrator::run`] call performs exactly one image-to-image
//! transformation with bounded latency and a single failure surface:
//! best-effort configuration, lazy engine loading, the deadline race, and
//! result packaging all live here.

use crate::artifact::{self, ImageArtifact};
use crate::config::OrchestratorConfig;
use crate::engine::{EngineLoader, EngineModule, SidecarEngineLoader};
use crate::error::{CutoutError, CutoutResult};
use crate::job::{InferenceJob, JobState};
use crate::progress::{percent_complete, ProgressCallback, ProgressReporter, ProgressStage};
use crate::setup::ConfigurationManager;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, trace, warn};

/// Runs inference jobs against the configured engine
///
/// Multiple `run` calls may be in flight concurrently; each owns an
/// independent job and does not block on another job's completion. One
/// orchestrator is shared per process so that engine configuration and
/// module loading happen once.
pub struct Orchestrator {
    config: OrchestratorConfig,
    loader: Arc<dyn EngineLoader>,
    module: OnceCell<Arc<dyn EngineModule>>,
    setup: ConfigurationManager,
}

impl Orchestrator {
    /// Create an orchestrator with an explicit engine loader
    pub fn new(config: OrchestratorConfig, loader: Arc<dyn EngineLoader>) -> Self {
        let setup = ConfigurationManager::new(Arc::clone(&loader), config.engine.clone());
        Self {
            config,
            loader,
            module: OnceCell::new(),
            setup,
        }
    }

    /// Create an orchestrator driving the sidecar engine binary
    #[must_use]
    pub fn with_sidecar(config: OrchestratorConfig) -> Self {
        let loader = Arc::new(SidecarEngineLoader::new(config.engine.clone()));
        Self::new(config, loader)
    }

    /// The active configuration
    #[must_use]
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// The configuration manager owning the one-shot setup state
    #[must_use]
    pub const fn configuration(&self) -> &ConfigurationManager {
        &self.setup
    }

    /// Run one inference job without progress reporting
    pub async fn run(&self, input: ImageArtifact) -> CutoutResult<ImageArtifact> {
        self.run_inner(input, None).await
    }

    /// Run one inference job, forwarding inference progress to `progress`
    ///
    /// The callback receives 0-100 percentages; there is no guaranteed
    /// final 100 when the job fails.
    pub async fn run_with_progress(
        &self,
        input: ImageArtifact,
        progress: ProgressCallback,
    ) -> CutoutResult<ImageArtifact> {
        self.run_inner(input, Some(progress)).await
    }

    async fn run_inner(
        &self,
        input: ImageArtifact,
        progress: Option<ProgressCallback>,
    ) -> CutoutResult<ImageArtifact> {
        let mut job = InferenceJob::new(input.name.clone(), self.config.deadline());
        info!(
            job_id = job.id(),
            name = %input.name,
            mime_type = %input.mime_type,
            size_bytes = input.size_bytes(),
            "inference job accepted"
        );

        // Best-effort; a failed attempt never aborts the job.
        self.setup.ensure_configured().await;

        // Only a successful load is memoized; a failed one is retried on
        // the next job.
        let module = match self
            .module
            .get_or_try_init(|| async {
                self.loader
                    .load()
                    .await
                    .map_err(|e| CutoutError::engine_load(e.to_string()))
            })
            .await
        {
            Ok(module) => Arc::clone(module),
            Err(e) => {
                job.finish(JobState::Failed);
                warn!(job_id = job.id(), error = %e, "engine module load failed");
                return Err(e);
            }
        };

        let reporter = forwarding_reporter(job.id(), progress);
        let options = self.config.transform.clone();
        let input_name = input.name.clone();
        job.start();

        // Deadline race: the engine call runs on its own task. If the
        // timer fires first, dropping the join handle detaches the task
        // rather than cancelling it; the abandoned call keeps consuming
        // CPU until it settles and its result is discarded.
        let engine_call =
            tokio::spawn(async move { module.transform(&input, &options, reporter).await });

        match tokio::time::timeout(job.deadline(), engine_call).await {
            Err(_elapsed) => {
                job.finish(JobState::TimedOut);
                warn!(
                    job_id = job.id(),
                    name = %job.input_name(),
                    deadline_ms = job.deadline().as_millis() as u64,
                    "deadline elapsed, abandoning engine call"
                );
                Err(CutoutError::timeout(job.deadline(), "background removal"))
            }
            Ok(Err(join_error)) => {
                job.finish(JobState::Failed);
                warn!(job_id = job.id(), error = %join_error, "engine task aborted");
                Err(CutoutError::inference(format!(
                    "engine task aborted: {join_error}"
                )))
            }
            Ok(Ok(Err(engine_error))) => {
                job.finish(JobState::Failed);
                warn!(job_id = job.id(), error = %engine_error, "engine call rejected");
                // The input is never substituted for a failed result;
                // failure is always observable to the caller.
                Err(CutoutError::inference(engine_error.to_string()))
            }
            Ok(Ok(Ok(bytes))) => match artifact::package_result(&input_name, bytes) {
                Ok(result) => {
                    job.finish(JobState::Succeeded);
                    info!(
                        job_id = job.id(),
                        name = %result.name,
                        size_bytes = result.size_bytes(),
                        elapsed_ms = job.elapsed().as_millis() as u64,
                        "inference job complete"
                    );
                    Ok(result)
                }
                Err(e) => {
                    job.finish(JobState::Failed);
                    warn!(job_id = job.id(), error = %e, "result packaging failed");
                    Err(e)
                }
            },
        }
    }
}

/// Build the engine-side reporter that fans progress out per stage
///
/// Inference-compute progress becomes a caller-visible percentage; model
/// downloads and unknown stages are a separate axis of work and go to
/// logging only.
fn forwarding_reporter(job_id: u64, progress: Option<ProgressCallback>) -> ProgressReporter {
    Arc::new(move |stage, current, total| match stage {
        ProgressStage::Inference => {
            let percent = percent_complete(current, total);
            debug!(job_id, "processing: {percent:.0}%");
            if let Some(callback) = &progress {
                (callback.as_ref())(percent);
            }
        }
        ProgressStage::ModelFetch => {
            debug!(
                job_id,
                "downloading model: {:.0}%",
                percent_complete(current, total)
            );
        }
        ProgressStage::Other(key) => {
            trace!(job_id, stage = %key, current, total, "engine progress");
        }
    })
}
