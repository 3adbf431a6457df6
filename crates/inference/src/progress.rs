//! Progress reporting for inference jobs
//!
//! The engine reports `(stage, current, total)` triples. Only the
//! inference-compute stage is caller-visible: it becomes a 0-100
//! percentage on the caller's sink. Model downloads and any other internal
//! stages are a separate axis of work and go to logging only.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

/// Engine-reported work stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressStage {
    /// Model weights download
    #[serde(rename = "fetch:model")]
    ModelFetch,
    /// The inference computation itself
    #[serde(rename = "compute:inference")]
    Inference,
    /// Any other engine-internal stage
    #[serde(untagged)]
    Other(String),
}

/// Caller-side progress sink, invoked with a 0-100 percentage
pub type ProgressCallback = Arc<dyn Fn(f32) + Send + Sync>;

/// Engine-side progress reporter
pub type ProgressReporter = Arc<dyn Fn(ProgressStage, u64, u64) + Send + Sync>;

/// Compute a bounded completion percentage from a `(current, total)` pair
#[must_use]
pub fn percent_complete(current: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    ((current as f32 / total as f32) * 100.0).clamp(0.0, 100.0)
}

/// A reporter that forwards every stage to logging only
///
/// Used during the configuration step, where no caller sink exists yet.
#[must_use]
pub fn logging_reporter() -> ProgressReporter {
    Arc::new(|stage, current, total| match stage {
        ProgressStage::ModelFetch => {
            debug!(
                "downloading model: {:.0}%",
                percent_complete(current, total)
            );
        }
        ProgressStage::Inference => {
            debug!("inference: {:.0}%", percent_complete(current, total));
        }
        ProgressStage::Other(key) => {
            trace!(stage = %key, current, total, "engine progress");
        }
    })
}
