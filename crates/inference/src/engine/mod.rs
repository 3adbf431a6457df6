//! Engine capability surface
//!
//! The third-party background-removal engine is an opaque collaborator:
//! given an image artifact and options it eventually produces transformed
//! bytes or fails. This module pins down the capability surface the
//! orchestration layer consumes and nothing more.
//!
//! Configuration and preloading are optional capabilities. A module that
//! does not expose them is configured by its own defaults; absence is a
//! no-op, never an error.

use crate::artifact::ImageArtifact;
use crate::config::{EngineSettings, TransformOptions};
use crate::progress::ProgressReporter;
use async_trait::async_trait;
use std::sync::Arc;

pub mod sidecar;
pub use sidecar::{SidecarEngine, SidecarEngineLoader};

/// Opaque engine failure
///
/// The orchestrator only ever wraps the description; engine error types
/// are not part of this crate's contract.
pub type EngineError = Box<dyn std::error::Error + Send + Sync>;

/// A loaded engine module
#[async_trait]
pub trait EngineModule: Send + Sync {
    /// Transform the input into background-stripped PNG bytes
    ///
    /// Progress events are reported through `progress` as the engine works.
    async fn transform(
        &self,
        input: &ImageArtifact,
        options: &TransformOptions,
        progress: ProgressReporter,
    ) -> Result<Vec<u8>, EngineError>;

    /// Configuration capability, when the module exposes one
    fn as_configurable(&self) -> Option<&dyn ConfigureCapability> {
        None
    }

    /// Preload capability, when the module exposes one
    fn as_preloadable(&self) -> Option<&dyn PreloadCapability> {
        None
    }
}

/// Optional capability: apply process-level execution settings
#[async_trait]
pub trait ConfigureCapability: Send + Sync {
    /// Apply execution settings to the engine
    async fn configure(
        &self,
        settings: &EngineSettings,
        progress: ProgressReporter,
    ) -> Result<(), EngineError>;
}

/// Optional capability: warm the engine ahead of the first job
#[async_trait]
pub trait PreloadCapability: Send + Sync {
    /// Fetch and initialize model weights ahead of time
    async fn preload(&self, settings: &EngineSettings) -> Result<(), EngineError>;
}

/// Loads the engine module on demand
///
/// Loading is the expensive step (for the sidecar adapter it probes an
/// external binary); callers memoize successful loads and retry failures.
#[async_trait]
pub trait EngineLoader: Send + Sync {
    /// Load the engine module
    async fn load(&self) -> Result<Arc<dyn EngineModule>, EngineError>;
}
