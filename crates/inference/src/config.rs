//! Configuration management for the Cutout inference core
//!
//! Two layers of options travel to the engine: [`EngineSettings`] are
//! applied once per process during the best-effort configuration step,
//! [`TransformOptions`] ride along with every transform call. Both are
//! pinned to single-worker CPU execution; the portability policy trades
//! throughput for never hitting device/isolation failures in the field.

use crate::error::{CutoutConfigError, CutoutResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use validator::Validate;

/// Execution device for the inference engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// CPU execution (the only supported device)
    Cpu,
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
        }
    }
}

/// Model download caching policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    /// Reuse cached model weights whenever present
    PreferCache,
    /// Always fetch fresh model weights
    NoCache,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::PreferCache
    }
}

/// Model variant to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    /// Small model, faster on CPU
    Small,
    /// Medium model, better edges around hair and shoulders
    Medium,
}

impl Default for ModelVariant {
    fn default() -> Self {
        Self::Small
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Small => write!(f, "small"),
            Self::Medium => write!(f, "medium"),
        }
    }
}

/// Output encoding for result artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// PNG with alpha channel
    #[serde(rename = "image/png")]
    Png,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Png
    }
}

impl OutputFormat {
    /// MIME type for this format
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
        }
    }
}

/// Process-level engine execution settings
///
/// Applied at most once per process by the configuration manager.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EngineSettings {
    /// Execution device
    pub device: Device,

    /// Engine worker threads
    #[validate(range(
        min = 1,
        max = 1,
        message = "Worker count is pinned to 1 for portability"
    ))]
    pub worker_threads: usize,

    /// Enable engine debug output
    pub debug: bool,

    /// Model download caching policy
    pub cache_policy: CachePolicy,

    /// Engine sidecar binary (name resolved on PATH, or an explicit path)
    #[validate(length(min = 1, message = "Engine binary cannot be empty"))]
    pub engine_binary: String,

    /// Model cache directory; defaults to the shared cache dir when unset
    pub cache_dir: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            device: Device::Cpu,
            worker_threads: 1,
            debug: false,
            cache_policy: CachePolicy::PreferCache,
            engine_binary: crate::DEFAULT_ENGINE_BINARY.to_string(),
            cache_dir: None,
        }
    }
}

impl EngineSettings {
    /// Resolve the model cache directory for this configuration
    #[must_use]
    pub fn resolved_cache_dir(&self) -> std::path::PathBuf {
        match &self.cache_dir {
            Some(dir) => cutout_shared::resolve_cache_path(dir),
            None => cutout_shared::default_cache_dir(),
        }
    }
}

/// Per-call transform options forwarded to the engine
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransformOptions {
    /// Output encoding; results are always PNG
    pub output_format: OutputFormat,

    /// Encoder quality; 1.0 means no lossy compression
    #[validate(range(
        min = 0.0,
        max = 1.0,
        message = "Quality must be between 0.0 and 1.0"
    ))]
    pub quality: f32,

    /// Model variant to run
    pub model_variant: ModelVariant,

    /// Execution device
    pub device: Device,

    /// Engine worker threads
    #[validate(range(
        min = 1,
        max = 1,
        message = "Worker count is pinned to 1 for portability"
    ))]
    pub worker_threads: usize,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Png,
            quality: 1.0,
            model_variant: ModelVariant::Small,
            device: Device::Cpu,
            worker_threads: 1,
        }
    }
}

/// Top-level configuration for the inference orchestrator
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrchestratorConfig {
    /// Process-level engine settings
    pub engine: EngineSettings,

    /// Per-call transform options
    pub transform: TransformOptions,

    /// Hard deadline for one inference job in milliseconds
    #[validate(range(
        min = 1000,
        max = 600_000,
        message = "Deadline must be between 1000 and 600000 ms"
    ))]
    pub deadline_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            transform: TransformOptions::default(),
            deadline_ms: crate::DEFAULT_DEADLINE_MS,
        }
    }
}

/// Configuration builder for fluent construction
#[derive(Debug, Default)]
pub struct OrchestratorConfigBuilder {
    config: OrchestratorConfig,
}

impl OrchestratorConfigBuilder {
    /// Create a new configuration builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine sidecar binary
    #[must_use]
    pub fn engine_binary<S: Into<String>>(mut self, binary: S) -> Self {
        self.config.engine.engine_binary = binary.into();
        self
    }

    /// Set the model cache directory
    #[must_use]
    pub fn cache_dir<S: Into<String>>(mut self, dir: S) -> Self {
        self.config.engine.cache_dir = Some(dir.into());
        self
    }

    /// Set the model download caching policy
    #[must_use]
    pub const fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.config.engine.cache_policy = policy;
        self
    }

    /// Set the model variant
    #[must_use]
    pub const fn model_variant(mut self, variant: ModelVariant) -> Self {
        self.config.transform.model_variant = variant;
        self
    }

    /// Enable or disable engine debug output
    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.config.engine.debug = debug;
        self
    }

    /// Set the encoder quality
    #[must_use]
    pub const fn quality(mut self, quality: f32) -> Self {
        self.config.transform.quality = quality;
        self
    }

    /// Set the job deadline in milliseconds
    #[must_use]
    pub const fn deadline_ms(mut self, deadline_ms: u64) -> Self {
        self.config.deadline_ms = deadline_ms;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> CutoutResult<OrchestratorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl OrchestratorConfig {
    /// Load configuration from environment variables
    ///
    /// Recognized variables use the `CUTOUT_` prefix; unset variables keep
    /// their defaults.
    pub fn from_env() -> CutoutResult<Self> {
        let mut config = Self::default();

        if let Ok(binary) = env::var("CUTOUT_ENGINE_BINARY") {
            config.engine.engine_binary = binary;
        }

        if let Ok(cache_dir) = env::var("CUTOUT_CACHE_DIR") {
            config.engine.cache_dir = Some(cache_dir);
        }

        if let Ok(debug) = env::var("CUTOUT_ENGINE_DEBUG") {
            config.engine.debug = matches!(debug.as_str(), "1" | "true" | "TRUE");
        }

        if let Ok(variant) = env::var("CUTOUT_MODEL_VARIANT") {
            config.transform.model_variant = match variant.to_lowercase().as_str() {
                "small" => ModelVariant::Small,
                "medium" => ModelVariant::Medium,
                _ => {
                    return Err(CutoutConfigError::InvalidValue {
                        field: "model_variant".to_string(),
                        value: variant,
                        reason: "must be one of: small, medium".to_string(),
                    }
                    .into())
                }
            };
        }

        if let Ok(deadline) = env::var("CUTOUT_DEADLINE_MS") {
            config.deadline_ms =
                deadline
                    .parse()
                    .map_err(|_| CutoutConfigError::InvalidValue {
                        field: "deadline_ms".to_string(),
                        value: deadline,
                        reason: "must be a valid positive integer".to_string(),
                    })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> CutoutResult<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| CutoutConfigError::FileRead(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| CutoutConfigError::Parse(format!("Failed to parse TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> CutoutResult<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| CutoutConfigError::FileRead(format!("Failed to read config file: {e}")))?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| CutoutConfigError::Parse(format!("Failed to parse JSON: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> CutoutResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CutoutConfigError::Parse(format!("Failed to serialize TOML: {e}")))?;

        fs::write(path.as_ref(), content).map_err(|e| {
            CutoutConfigError::FileRead(format!("Failed to write config file: {e}"))
        })?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> CutoutResult<()> {
        Validate::validate(self)?;
        Validate::validate(&self.engine)?;
        Validate::validate(&self.transform)?;

        if self.engine.worker_threads < num_cpus::get() {
            tracing::debug!(
                worker_threads = self.engine.worker_threads,
                host_cores = num_cpus::get(),
                "engine pinned below host core count"
            );
        }

        Ok(())
    }

    /// Job deadline as a [`std::time::Duration`]
    #[must_use]
    pub const fn deadline(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.deadline_ms)
    }
}
