//! One-shot engine configuration
//!
//! The configuration manager applies the engine's execution settings at
//! most once per process lifetime, tolerating any failure along the way.
//! Downstream inference is never blocked by configuration problems: every
//! error in this path is logged and swallowed, and the state still lands
//! on `Configured`.
//!
//! Concurrent first callers share a single memoized in-flight attempt, so
//! the underlying engine-level configuration runs at most once regardless
//! of call timing.

use crate::config::{CachePolicy, EngineSettings};
use crate::engine::{EngineError, EngineLoader};
use crate::progress::logging_reporter;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Worker-thread hint read by the engine runtime at startup
pub const ENV_WORKER_THREADS: &str = "CUTOUT_ENGINE_WORKER_THREADS";

/// Debug-output hint read by the engine runtime at startup
pub const ENV_DEBUG: &str = "CUTOUT_ENGINE_DEBUG";

/// Model cache directory hint read by the engine runtime at startup
pub const ENV_CACHE_DIR: &str = "CUTOUT_ENGINE_CACHE_DIR";

/// Lifecycle of the process-wide configuration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationState {
    /// No attempt has started
    Unconfigured,
    /// An attempt is in flight
    Configuring,
    /// The attempt completed; never reverts, even after failure
    Configured,
}

/// Applies engine execution settings exactly once per process
pub struct ConfigurationManager {
    loader: Arc<dyn EngineLoader>,
    settings: EngineSettings,
    attempted: OnceCell<()>,
    in_flight: AtomicBool,
}

impl ConfigurationManager {
    /// Create a manager for the given loader and settings
    pub fn new(loader: Arc<dyn EngineLoader>, settings: EngineSettings) -> Self {
        Self {
            loader,
            settings,
            attempted: OnceCell::new(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Current configuration state
    pub fn state(&self) -> ConfigurationState {
        if self.attempted.initialized() {
            ConfigurationState::Configured
        } else if self.in_flight.load(Ordering::Acquire) {
            ConfigurationState::Configuring
        } else {
            ConfigurationState::Unconfigured
        }
    }

    /// Ensure the configuration attempt has run
    ///
    /// Always succeeds from the caller's point of view. The first call
    /// performs the attempt; concurrent callers await that same attempt
    /// rather than re-entering it.
    pub async fn ensure_configured(&self) {
        self.attempted
            .get_or_init(|| async {
                self.in_flight.store(true, Ordering::Release);
                match self.try_configure().await {
                    Ok(()) => info!("engine configured (single worker, cpu)"),
                    Err(e) => {
                        warn!(error = %e, "engine configuration failed, continuing with defaults");
                    }
                }
            })
            .await;
    }

    /// The underlying best-effort attempt
    async fn try_configure(&self) -> Result<(), EngineError> {
        // Hints must land before the engine runtime reads them; spawned
        // engine processes inherit this environment.
        self.apply_environment_hints();

        let module = self.loader.load().await?;

        match module.as_configurable() {
            Some(configurable) => {
                configurable
                    .configure(&self.settings, logging_reporter())
                    .await?;
            }
            None => {
                debug!("configure capability not available, using engine defaults");
            }
        }

        // Warming is opportunistic; the model loads on demand otherwise.
        if let Some(preloadable) = module.as_preloadable() {
            if let Err(e) = preloadable.preload(&self.settings).await {
                debug!(error = %e, "preload failed, model will load on demand");
            }
        }

        Ok(())
    }

    fn apply_environment_hints(&self) {
        env::set_var(ENV_WORKER_THREADS, self.settings.worker_threads.to_string());
        env::set_var(ENV_DEBUG, if self.settings.debug { "1" } else { "0" });
        if self.settings.cache_policy == CachePolicy::PreferCache {
            env::set_var(
                ENV_CACHE_DIR,
                self.settings.resolved_cache_dir().as_os_str(),
            );
        }
    }
}
