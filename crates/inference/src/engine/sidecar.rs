//! Sidecar engine adapter
//!
//! Drives the third-party background-removal engine as an external
//! executable. Loading probes the binary and its optional capabilities;
//! each operation is one subprocess invocation:
//!
//! - `capabilities` — JSON capability listing on stdout
//! - `configure --options <json>` — apply process-level settings
//! - `preload --options <json>` — warm model weights
//! - `transform --options <json>` — image bytes on stdin, PNG on stdout
//!
//! Progress crosses the boundary as newline-delimited JSON events on
//! stderr; any non-JSON stderr line is engine diagnostics and goes to
//! logging.

use crate::artifact::ImageArtifact;
use crate::config::{EngineSettings, TransformOptions};
use crate::engine::{
    ConfigureCapability, EngineError, EngineLoader, EngineModule, PreloadCapability,
};
use crate::progress::{logging_reporter, ProgressReporter, ProgressStage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Optional operations advertised by an engine binary
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngineCapabilities {
    /// Binary accepts the `configure` subcommand
    #[serde(default)]
    pub configure: bool,
    /// Binary accepts the `preload` subcommand
    #[serde(default)]
    pub preload: bool,
}

/// One progress event on the engine's stderr channel
#[derive(Debug, Serialize, Deserialize)]
struct ProgressEvent {
    stage: ProgressStage,
    current: u64,
    total: u64,
}

/// Loads the sidecar engine by probing its binary
pub struct SidecarEngineLoader {
    settings: EngineSettings,
}

impl SidecarEngineLoader {
    /// Create a loader for the configured engine binary
    #[must_use]
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl EngineLoader for SidecarEngineLoader {
    async fn load(&self) -> Result<Arc<dyn EngineModule>, EngineError> {
        let binary = self.settings.engine_binary.clone();

        let output = Command::new(&binary)
            .arg("capabilities")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| format!("engine binary {binary:?} could not be started: {e}"))?;

        // A binary that runs but cannot list capabilities still transforms;
        // optional operations are simply treated as absent.
        let capabilities = if output.status.success() {
            serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
                debug!("capability listing unreadable ({e}), assuming transform only");
                EngineCapabilities::default()
            })
        } else {
            debug!(
                "capability probe exited with {}, assuming transform only",
                output.status
            );
            EngineCapabilities::default()
        };

        debug!(
            configure = capabilities.configure,
            preload = capabilities.preload,
            "engine module loaded"
        );

        Ok(Arc::new(SidecarEngine {
            binary,
            capabilities,
        }))
    }
}

/// A loaded sidecar engine module
pub struct SidecarEngine {
    binary: String,
    capabilities: EngineCapabilities,
}

impl SidecarEngine {
    /// Run one engine subcommand to completion, streaming progress
    async fn run_subcommand(
        &self,
        subcommand: &str,
        options_json: String,
        input: Option<&[u8]>,
        progress: ProgressReporter,
    ) -> Result<Vec<u8>, EngineError> {
        let mut child = Command::new(&self.binary)
            .arg(subcommand)
            .arg("--options")
            .arg(options_json)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Abandoned jobs let the engine run to natural completion
            .kill_on_drop(false)
            .spawn()
            .map_err(|e| format!("failed to start engine {:?}: {e}", self.binary))?;

        // Feed stdin from its own task; a large input must not deadlock
        // against the child filling its stdout pipe.
        let writer = match input {
            Some(bytes) => {
                let mut stdin = child.stdin.take().ok_or("engine stdin unavailable")?;
                let bytes = bytes.to_vec();
                Some(tokio::spawn(async move {
                    let _ = stdin.write_all(&bytes).await;
                    let _ = stdin.shutdown().await;
                }))
            }
            None => None,
        };

        let stderr = child.stderr.take().ok_or("engine stderr unavailable")?;
        let progress_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut last_diagnostic: Option<String> = None;
            while let Ok(Some(line)) = lines.next_line().await {
                match serde_json::from_str::<ProgressEvent>(&line) {
                    Ok(event) => (*progress)(event.stage, event.current, event.total),
                    Err(_) => {
                        debug!(target: "cutout::engine", "{line}");
                        last_diagnostic = Some(line);
                    }
                }
            }
            last_diagnostic
        });

        let mut stdout_bytes = Vec::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout
                .read_to_end(&mut stdout_bytes)
                .await
                .map_err(|e| format!("failed to read engine output: {e}"))?;
        }

        let status = child
            .wait()
            .await
            .map_err(|e| format!("failed to wait for engine: {e}"))?;
        if let Some(writer) = writer {
            let _ = writer.await;
        }
        let diagnostic = progress_task.await.ok().flatten();

        if !status.success() {
            let detail = diagnostic.unwrap_or_else(|| format!("exit status {status}"));
            return Err(detail.into());
        }

        Ok(stdout_bytes)
    }
}

#[async_trait]
impl EngineModule for SidecarEngine {
    async fn transform(
        &self,
        input: &ImageArtifact,
        options: &TransformOptions,
        progress: ProgressReporter,
    ) -> Result<Vec<u8>, EngineError> {
        let options_json = serde_json::to_string(options)?;
        self.run_subcommand("transform", options_json, Some(&input.bytes), progress)
            .await
    }

    fn as_configurable(&self) -> Option<&dyn ConfigureCapability> {
        if self.capabilities.configure {
            Some(self)
        } else {
            None
        }
    }

    fn as_preloadable(&self) -> Option<&dyn PreloadCapability> {
        if self.capabilities.preload {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl ConfigureCapability for SidecarEngine {
    async fn configure(
        &self,
        settings: &EngineSettings,
        progress: ProgressReporter,
    ) -> Result<(), EngineError> {
        let options_json = serde_json::to_string(settings)?;
        self.run_subcommand("configure", options_json, None, progress)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PreloadCapability for SidecarEngine {
    async fn preload(&self, settings: &EngineSettings) -> Result<(), EngineError> {
        let options_json = serde_json::to_string(settings)?;
        self.run_subcommand("preload", options_json, None, logging_reporter())
            .await?;
        Ok(())
    }
}
