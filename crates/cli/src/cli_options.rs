//! CLI options for the Cutout driver
//!
//! Defines the command-line surface and maps it onto the orchestrator
//! configuration. Flags mirror the `CUTOUT_*` environment variables so the
//! binary drops into scripted pipelines unchanged.

use clap::Parser;
use cutout_inference::{
    CutoutConfigError, CutoutResult, ImageArtifact, ModelVariant, Orchestrator,
    OrchestratorConfig,
};
use cutout_shared::LoggingOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Cutout - strip the background from a portrait photo
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CutoutCliOptions {
    /// Input image file
    pub input: PathBuf,

    /// Output file; defaults to the derived PNG name next to the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Engine sidecar binary
    #[arg(long, env = "CUTOUT_ENGINE_BINARY")]
    pub engine_binary: Option<String>,

    /// Model variant (small, medium)
    #[arg(long, env = "CUTOUT_MODEL_VARIANT")]
    pub model_variant: Option<String>,

    /// Job deadline in milliseconds
    #[arg(long, env = "CUTOUT_DEADLINE_MS")]
    pub deadline_ms: Option<u64>,

    /// Model cache directory
    #[arg(long, env = "CUTOUT_CACHE_DIR")]
    pub cache_dir: Option<String>,

    #[command(flatten)]
    pub logging: LoggingOptions,
}

impl CutoutCliOptions {
    /// Run one background-removal job with the configured options
    pub async fn run(self) -> CutoutResult<()> {
        let config = self.to_config()?;
        let orchestrator = Orchestrator::with_sidecar(config);

        let bytes = tokio::fs::read(&self.input).await.map_err(|e| {
            CutoutConfigError::FileRead(format!(
                "Failed to read {}: {e}",
                self.input.display()
            ))
        })?;

        let name = self
            .input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "input".to_string());
        let input = ImageArtifact::new(name, mime_type_for(&self.input), bytes);

        let result = orchestrator
            .run_with_progress(
                input,
                Arc::new(|percent| info!("processing: {percent:.0}%")),
            )
            .await?;

        let output_path = match &self.output {
            Some(path) => path.clone(),
            None => self.input.with_file_name(&result.name),
        };
        let size_bytes = result.size_bytes();
        tokio::fs::write(&output_path, result.into_bytes())
            .await
            .map_err(|e| {
                CutoutConfigError::FileRead(format!(
                    "Failed to write {}: {e}",
                    output_path.display()
                ))
            })?;

        info!(
            output = %output_path.display(),
            size_bytes,
            "background removed"
        );
        Ok(())
    }

    /// Convert CLI options to an orchestrator configuration
    fn to_config(&self) -> CutoutResult<OrchestratorConfig> {
        let mut config = OrchestratorConfig::from_env()?;

        if let Some(binary) = &self.engine_binary {
            config.engine.engine_binary = binary.clone();
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.engine.cache_dir = Some(cache_dir.clone());
        }
        if let Some(variant) = &self.model_variant {
            config.transform.model_variant = match variant.to_lowercase().as_str() {
                "small" => ModelVariant::Small,
                "medium" => ModelVariant::Medium,
                _ => {
                    return Err(CutoutConfigError::InvalidValue {
                        field: "model_variant".to_string(),
                        value: variant.clone(),
                        reason: "must be one of: small, medium".to_string(),
                    }
                    .into())
                }
            };
        }
        if let Some(deadline_ms) = self.deadline_ms {
            config.deadline_ms = deadline_ms;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Best-effort MIME type from a file extension
///
/// The core performs no format validation; this only labels the inbound
/// artifact the way a browser upload would.
fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("gif") => "image/gif",
        Some("tif" | "tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_for_common_extensions() {
        assert_eq!(mime_type_for(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("a.JPEG")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("a.png")), "image/png");
        assert_eq!(mime_type_for(Path::new("a")), "application/octet-stream");
    }

    #[test]
    fn test_cli_overrides_reach_config() {
        let options = CutoutCliOptions::parse_from([
            "cutout",
            "photo.jpg",
            "--engine-binary",
            "/opt/cutout/engine",
            "--model-variant",
            "medium",
            "--deadline-ms",
            "30000",
        ]);

        let config = options.to_config().unwrap();
        assert_eq!(config.engine.engine_binary, "/opt/cutout/engine");
        assert_eq!(config.transform.model_variant, ModelVariant::Medium);
        assert_eq!(config.deadline_ms, 30_000);
    }

    #[test]
    fn test_unknown_model_variant_rejected() {
        let options = CutoutCliOptions::parse_from([
            "cutout",
            "photo.jpg",
            "--model-variant",
            "enormous",
        ]);

        assert!(options.to_config().is_err());
    }
}
