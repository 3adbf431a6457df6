//! Image artifacts crossing the orchestration boundary
//!
//! An [`ImageArtifact`] is immutable once created: the orchestrator never
//! mutates an input, it only produces a new artifact for a successful
//! result. Nothing is retained by the core after a job returns.

use crate::error::{CutoutError, CutoutResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MIME type of every result artifact, regardless of input type
pub const RESULT_MIME_TYPE: &str = "image/png";

/// Leading bytes of a well-formed PNG stream
const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// A binary image plus metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageArtifact {
    /// Logical file name
    pub name: String,
    /// MIME type as reported by the producer
    pub mime_type: String,
    /// Raw image bytes
    pub bytes: Vec<u8>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ImageArtifact {
    /// Create an artifact with a fresh creation timestamp
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
            created_at: Utc::now(),
        }
    }

    /// Byte size of the image payload
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Consume the artifact, returning the raw bytes
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Derive a result artifact name from an input name
///
/// A trailing extension (a final `.` followed by ASCII alphanumerics or
/// underscores) is replaced with `.png`; names without a recognizable
/// extension get `.png` appended.
#[must_use]
pub fn derive_output_name(input_name: &str) -> String {
    if let Some(idx) = input_name.rfind('.') {
        let ext = &input_name[idx + 1..];
        if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return format!("{}.png", &input_name[..idx]);
        }
    }
    format!("{input_name}.png")
}

/// Package raw engine output into a result artifact
///
/// The engine contract fixes output to PNG; an empty buffer or a payload
/// without the PNG signature is a packaging failure, reported distinctly
/// from inference failures.
pub fn package_result(input_name: &str, bytes: Vec<u8>) -> CutoutResult<ImageArtifact> {
    if bytes.is_empty() {
        return Err(CutoutError::result_packaging(
            "engine returned an empty payload",
        ));
    }
    if !bytes.starts_with(&PNG_SIGNATURE) {
        return Err(CutoutError::result_packaging(
            "payload missing PNG signature",
        ));
    }

    Ok(ImageArtifact::new(
        derive_output_name(input_name),
        RESULT_MIME_TYPE,
        bytes,
    ))
}
