//! # Cutout CLI
//!
//! Command-line driver for Cutout background removal. Reads a portrait
//! photo from disk, runs one inference job through the orchestration
//! layer, and writes the resulting PNG next to the input. This binary
//! stands in for the portal's upload handler at the same contract
//! boundary: an image artifact in, a PNG artifact or typed failure out.

pub mod cli_options;

pub use cli_options::CutoutCliOptions;
