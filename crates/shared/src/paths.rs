//! Path utilities for consistent file and directory management
//!
//! This module provides standardized paths for the engine's model-download
//! cache and related directories used throughout the Cutout stack.

use std::env;
use std::path::{Path, PathBuf};

/// Default cache directory name relative to user home
const CACHE_DIR_NAME: &str = ".cache/cutout";

/// Get the default cache directory path
///
/// Returns `$HOME/.cache/cutout` on Unix systems, or equivalent on other
/// platforms. This is where the inference engine caches downloaded model
/// weights when the fetch policy prefers cached copies.
pub fn default_cache_dir() -> PathBuf {
    get_home_dir().join(CACHE_DIR_NAME)
}

/// Get the user's home directory
///
/// Falls back to current directory if HOME cannot be determined.
fn get_home_dir() -> PathBuf {
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home)
    } else if let Some(home_dir) = dirs::home_dir() {
        home_dir
    } else {
        // Fallback to current directory if we can't determine home
        PathBuf::from(".")
    }
}

/// Expand a path that starts with `~` to use the user's home directory
pub fn expand_home_dir<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            let home = get_home_dir();
            return home.join(stripped);
        } else if path_str == "~" {
            return get_home_dir();
        }
    }
    path.to_path_buf()
}

/// Resolve a cache directory path, expanding ~ if needed
///
/// This is the canonical way to resolve cache paths throughout Cutout.
/// Relative and absolute paths are returned as-is; paths starting with `~`
/// are expanded against the user's home directory.
pub fn resolve_cache_path<P: AsRef<Path>>(path: P) -> PathBuf {
    expand_home_dir(path)
}
