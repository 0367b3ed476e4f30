//! Configuration paths
//!
//! Utilities for resolving configuration file paths.

use std::path::PathBuf;

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    // Check for explicit override
    if let Ok(dir) = std::env::var("MEMORY_ASSISTANT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    // Use XDG config directory or fallback
    dirs::config_dir()
        .map(|d| d.join("memory-assistant"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join("memory-assistant"))
                .unwrap_or_else(|| PathBuf::from(".memory-assistant"))
        })
}

/// Get the main configuration file path
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("MEMORY_ASSISTANT_CONFIG") {
        return PathBuf::from(path);
    }

    config_dir().join("config.json")
}
