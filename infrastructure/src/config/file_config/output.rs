//! Results and target configuration (`[recorder]`, `[aut]` and `[validation]`)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where per-session JSONL records are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRecorderConfig {
    pub enabled: bool,
    pub results_dir: PathBuf,
}

impl Default for FileRecorderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            results_dir: PathBuf::from("results"),
        }
    }
}

/// The application under test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAutConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for FileAutConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileValidationConfig {
    /// Block injection and tampering payloads outside security scenarios
    pub safety_checks: bool,
}

impl Default for FileValidationConfig {
    fn default() -> Self {
        Self { safety_checks: true }
    }
}
