//! Logging configuration (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL transcript of exchange outcomes. Disabled when unset.
    pub conversation_log: Option<PathBuf>,
    /// Directory for the daily-rotated diagnostic log. Stderr only when unset.
    pub log_dir: Option<PathBuf>,
}
