//! Command handler modules for sds-cli.
//!
//! Shared helpers live here; the batch itself lives in `sync`.

pub mod sync;

use std::path::PathBuf;

use anyhow::Result;
use sds_config::LoadedConfig;
use serde_json::Value;

/// Used when neither `--log-file` nor `logging.file` is available.
pub const DEFAULT_LOG_FILE: &str = "student_ad_update.log";

/// Built-in defaults with `paths` merged on top, in order.
pub fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    sds_config::load_layered_yaml(&path_refs)
}

pub fn configured_log_file(config_json: &Value) -> Option<PathBuf> {
    config_json
        .pointer("/logging/file")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}
