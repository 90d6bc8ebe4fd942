//! Report export — pretty JSON under the results directory, written atomically.

use crate::jobs::OptimizationReport;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export I/O error: {0}")]
    Io(String),

    #[error("report serialization failed: {0}")]
    Serialization(String),
}

/// Write an optimization report to `{results_dir}/optimize-{symbol}-{id12}.json`.
///
/// The file name is content-addressed by config id, so re-running the same
/// job overwrites its own report rather than piling up copies.
pub fn save_report(report: &OptimizationReport, results_dir: &Path) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(results_dir)
        .map_err(|e| ExportError::Io(format!("create {}: {e}", results_dir.display())))?;

    let short_id: String = report.config_id.chars().take(12).collect();
    let path = results_dir.join(format!("optimize-{}-{short_id}.json", report.symbol));
    let tmp_path = path.with_extension("json.tmp");

    let json = serde_json::to_string_pretty(report)
        .map_err(|e| ExportError::Serialization(e.to_string()))?;
    fs::write(&tmp_path, json)
        .map_err(|e| ExportError::Io(format!("write {}: {e}", tmp_path.display())))?;
    fs::rename(&tmp_path, &path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        ExportError::Io(format!("atomic rename failed: {e}"))
    })?;

    Ok(path)
}
