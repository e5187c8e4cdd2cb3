use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::WorkspaceResult;
use super::atomic::write_json_atomic;
use super::ids::new_run_id;

pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const MANIFEST_FILE: &str = "run_manifest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Running,
    Ok,
    Error,
}

/// Machine-readable record of one CLI invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub command: String,
    pub status: RunStatus,
    pub cli_version: String,
    pub config_path: PathBuf,
    pub created_at: String,
    pub finished_at: Option<String>,
    pub input: Option<PathBuf>,
    pub rows: Option<usize>,
    pub outputs: Vec<PathBuf>,
    pub validation_issues: Vec<String>,
    pub error: Option<String>,
}

impl RunManifest {
    pub fn start(command: &str, config_path: &Path) -> Self {
        Self {
            run_id: new_run_id(),
            command: command.to_string(),
            status: RunStatus::Running,
            cli_version: CLI_VERSION.to_string(),
            config_path: config_path.to_path_buf(),
            created_at: Utc::now().to_rfc3339(),
            finished_at: None,
            input: None,
            rows: None,
            outputs: Vec::new(),
            validation_issues: Vec::new(),
            error: None,
        }
    }

    pub fn record_output(&mut self, path: &Path) {
        self.outputs.push(path.to_path_buf());
    }

    /// Close the record as `Ok`, or `Error` with the failure message.
    pub fn finish(&mut self, error: Option<String>) {
        self.status = if error.is_some() {
            RunStatus::Error
        } else {
            RunStatus::Ok
        };
        self.error = error;
        self.finished_at = Some(Utc::now().to_rfc3339());
    }

    /// Write the manifest as `run_manifest.json` under `dir`.
    pub fn write(&self, dir: &Path) -> WorkspaceResult<PathBuf> {
        let path = dir.join(MANIFEST_FILE);
        write_json_atomic(&path, self)?;
        Ok(path)
    }
}
