// ABOUTME: Append-only JSON-lines audit log of state transitions.
// ABOUTME: Written by the orchestrator after each transition; read back by `status`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::machine::HistoryEntry;
use super::state::DeploymentState;

/// One line of the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub deployment: String,
    pub state: DeploymentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Hostname of the machine that drove the deployment.
    pub host: String,
}

/// Appends transition records to a file.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
    host: String,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            host: gethostname::gethostname().to_string_lossy().into_owned(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, deployment: &str, entry: &HistoryEntry) -> io::Result<()> {
        let record = AuditRecord {
            timestamp: entry.at,
            deployment: deployment.to_string(),
            state: entry.state,
            context: entry.context.clone(),
            host: self.host.clone(),
        };
        let line = serde_json::to_string(&record).map_err(io::Error::other)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }

    /// Read every well-formed record, skipping lines that fail to parse.
    pub fn read(path: &Path) -> io::Result<Vec<AuditRecord>> {
        let content = fs::read_to_string(path)?;
        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed audit record");
                    None
                }
            })
            .collect())
    }
}
