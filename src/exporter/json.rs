// file: src/exporter/json.rs
// description: writes recovered outdated reports and the run manifest as json

use crate::config::OutputMode;
use crate::error::{AuditError, Result};
use crate::models::{Abort, AuditResult, Payload, Stage, StageFailure};
use crate::pipeline::RunSummary;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const SUMMARY_FILE: &str = "summary.json";
/// Reports live one level below the manifest, so no repository name can collide with it.
pub const REPORTS_DIR: &str = "outdated";

#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
    mode: OutputMode,
    pretty: bool,
}

#[derive(Debug, Serialize)]
pub struct ManifestEntry {
    pub name: String,
    pub stage: Stage,
    pub synced: bool,
    pub install_succeeded: bool,
    pub audit_succeeded: bool,
    pub recovery_applied: bool,
    pub outdated_packages: Option<usize>,
    pub report_file: Option<PathBuf>,
    pub duration_ms: Option<u64>,
    pub failures: Vec<StageFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

impl From<&AuditResult> for ManifestEntry {
    fn from(result: &AuditResult) -> Self {
        let raw_output = match &result.payload {
            Some(Payload::Raw(raw)) => Some(raw.clone()),
            _ => None,
        };

        Self {
            name: result.repository.name.clone(),
            stage: result.stage,
            synced: result.synced,
            install_succeeded: result.install_succeeded,
            audit_succeeded: result.audit_succeeded,
            recovery_applied: result.recovery_applied,
            outdated_packages: result.outdated_packages(),
            report_file: result.report_path.clone(),
            duration_ms: result.duration_ms,
            failures: result.failures.clone(),
            raw_output,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExportManifest {
    pub generated_at: String,
    pub selected: usize,
    pub audited: usize,
    pub failed: usize,
    pub aborted: Option<Abort>,
    pub repositories: Vec<ManifestEntry>,
}

impl ExportManifest {
    pub fn from_summary(summary: &RunSummary) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            selected: summary.selected.len(),
            audited: summary.results.len(),
            failed: summary.results.iter().filter(|r| r.is_failed()).count(),
            aborted: summary.aborted.clone(),
            repositories: summary.results.iter().map(ManifestEntry::from).collect(),
        }
    }
}

impl JsonExporter {
    /// `output_dir` (and its parents) is created by the first write.
    pub fn new(output_dir: impl Into<PathBuf>, mode: OutputMode, pretty: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            mode,
            pretty,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn report_path(&self, repository: &str) -> PathBuf {
        self.output_dir
            .join(REPORTS_DIR)
            .join(format!("{}.json", repository))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(SUMMARY_FILE)
    }

    /// Writes `<output_dir>/outdated/<repository>.json`, or one json line on stdout.
    /// Returns the file written, if any.
    pub fn write_report(&self, repository: &str, report: &Value) -> Result<Option<PathBuf>> {
        match self.mode {
            OutputMode::Files => {
                let path = self.report_path(repository);
                self.write_json(&path, report)?;
                info!("Report for {} written to {}", repository, path.display());
                Ok(Some(path))
            }
            OutputMode::Stdout => {
                let line = report_line(repository, report)?;
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", line)?;
                Ok(None)
            }
        }
    }

    pub fn write_manifest(&self, summary: &RunSummary) -> Result<Option<PathBuf>> {
        if self.mode == OutputMode::Stdout {
            return Ok(None);
        }

        let manifest = ExportManifest::from_summary(summary);
        let path = self.manifest_path();
        self.write_json(&path, &manifest)?;
        info!(
            "Summary of {} repositories written to {}",
            manifest.repositories.len(),
            path.display()
        );
        Ok(Some(path))
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let body = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        let parent = path.parent().unwrap_or(self.output_dir.as_path());
        fs::create_dir_all(parent).map_err(|e| AuditError::FileOperation {
            path: parent.to_path_buf(),
            source: e,
        })?;

        fs::write(path, body).map_err(|e| AuditError::FileOperation {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

pub fn report_line(repository: &str, report: &Value) -> Result<String> {
    Ok(serde_json::to_string(&json!({
        "repository": repository,
        "report": report,
    }))?)
}
