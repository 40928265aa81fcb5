// file: src/models/audit.rs
// description: per-repository audit outcome and the stages it moves through
// reference: internal data structures

use crate::models::RepositoryDescriptor;
use crate::parser::outdated_packages;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Selected,
    Synced,
    Installed,
    Audited,
    Parsed,
    Reported,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Selected => "selected",
            Stage::Synced => "synced",
            Stage::Installed => "installed",
            Stage::Audited => "audited",
            Stage::Parsed => "parsed",
            Stage::Reported => "reported",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,
}

/// Outdated report: the recovered JSON, or the raw text when it could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Json(Value),
    Raw(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditResult {
    pub repository: RepositoryDescriptor,
    pub stage: Stage,
    pub synced: bool,
    pub install_succeeded: bool,
    pub audit_succeeded: bool,
    pub payload: Option<Payload>,
    pub recovery_applied: bool,
    pub failures: Vec<StageFailure>,
    pub report_path: Option<PathBuf>,
    /// Wall time spent on this repository, set once its audit ends.
    pub duration_ms: Option<u64>,
}

impl AuditResult {
    pub fn new(repository: RepositoryDescriptor) -> Self {
        Self {
            repository,
            stage: Stage::Selected,
            synced: false,
            install_succeeded: false,
            audit_succeeded: false,
            payload: None,
            recovery_applied: false,
            failures: Vec::new(),
            report_path: None,
            duration_ms: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.repository.name
    }

    pub fn advance(&mut self, stage: Stage) {
        if stage > self.stage {
            self.stage = stage;
        }
    }

    pub fn record_failure(&mut self, stage: Stage, message: impl Into<String>) {
        self.failures.push(StageFailure {
            stage,
            message: message.into(),
        });
    }

    pub fn is_failed(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn first_failure(&self) -> Option<&StageFailure> {
        self.failures.first()
    }

    pub fn report(&self) -> Option<&Value> {
        match &self.payload {
            Some(Payload::Json(value)) => Some(value),
            _ => None,
        }
    }

    pub fn outdated_packages(&self) -> Option<usize> {
        self.report().and_then(outdated_packages)
    }
}

/// Why a fail-fast run stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Abort {
    pub repository: String,
    pub stage: Stage,
    pub message: String,
}

impl fmt::Display for Abort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "aborted at {} stage of {}: {}",
            self.stage, self.repository, self.message
        )
    }
}
