// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod auditor;
pub mod config;
pub mod error;
pub mod exporter;
pub mod github;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod process;
pub mod repository;
pub mod utils;

pub use auditor::ComposerAuditor;
pub use config::{Config, OutputMode, RunConfiguration, RunOverrides};
pub use error::{AuditError, Result};
pub use exporter::{ExportManifest, JsonExporter};
pub use github::{GitHubClient, RepositoryCatalog, RepositorySource, SelectionRules, discover_token};
pub use models::{AuditResult, RepositoryDescriptor, Stage};
pub use parser::{Recovery, recover};
pub use pipeline::{AuditStats, PipelineDriver, ProgressTracker, RunSummary};
pub use process::{ProcessOutput, ProcessRunner, SystemProcessRunner};
pub use repository::WorkingCopySync;
pub use utils::{HealthCheck, HealthReport, HealthStatus, OperationTimer, Validator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _rules = SelectionRules::default();
        let _overrides = RunOverrides::default();
        assert!(matches!(recover("{}"), Recovery::Parsed { repaired: false, .. }));
    }
}
