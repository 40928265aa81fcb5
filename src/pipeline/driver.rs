// file: src/pipeline/driver.rs
// description: runs sync, install, outdated report and output repair for each selected repository
// reference: sequential audit workflow

use crate::auditor::ComposerAuditor;
use crate::config::RunConfiguration;
use crate::error::Result;
use crate::exporter::JsonExporter;
use crate::models::{Abort, AuditResult, Payload, RepositoryDescriptor, Stage};
use crate::parser::{Recovery, recover};
use crate::pipeline::progress::{AuditStats, ProgressTracker};
use crate::process::ProcessRunner;
use crate::repository::WorkingCopySync;
use crate::utils::{OperationTimer, Validator};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

const SLOW_REPOSITORY: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub selected: Vec<RepositoryDescriptor>,
    pub results: Vec<AuditResult>,
    pub aborted: Option<Abort>,
    pub dry_run: bool,
    pub stats: AuditStats,
}

impl RunSummary {
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    pub fn failed(&self) -> impl Iterator<Item = &AuditResult> {
        self.results.iter().filter(|r| r.is_failed())
    }
}

pub struct PipelineDriver<R> {
    config: RunConfiguration,
    checkout_dir: PathBuf,
    runner: R,
    exporter: JsonExporter,
    show_progress: bool,
    colored_progress: bool,
}

impl<R: ProcessRunner> PipelineDriver<R> {
    pub fn new(config: RunConfiguration, runner: R, exporter: JsonExporter) -> Result<Self> {
        let checkout_dir = std::path::absolute(&config.checkout_dir)?;

        Ok(Self {
            config,
            checkout_dir,
            runner,
            exporter,
            show_progress: false,
            colored_progress: true,
        })
    }

    pub fn with_progress(mut self, visible: bool, colored: bool) -> Self {
        self.show_progress = visible;
        self.colored_progress = colored;
        self
    }

    pub fn exporter(&self) -> &JsonExporter {
        &self.exporter
    }

    /// One pass over `repositories`, in the given order. Per-repository failures are
    /// recorded in the results; with fail-fast the first one ends the run.
    pub fn run(&self, repositories: &[RepositoryDescriptor]) -> RunSummary {
        let mut summary = RunSummary {
            selected: repositories.to_vec(),
            dry_run: self.config.dry_run,
            ..RunSummary::default()
        };

        if self.config.dry_run {
            for repository in repositories {
                info!(
                    "[dry run] would audit {} ({}, branch {})",
                    repository.name, repository.clone_url, repository.default_branch
                );
            }
            summary.stats.repositories_selected = repositories.len();
            return summary;
        }

        let timer = OperationTimer::new("audit run");
        let progress = ProgressTracker::with_color(
            repositories.len(),
            self.show_progress,
            self.colored_progress,
        );
        let sync = WorkingCopySync::new(&self.runner, self.config.git_path.as_str());
        let auditor = ComposerAuditor::new(&self.runner, self.config.composer_path.as_str());

        for repository in repositories {
            progress.start_repository(&repository.name);

            let result = self.audit_repository(repository, &sync, &auditor, &progress);
            progress.record(&result);

            let abort = if self.config.fail_fast {
                result.first_failure().map(|failure| Abort {
                    repository: repository.name.clone(),
                    stage: failure.stage,
                    message: failure.message.clone(),
                })
            } else {
                None
            };

            summary.results.push(result);

            if let Some(abort) = abort {
                warn!("Fail-fast: {}", abort);
                summary.aborted = Some(abort);
                break;
            }
        }

        progress.finish();
        summary.stats = progress.get_stats();
        timer.finish();
        summary
    }

    fn audit_repository<S: ProcessRunner, A: ProcessRunner>(
        &self,
        repository: &RepositoryDescriptor,
        sync: &WorkingCopySync<S>,
        auditor: &ComposerAuditor<A>,
        progress: &ProgressTracker,
    ) -> AuditResult {
        let timer = OperationTimer::new(&format!("audit of {}", repository.name));
        let mut result = AuditResult::new(repository.clone());

        self.run_stages(&mut result, sync, auditor, progress);

        timer.warn_if_slow(SLOW_REPOSITORY);
        result.duration_ms = Some(timer.finish().as_millis() as u64);
        result
    }

    /// Moves `result` through the stages; returning early leaves it at the last stage reached.
    fn run_stages<S: ProcessRunner, A: ProcessRunner>(
        &self,
        result: &mut AuditResult,
        sync: &WorkingCopySync<S>,
        auditor: &ComposerAuditor<A>,
        progress: &ProgressTracker,
    ) {
        let repository = result.repository.clone();

        progress.set_stage(&repository.name, Stage::Synced);
        match sync.sync(&repository, &self.checkout_dir) {
            Ok(_) => {
                result.synced = true;
                result.advance(Stage::Synced);
            }
            Err(e) => {
                warn!("{}", e);
                result.record_failure(Stage::Synced, e.to_string());
            }
        }

        let working_copy = WorkingCopySync::<S>::working_copy(&repository, &self.checkout_dir);
        if self.should_stop(result) || !WorkingCopySync::<S>::is_working_copy(&working_copy) {
            return;
        }

        progress.set_stage(&repository.name, Stage::Installed);
        match auditor.install(&working_copy) {
            Ok(output) if output.is_success() => {
                result.install_succeeded = true;
                result.advance(Stage::Installed);
            }
            Ok(output) => {
                let message = format!("composer install failed with {}", output.failure_message());
                warn!("{}: {}", repository.name, message);
                result.record_failure(Stage::Installed, message);
            }
            Err(e) => {
                warn!("{}: {}", repository.name, e);
                result.record_failure(Stage::Installed, e.to_string());
            }
        }

        if self.should_stop(result) {
            return;
        }

        progress.set_stage(&repository.name, Stage::Audited);
        let output = match auditor.outdated(&working_copy, self.config.minor_only) {
            Ok(output) => output,
            Err(e) => {
                warn!("{}: {}", repository.name, e);
                result.record_failure(Stage::Audited, e.to_string());
                return;
            }
        };

        if output.is_success() {
            result.audit_succeeded = true;
            result.advance(Stage::Audited);
        } else {
            let message = format!("composer outdated failed with {}", output.failure_message());
            warn!("{}: {}", repository.name, message);
            result.record_failure(Stage::Audited, message);

            if self.should_stop(result) || output.stdout.trim().is_empty() {
                return;
            }
        }

        progress.set_stage(&repository.name, Stage::Parsed);
        self.parse_and_report(result, &output.stdout);
    }

    fn parse_and_report(&self, result: &mut AuditResult, stdout: &str) {
        match recover(stdout) {
            Recovery::Parsed { value, repaired } => {
                if repaired {
                    info!("Stripped leading output before the report of {}", result.name());
                }
                result.recovery_applied = repaired;
                result.advance(Stage::Parsed);

                match self.exporter.write_report(result.name(), &value) {
                    Ok(path) => {
                        result.report_path = path;
                        result.advance(Stage::Reported);
                    }
                    Err(e) => {
                        warn!("{}: {}", result.name(), e);
                        result.record_failure(Stage::Reported, e.to_string());
                    }
                }

                result.payload = Some(Payload::Json(value));
            }
            Recovery::Unrecoverable(raw) => {
                warn!(
                    "{}: composer output is not valid JSON: {}",
                    result.name(),
                    Validator::truncate_text(raw.trim(), 200)
                );
                result.recovery_applied = true;
                result.record_failure(Stage::Parsed, "composer output is not valid JSON");
                result.payload = Some(Payload::Raw(raw));
            }
        }
    }

    fn should_stop(&self, result: &AuditResult) -> bool {
        self.config.fail_fast && result.is_failed()
    }

    pub fn checkout_dir(&self) -> &Path {
        &self.checkout_dir
    }
}
