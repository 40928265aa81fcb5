// file: src/auditor/composer.rs
// description: composer install and outdated report invocations
// reference: https://getcomposer.org/doc/03-cli.md#outdated

use crate::error::Result;
use crate::process::{ProcessOutput, ProcessRunner};
use std::path::Path;
use tracing::{debug, info};

pub const MANIFEST_FILE: &str = "composer.json";

pub struct ComposerAuditor<R> {
    runner: R,
    composer: String,
}

impl<R: ProcessRunner> ComposerAuditor<R> {
    pub fn new(runner: R, composer: impl Into<String>) -> Self {
        Self {
            runner,
            composer: composer.into(),
        }
    }

    pub fn has_manifest(manifest_dir: &Path) -> bool {
        manifest_dir.join(MANIFEST_FILE).is_file()
    }

    /// `composer -q install`. Without a manifest nothing is spawned and a failed
    /// output is returned instead.
    pub fn install(&self, manifest_dir: &Path) -> Result<ProcessOutput> {
        if !Self::has_manifest(manifest_dir) {
            debug!("No {} in {}", MANIFEST_FILE, manifest_dir.display());
            return Ok(ProcessOutput::failure(
                1,
                format!("{} not found", MANIFEST_FILE),
            ));
        }

        info!("Installing dependencies in {}", manifest_dir.display());
        self.composer(&["-q", "install"], manifest_dir)
    }

    /// `composer outdated -f json --direct`, plus `-m` to restrict to minor updates.
    pub fn outdated(&self, manifest_dir: &Path, minor_only: bool) -> Result<ProcessOutput> {
        let mut args = vec!["outdated", "-f", "json", "--direct"];
        if minor_only {
            args.push("-m");
        }

        info!("Checking outdated dependencies in {}", manifest_dir.display());
        self.composer(&args, manifest_dir)
    }

    pub fn version(&self, cwd: &Path) -> Result<ProcessOutput> {
        self.composer(&["--version"], cwd)
    }

    fn composer(&self, args: &[&str], cwd: &Path) -> Result<ProcessOutput> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.runner.run(&self.composer, &args, cwd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuditError;
    use crate::process::testing::FakeRunner;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), "{}").unwrap();
        dir
    }

    #[test]
    fn test_install_arguments() {
        let dir = project();
        let runner = FakeRunner::new();
        let auditor = ComposerAuditor::new(&runner, "/opt/composer.phar");

        let output = auditor.install(dir.path()).unwrap();

        assert!(output.is_success());
        let calls = runner.calls();
        assert_eq!(calls[0].program, "/opt/composer.phar");
        assert_eq!(calls[0].args, vec!["-q", "install"]);
        assert_eq!(calls[0].cwd, dir.path());
    }

    #[test]
    fn test_install_without_manifest_spawns_nothing() {
        let dir = TempDir::new().unwrap();
        let runner = FakeRunner::new();
        let auditor = ComposerAuditor::new(&runner, "composer");

        let output = auditor.install(dir.path()).unwrap();

        assert!(!output.is_success());
        assert!(output.failure_message().contains("composer.json not found"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_outdated_arguments() {
        let dir = project();
        let runner = FakeRunner::new();
        let auditor = ComposerAuditor::new(&runner, "composer");

        auditor.outdated(dir.path(), false).unwrap();
        auditor.outdated(dir.path(), true).unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].args, vec!["outdated", "-f", "json", "--direct"]);
        assert_eq!(
            calls[1].args,
            vec!["outdated", "-f", "json", "--direct", "-m"]
        );
    }

    #[test]
    fn test_non_zero_exit_is_not_an_error() {
        let dir = project();
        let runner = FakeRunner::new().respond(
            |c| c.is("composer", "outdated"),
            ProcessOutput {
                exit_code: Some(1),
                stdout: "{\"installed\":[]}".to_string(),
                stderr: String::new(),
            },
        );
        let auditor = ComposerAuditor::new(&runner, "composer");

        let output = auditor.outdated(dir.path(), false).unwrap();
        assert!(!output.is_success());
        assert_eq!(output.stdout, "{\"installed\":[]}");
    }

    #[test]
    fn test_spawn_failure_propagates() {
        let dir = project();
        let runner = FakeRunner::new().fail_to_spawn(|_| true, "No such file or directory");
        let auditor = ComposerAuditor::new(&runner, "composer");

        let err = auditor.install(dir.path()).unwrap_err();
        assert!(matches!(err, AuditError::Subprocess { .. }));
    }
}
