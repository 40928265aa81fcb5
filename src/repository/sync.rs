// file: src/repository/sync.rs
// description: Working copy synchronization by shelling out to git
// reference: https://git-scm.com/docs/git-clone, https://git-scm.com/docs/git-pull

use crate::error::{AuditError, Result};
use crate::models::RepositoryDescriptor;
use crate::process::{ProcessOutput, ProcessRunner};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct WorkingCopySync<R> {
    runner: R,
    git: String,
}

impl<R: ProcessRunner> WorkingCopySync<R> {
    pub fn new(runner: R, git: impl Into<String>) -> Self {
        Self {
            runner,
            git: git.into(),
        }
    }

    pub fn working_copy(repository: &RepositoryDescriptor, base_dir: &Path) -> PathBuf {
        base_dir.join(&repository.name)
    }

    /// Whether `path` holds its own `.git`. Without one, git would resolve to
    /// whatever repository encloses `path`.
    pub fn is_working_copy(path: &Path) -> bool {
        path.join(".git").exists()
    }

    /// Clones into `base_dir/<name>` when absent, otherwise checks out the default
    /// branch and fast-forwards it. Returns the working copy path.
    ///
    /// An existing directory that is not the top level of its own git repository is
    /// rejected before any git command could touch an enclosing repository.
    pub fn sync(&self, repository: &RepositoryDescriptor, base_dir: &Path) -> Result<PathBuf> {
        let path = Self::working_copy(repository, base_dir);

        if path.exists() {
            self.verify_working_copy(repository, &path)?;
            info!("Updating repository {}", repository.name);
            self.pull(repository, &path)?;
        } else {
            info!("Cloning repository {}", repository.name);
            self.clone_fresh(repository, base_dir)?;
        }

        Ok(path)
    }

    fn clone_fresh(&self, repository: &RepositoryDescriptor, base_dir: &Path) -> Result<()> {
        fs::create_dir_all(base_dir).map_err(|e| AuditError::FileOperation {
            path: base_dir.to_path_buf(),
            source: e,
        })?;

        self.git(
            repository,
            base_dir,
            &["clone", &repository.clone_url, &repository.name],
        )?;

        let path = Self::working_copy(repository, base_dir);
        self.git(repository, &path, &["checkout", &repository.default_branch])?;

        info!("Repository {} cloned", repository.name);
        Ok(())
    }

    fn pull(&self, repository: &RepositoryDescriptor, path: &Path) -> Result<()> {
        self.git(repository, path, &["checkout", &repository.default_branch])?;
        self.git(repository, path, &["pull", "--ff-only"])?;

        info!("Repository {} is up to date", repository.name);
        Ok(())
    }

    fn verify_working_copy(&self, repository: &RepositoryDescriptor, path: &Path) -> Result<()> {
        if !Self::is_working_copy(path) {
            return Err(AuditError::VersionControl {
                repository: repository.name.clone(),
                message: format!(
                    "{} exists but is not a git working copy, remove it to clone again",
                    path.display()
                ),
            });
        }

        let output = self.git(repository, path, &["rev-parse", "--show-toplevel"])?;
        let toplevel = PathBuf::from(output.stdout.trim());
        if !same_directory(&toplevel, path) {
            return Err(AuditError::VersionControl {
                repository: repository.name.clone(),
                message: format!(
                    "{} resolves to the repository at {}, refusing to update it",
                    path.display(),
                    toplevel.display()
                ),
            });
        }

        Ok(())
    }

    fn git(
        &self,
        repository: &RepositoryDescriptor,
        cwd: &Path,
        args: &[&str],
    ) -> Result<ProcessOutput> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        debug!("git {} ({})", args.join(" "), repository.name);

        let output = self
            .runner
            .run(&self.git, &args, cwd)
            .map_err(|e| AuditError::VersionControl {
                repository: repository.name.clone(),
                message: e.to_string(),
            })?;

        if output.is_success() {
            return Ok(output);
        }

        let mut message = format!("git {} failed with {}", args[0], output.failure_message());
        if looks_like_auth_failure(&output.stderr) {
            message.push_str(
                "\n  hint: check that your SSH key or token grants access to this repository",
            );
        }

        Err(AuditError::VersionControl {
            repository: repository.name.clone(),
            message,
        })
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn looks_like_auth_failure(stderr: &str) -> bool {
    stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
}
