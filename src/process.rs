// file: src/process.rs
// description: child process execution behind a substitutable runner
// reference: https://doc.rust-lang.org/std/process/struct.Command.html

use crate::error::{AuditError, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Captured result of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Short human-readable reason for a failed invocation.
    pub fn failure_message(&self) -> String {
        let status = match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };

        let detail = self.stderr.trim();
        if detail.is_empty() {
            status
        } else {
            format!("{}: {}", status, detail)
        }
    }
}

/// Runs a program to completion with `cwd` as its working directory.
///
/// Implementations must not touch the working directory of the current process.
/// A non-zero exit is reported through [`ProcessOutput`], not as an error.
pub trait ProcessRunner {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<ProcessOutput>;
}

impl<T: ProcessRunner + ?Sized> ProcessRunner for &T {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<ProcessOutput> {
        (**self).run(program, args, cwd)
    }
}

/// Blocking runner backed by `std::process::Command`. No timeout is applied.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<ProcessOutput> {
        debug!("Running {} {} in {}", program, args.join(" "), cwd.display());

        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| AuditError::Subprocess {
                program: program.to_string(),
                message: e.to_string(),
            })?;

        let result = ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !result.is_success() {
            debug!("{} failed: {}", program, result.failure_message());
        }

        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Invocation {
        pub program: String,
        pub args: Vec<String>,
        pub cwd: PathBuf,
    }

    impl Invocation {
        /// First argument that is not a flag, e.g. `install` for `composer -q install`.
        pub fn subcommand(&self) -> Option<&str> {
            self.args
                .iter()
                .map(String::as_str)
                .find(|arg| !arg.starts_with('-'))
        }

        pub fn is(&self, program: &str, subcommand: &str) -> bool {
            self.program == program && self.subcommand() == Some(subcommand)
        }

        /// Whether the call concerns repository `name`: run inside its working copy,
        /// or naming it as an argument (the clone target).
        pub fn targets(&self, name: &str) -> bool {
            self.cwd.file_name().is_some_and(|dir| dir == name)
                || self.args.iter().any(|arg| arg == name)
        }
    }

    enum Reply {
        Output(ProcessOutput),
        SpawnError(String),
    }

    type Matcher = Box<dyn Fn(&Invocation) -> bool + Send + Sync>;

    /// Records every invocation and answers from canned replies; unmatched calls succeed
    /// with empty output, except `git rev-parse --show-toplevel` which answers with its cwd.
    /// A successful `git clone` creates the target directory with `.git` and a
    /// `composer.json`, the way a real clone of a PHP project would.
    #[derive(Default)]
    pub struct FakeRunner {
        rules: Vec<(Matcher, Reply)>,
        calls: Mutex<Vec<Invocation>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(
            mut self,
            matcher: impl Fn(&Invocation) -> bool + Send + Sync + 'static,
            output: ProcessOutput,
        ) -> Self {
            self.rules.push((Box::new(matcher), Reply::Output(output)));
            self
        }

        pub fn fail_to_spawn(
            mut self,
            matcher: impl Fn(&Invocation) -> bool + Send + Sync + 'static,
            message: &str,
        ) -> Self {
            self.rules
                .push((Box::new(matcher), Reply::SpawnError(message.to_string())));
            self
        }

        pub fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self, program: &str, subcommand: &str) -> usize {
            self.calls()
                .iter()
                .filter(|call| call.is(program, subcommand))
                .count()
        }
    }

    impl ProcessRunner for FakeRunner {
        fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<ProcessOutput> {
            let invocation = Invocation {
                program: program.to_string(),
                args: args.to_vec(),
                cwd: cwd.to_path_buf(),
            };
            self.calls.lock().unwrap().push(invocation.clone());

            let reply = self
                .rules
                .iter()
                .find(|(matcher, _)| matcher(&invocation))
                .map(|(_, reply)| reply);

            let output = match reply {
                Some(Reply::SpawnError(message)) => {
                    return Err(AuditError::Subprocess {
                        program: program.to_string(),
                        message: message.clone(),
                    });
                }
                Some(Reply::Output(output)) => output.clone(),
                None if invocation.subcommand() == Some("rev-parse") => {
                    ProcessOutput::success(format!("{}\n", cwd.display()))
                }
                None => ProcessOutput::success(""),
            };

            if output.is_success() && invocation.subcommand() == Some("clone") {
                if let Some(target) = args.last() {
                    let dir = cwd.join(target);
                    fs::create_dir_all(dir.join(".git"))?;
                    fs::write(dir.join("composer.json"), "{}")?;
                }
            }

            Ok(output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_includes_stderr() {
        let output = ProcessOutput::failure(128, "fatal: not a git repository\n");
        assert!(!output.is_success());
        assert_eq!(
            output.failure_message(),
            "exit code 128: fatal: not a git repository"
        );
    }

    #[test]
    fn test_signal_termination_is_failure() {
        let output = ProcessOutput {
            exit_code: None,
            ..Default::default()
        };
        assert!(!output.is_success());
        assert_eq!(output.failure_message(), "terminated by signal");
    }

    #[test]
    fn test_missing_program_is_subprocess_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SystemProcessRunner.run(
            "github-outdated-no-such-binary",
            &["--version".to_string()],
            dir.path(),
        );
        assert!(matches!(result, Err(AuditError::Subprocess { .. })));
    }

    #[test]
    fn test_fake_runner_records_and_clones() {
        let dir = tempfile::tempdir().unwrap();
        let runner = testing::FakeRunner::new();

        let output = runner
            .run(
                "git",
                &["clone".to_string(), "git@x:y.git".to_string(), "y".to_string()],
                dir.path(),
            )
            .unwrap();

        assert!(output.is_success());
        assert!(dir.path().join("y").join("composer.json").exists());
        assert!(dir.path().join("y").join(".git").is_dir());
        assert_eq!(runner.count("git", "clone"), 1);
    }
}
