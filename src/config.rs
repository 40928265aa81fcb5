// file: src/config.rs
// description: application configuration management with yaml support
// reference: https://docs.rs/config

use crate::error::{AuditError, Result};
use crate::models::CloneProtocol;
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "repositories.yml";
const ENV_PREFIX: &str = "GITHUB_OUTDATED";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub composer: ComposerConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComposerConfig {
    pub path: String,
    #[serde(default)]
    pub minor_only: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub organisation: Option<String>,
    pub username: Option<String>,
    pub language: String,
    pub protocol: CloneProtocol,
    pub api_url: String,
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            organisation: None,
            username: None,
            language: "PHP".to_string(),
            protocol: CloneProtocol::Ssh,
            api_url: "https://api.github.com".to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitConfig {
    pub path: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            path: "git".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub checkout_dir: PathBuf,
    pub report_dir: PathBuf,
    pub pretty: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            checkout_dir: PathBuf::from("_output/repositories"),
            report_dir: PathBuf::from("_output/reports"),
            pretty: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub skip: Vec<String>,
    pub fail_fast: bool,
    pub dry_run: bool,
    pub include_archived: bool,
    pub include_forks: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            skip: Vec::new(),
            fail_fast: false,
            dry_run: false,
            include_archived: false,
            include_forks: true,
        }
    }
}

/// Where parsed reports go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Files,
    Stdout,
}

/// Flags given on the command line, layered over the file configuration.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub dry_run: bool,
    pub minor_only: bool,
    pub fail_fast: bool,
    pub skip: Vec<String>,
    pub stdout: bool,
}

/// Immutable settings for a single audit run.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    pub organisation: Option<String>,
    pub username: Option<String>,
    pub composer_path: String,
    pub git_path: String,
    pub skip: BTreeSet<String>,
    pub minor_only: bool,
    pub fail_fast: bool,
    pub dry_run: bool,
    pub checkout_dir: PathBuf,
    pub report_dir: PathBuf,
    pub pretty: bool,
    pub output: OutputMode,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();
        Self::load_with_environment(path, None)
    }

    /// `environment` replaces the process environment when given.
    fn load_with_environment(
        path: Option<&Path>,
        environment: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("pipeline.skip")
                    .source(environment),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.composer.path.trim().is_empty() {
            return Err(AuditError::Config(
                "composer.path must not be empty".to_string(),
            ));
        }

        let has_organisation = non_blank(&self.github.organisation).is_some();
        let has_username = non_blank(&self.github.username).is_some();
        if !has_organisation && !has_username {
            return Err(AuditError::Config(
                "Missing either github.organisation or github.username key".to_string(),
            ));
        }

        if self.github.language.trim().is_empty() {
            return Err(AuditError::Config(
                "github.language must not be empty".to_string(),
            ));
        }

        Validator::validate_url(&self.github.api_url)
            .map_err(|e| AuditError::Config(format!("github.api_url: {}", e)))?;

        if self.git.path.trim().is_empty() {
            return Err(AuditError::Config("git.path must not be empty".to_string()));
        }

        Ok(())
    }

    pub fn run_configuration(&self, overrides: &RunOverrides) -> RunConfiguration {
        let skip = self
            .pipeline
            .skip
            .iter()
            .chain(overrides.skip.iter())
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        RunConfiguration {
            organisation: non_blank(&self.github.organisation),
            username: non_blank(&self.github.username),
            composer_path: self.composer.path.clone(),
            git_path: self.git.path.clone(),
            skip,
            minor_only: self.composer.minor_only || overrides.minor_only,
            fail_fast: self.pipeline.fail_fast || overrides.fail_fast,
            dry_run: self.pipeline.dry_run || overrides.dry_run,
            checkout_dir: self.workspace.checkout_dir.clone(),
            report_dir: self.workspace.report_dir.clone(),
            pretty: self.workspace.pretty,
            output: if overrides.stdout {
                OutputMode::Stdout
            } else {
                OutputMode::Files
            },
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
