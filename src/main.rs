// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use github_outdated::auditor::ComposerAuditor;
use github_outdated::utils::logging::{
    format_error, format_info, format_step, format_success, format_warning,
};
use github_outdated::{
    AuditResult, Config, GitHubClient, HealthCheck, HealthReport, JsonExporter, OperationTimer,
    OutputMode, PipelineDriver, ProcessRunner, RepositorySource, RunOverrides, RunSummary,
    SelectionRules, SystemProcessRunner, Validator, discover_token,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "github-outdated")]
#[command(version)]
#[command(
    about = "Reports outdated Composer dependencies across the PHP repositories of a GitHub account",
    long_about = None
)]
struct Cli {
    #[arg(short, long, value_name = "FILE", default_value = "repositories.yml")]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync every selected repository and store its `composer outdated` report
    Outdated {
        /// Only list the repositories that would be audited
        #[arg(long)]
        dry: bool,

        /// Only report minor and patch updates
        #[arg(short = 'm', long)]
        minor_only: bool,

        /// Stop at the first repository that fails
        #[arg(long)]
        fail_fast: bool,

        /// Repository names to leave out, comma separated
        #[arg(long, value_name = "NAMES", value_delimiter = ',')]
        skip: Vec<String>,

        /// Print one json line per repository instead of writing files
        #[arg(long)]
        stdout: bool,

        #[arg(long)]
        no_progress: bool,
    },

    /// Check configuration, credentials and the git and composer binaries
    Lint,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    github_outdated::utils::logging::init_logger(cli.color, cli.verbose);

    info!("Loading configuration from: {}", cli.config.display());

    match cli.command {
        Some(Commands::Lint) => cmd_lint(&cli.config),
        Some(Commands::Outdated {
            dry,
            minor_only,
            fail_fast,
            skip,
            stdout,
            no_progress,
        }) => {
            let overrides = RunOverrides {
                dry_run: dry,
                minor_only,
                fail_fast,
                skip,
                stdout,
            };
            cmd_outdated(&cli.config, overrides, !no_progress && !stdout, cli.color).await
        }
        None => cmd_outdated(&cli.config, RunOverrides::default(), true, cli.color).await,
    }
}

async fn cmd_outdated(
    config_path: &Path,
    overrides: RunOverrides,
    show_progress: bool,
    color: bool,
) -> Result<()> {
    let start_time = Instant::now();

    let config = Config::load(Some(config_path)).context("Failed to load configuration")?;
    let run = config.run_configuration(&overrides);

    let token = discover_token(&config.github);
    if token.is_none() {
        warn!("No GitHub token found, private repositories will not be listed");
    }

    let client = GitHubClient::new(&config.github.api_url, token.as_deref())
        .context("Failed to create GitHub client")?;
    let source = RepositorySource::new(client, SelectionRules::from(&config));

    let repositories = source
        .list(run.organisation.as_deref(), run.username.as_deref(), &run.skip)
        .await
        .context("Failed to list repositories")?;

    if repositories.is_empty() {
        warn!("No repositories matched, nothing to do");
        return Ok(());
    }

    let dry_run = run.dry_run;
    let output = run.output;
    let exporter = JsonExporter::new(&run.report_dir, run.output, run.pretty);
    let driver = PipelineDriver::new(run, SystemProcessRunner, exporter)
        .context("Failed to prepare audit run")?
        .with_progress(show_progress, color);
    info!("Working copies under {}", driver.checkout_dir().display());

    let summary = tokio::task::spawn_blocking(move || -> Result<RunSummary> {
        let summary = driver.run(&repositories);
        if !dry_run {
            if let Some(path) = driver.exporter().write_manifest(&summary)? {
                info!("Run summary written to {}", path.display());
            }
        }
        Ok(summary)
    })
    .await
    .context("Audit run panicked")??;

    print_summary(&summary, output);
    info!("Finished in {:.2}s", start_time.elapsed().as_secs_f64());

    if let Some(abort) = summary.aborted {
        error!("{}", abort);
        return Err(anyhow::anyhow!("Run aborted: {}", abort));
    }

    Ok(())
}

/// Human-readable lines go to stderr unless this is a dry run writing no json to stdout.
fn summary_on_stderr(dry_run: bool, output: OutputMode) -> bool {
    !dry_run || output == OutputMode::Stdout
}

fn print_summary(summary: &RunSummary, output: OutputMode) {
    let total = summary.selected.len();

    if summary.dry_run {
        let mut lines = vec![format_info(&format!(
            "{} repositories would be audited",
            total
        ))];
        lines.extend(summary.selected.iter().enumerate().map(|(idx, repository)| {
            format_step(
                idx + 1,
                total,
                &format!("{} ({})", repository.name, repository.default_branch),
            )
        }));

        for line in lines {
            if summary_on_stderr(true, output) {
                eprintln!("{}", line);
            } else {
                println!("{}", line);
            }
        }
        return;
    }

    for (idx, result) in summary.results.iter().enumerate() {
        eprintln!("{}", format_step(idx + 1, total, &describe(result)));
    }

    let stats = &summary.stats;
    eprintln!();
    let line = format!(
        "{} audited, {} failed, {} repaired, {} outdated packages ({:.1}% success)",
        stats.repositories_audited,
        stats.repositories_failed,
        stats.reports_repaired,
        stats.outdated_packages,
        stats.success_rate()
    );
    let failed: Vec<&str> = summary.failed().map(AuditResult::name).collect();
    if failed.is_empty() {
        eprintln!("{}", format_success(&line));
    } else {
        eprintln!("{}", format_warning(&line));
        eprintln!("{}", format_warning(&format!("Failed: {}", failed.join(", "))));
    }

    let skipped = total.saturating_sub(summary.results.len());
    if skipped > 0 {
        eprintln!(
            "{}",
            format_error(&format!("{} repositories not audited after abort", skipped))
        );
    }
}

fn describe(result: &AuditResult) -> String {
    match result.first_failure() {
        Some(failure) => format_error(&format!(
            "{}: {} ({})",
            result.name(),
            Validator::truncate_text(&failure.message, 120),
            failure.stage
        )),
        None => {
            let count = result.outdated_packages().unwrap_or(0);
            let repaired = if result.recovery_applied { ", repaired" } else { "" };
            format_success(&format!(
                "{}: {} outdated packages{}",
                result.name(),
                count,
                repaired
            ))
        }
    }
}

fn cmd_lint(config_path: &Path) -> Result<()> {
    let mut checks = Vec::new();

    let timer = OperationTimer::new("configuration check");
    let config = match Config::load(Some(config_path)) {
        Ok(config) => {
            checks.push(HealthCheck::healthy(
                "configuration",
                Some(config_path.display().to_string()),
                timer.finish(),
            ));
            config
        }
        Err(e) => {
            checks.push(HealthCheck::unhealthy("configuration", e.to_string(), timer.finish()));
            let report = HealthReport::new(checks, env!("CARGO_PKG_VERSION").to_string());
            println!("{}", report.format());
            return Err(anyhow::anyhow!("Configuration is invalid"));
        }
    };

    let timer = OperationTimer::new("credentials check");
    checks.push(match discover_token(&config.github) {
        Some(_) => HealthCheck::healthy("credentials", None, timer.finish()),
        None => HealthCheck::degraded(
            "credentials",
            "No token found, unauthenticated rate limits apply".to_string(),
            timer.finish(),
        ),
    });

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let runner = SystemProcessRunner;

    let timer = OperationTimer::new("git check");
    let git = runner.run(&config.git.path, &["--version".to_string()], &cwd);
    checks.push(binary_check("git", git, timer));

    let timer = OperationTimer::new("composer check");
    let composer = ComposerAuditor::new(runner, config.composer.path.as_str()).version(&cwd);
    checks.push(binary_check("composer", composer, timer));

    let timer = OperationTimer::new("workspace check");
    checks.push(match Validator::validate_directory(&config.workspace.checkout_dir) {
        Ok(()) => HealthCheck::healthy(
            "workspace",
            Some(config.workspace.checkout_dir.display().to_string()),
            timer.finish(),
        ),
        Err(_) => HealthCheck::degraded(
            "workspace",
            format!(
                "{} will be created on first run",
                config.workspace.checkout_dir.display()
            ),
            timer.finish(),
        ),
    });

    let report = HealthReport::new(checks, env!("CARGO_PKG_VERSION").to_string());
    println!("{}", report.format());

    if !report.is_usable() {
        return Err(anyhow::anyhow!("Environment is not ready for an audit run"));
    }

    Ok(())
}

fn binary_check(
    component: &str,
    outcome: github_outdated::Result<github_outdated::ProcessOutput>,
    timer: OperationTimer,
) -> HealthCheck {
    match outcome {
        Ok(output) if output.is_success() => HealthCheck::healthy(
            component,
            output.stdout.lines().next().map(str::to_string),
            timer.finish(),
        ),
        Ok(output) => HealthCheck::unhealthy(component, output.failure_message(), timer.finish()),
        Err(e) => HealthCheck::unhealthy(component, e.to_string(), timer.finish()),
    }
}
