// file: src/pipeline/progress.rs
// description: progress tracking and statistics reporting for audit runs
// reference: uses indicatif for progress bars and tracks per-repository outcomes

use crate::models::{AuditResult, Stage};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditStats {
    pub repositories_selected: usize,
    pub repositories_audited: usize,
    pub repositories_failed: usize,
    pub reports_repaired: usize,
    pub outdated_packages: usize,
    pub duration_secs: u64,
}

impl AuditStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories_processed(&self) -> usize {
        self.repositories_audited + self.repositories_failed
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.repositories_processed();
        if total == 0 {
            return 0.0;
        }
        (self.repositories_audited as f64 / total as f64) * 100.0
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    total: usize,
    audited: AtomicUsize,
    failed: AtomicUsize,
    repaired: AtomicUsize,
    outdated: AtomicUsize,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_repositories: usize, visible: bool) -> Self {
        Self::with_color(total_repositories, visible, true)
    }

    pub fn with_color(total_repositories: usize, visible: bool, colored: bool) -> Self {
        let multi_progress = if visible {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };

        let main_bar = create_progress_bar(&multi_progress, total_repositories as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            total: total_repositories,
            audited: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            repaired: AtomicUsize::new(0),
            outdated: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn start_repository(&self, name: &str) {
        self.main_bar.set_message(name.to_string());
    }

    pub fn set_stage(&self, name: &str, stage: Stage) {
        self.main_bar.set_message(format!("{} ({})", name, stage));
    }

    pub fn record(&self, result: &AuditResult) {
        if result.is_failed() {
            self.failed.fetch_add(1, Ordering::SeqCst);
        } else {
            self.audited.fetch_add(1, Ordering::SeqCst);
        }
        if result.recovery_applied {
            self.repaired.fetch_add(1, Ordering::SeqCst);
        }
        if let Some(count) = result.outdated_packages() {
            self.outdated.fetch_add(count, Ordering::SeqCst);
        }

        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Audit complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> AuditStats {
        AuditStats {
            repositories_selected: self.total,
            repositories_audited: self.audited.load(Ordering::SeqCst),
            repositories_failed: self.failed.load(Ordering::SeqCst),
            reports_repaired: self.repaired.load(Ordering::SeqCst),
            outdated_packages: self.outdated.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs(),
        }
    }

    fn update_detail_bar(&self) {
        let message = format!(
            "Outdated packages: {} | Failed: {} | Repaired: {}",
            self.outdated.load(Ordering::SeqCst),
            self.failed.load(Ordering::SeqCst),
            self.repaired.load(Ordering::SeqCst)
        );

        self.detail_bar.set_message(message);
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    if colored {
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .expect("Failed to create progress bar template")
                .progress_chars("█▓▒░"),
        );
    } else {
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}")
                .expect("Failed to create progress bar template")
                .progress_chars("=>-"),
        );
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .expect("Failed to create detail bar template");
    bar.set_style(style);
    bar
}
