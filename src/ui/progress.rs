use crate::resolver::{SeedOutcome, SeedProgress, SeedReport, SeedStatus};
use crate::ui::theme;
use crate::ui::Icons;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

const SEED_TEMPLATE: &str = "{spinner} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}";

/// Progress bar for a corpus seed. Hidden when stdout is not a terminal.
pub struct SeedProgressBar {
    pb: ProgressBar,
}

impl SeedProgressBar {
    pub fn new(total: usize) -> Self {
        let pb = if console::Term::stdout().is_term() {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template(SEED_TEMPLATE) {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn update(&self, progress: &SeedProgress) {
        self.pb.set_position(progress.done as u64);
        let verb = match progress.status {
            SeedStatus::Seeded => "Fetched",
            SeedStatus::Skipped => "Cached",
            SeedStatus::Failed => "Failed",
        };
        self.pb.set_message(format!("{} {}", verb, progress.reference));
    }

    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }

    pub fn finish_with_summary(&self, duration: Duration, report: &SeedReport) {
        self.clear();
        println!();
        let (icon, headline, style) = match report.outcome {
            SeedOutcome::Completed if report.failures.is_empty() => {
                (Icons::CHECK, "Seed complete", theme().success.clone())
            }
            SeedOutcome::Completed => (Icons::WARN, "Seed finished with errors", theme().warn.clone()),
            SeedOutcome::AlreadyComplete => (Icons::CHECK, "Already seeded", theme().success.clone()),
            SeedOutcome::Cancelled => (Icons::WARN, "Seed cancelled", theme().warn.clone()),
        };
        println!(
            "{} {}",
            icon,
            format!("{} in {}", headline, HumanDuration(duration)).style(style)
        );
        println!(
            "  {} {}  {} {}  {} {}",
            Icons::DOWN.style(theme().info.clone()),
            report.seeded,
            Icons::SKIP.style(theme().info.clone()),
            report.skipped,
            Icons::CROSS.style(theme().info.clone()),
            report.failures.len()
        );
    }
}

pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_message(message.to_string());
        if console::Term::stderr().is_term() {
            pb.enable_steady_tick(Duration::from_millis(100));
        } else {
            pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        }
        Self { pb }
    }

    pub fn finish_and_clear(&self) {
        self.pb.finish_and_clear();
    }
}
