//! Console reporting for the binary: settings table, progress bars, run summary.

use colored::Colorize;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::inventory::{PipelineEvent, RunSummary, Session, SessionPaths};

const RULE: &str = "=======================================================================";
const NAME_WIDTH: usize = 40;

/// Human-readable size using binary units
pub fn human_size(bytes: u64) -> String {
    format_size(bytes, BINARY)
}

/// Shorten a file name for the progress line
pub fn truncate_name(name: &str) -> String {
    name.chars().take(NAME_WIDTH).collect()
}

pub fn print_settings(session: &Session, paths: &SessionPaths) {
    let rows = [
        ("Session File", paths.descriptor.display().to_string()),
        ("Session Date&Time", session.datetime.clone()),
        ("Session Loaded", session.is_loaded().to_string()),
        ("Target Path", session.target_path.display().to_string()),
        ("Recursive", session.recursive.to_string()),
        ("Hash Type", session.algorithm.to_string()),
        ("Verbose Progress", session.verbose.to_string()),
    ];

    println!("  {}", RULE);
    println!("  {:<25}{}", "Setting".bold(), "Value".bold());
    println!("  {}", RULE);
    for (name, value) in rows {
        println!("  {:<25}{}", name, value);
    }
    println!("  {}", RULE);
}

pub fn print_summary(summary: &RunSummary, paths: &SessionPaths) {
    println!("\nRun complete!");
    println!("Files discovered: {}", summary.discovered);
    println!("Files hashed: {} ({})", summary.hashed, human_size(summary.total_bytes));
    if summary.failed > 0 {
        println!("{}", format!("Files failed: {}", summary.failed).red());
    }
    if summary.already_hashed > 0 {
        println!("Already hashed: {}", summary.already_hashed);
    }
    if summary.skipped_entries > 0 {
        println!("{}", format!("Entries skipped: {}", summary.skipped_entries).yellow());
    }
    println!("Duration: {:.2}s", summary.duration.as_secs_f64());
    println!("Discovered table: {}", paths.discovered.display());
    println!("Hashed table: {}", paths.hashed.display());
}

/// Progress bars driven by pipeline events; silent unless verbose
pub struct ConsoleReporter {
    discovery: ProgressBar,
    hashing: ProgressBar,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        let (discovery, hashing) = if verbose {
            (ProgressBar::new_spinner(), ProgressBar::new(0))
        } else {
            (ProgressBar::hidden(), ProgressBar::hidden())
        };
        if verbose {
            hashing.set_draw_target(ProgressDrawTarget::stdout());
            discovery.set_draw_target(ProgressDrawTarget::stdout());
        }

        discovery.set_style(
            ProgressStyle::with_template("  {spinner} Discovered files {pos}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        hashing.set_style(
            ProgressStyle::with_template("  Hashing {pos}/{len} [{bar:30.cyan/blue}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        Self { discovery, hashing }
    }

    pub fn handle(&self, event: &PipelineEvent<'_>) {
        match event {
            PipelineEvent::Discovered { count, .. } => {
                self.discovery.set_position(*count as u64);
                self.discovery.tick();
            }
            PipelineEvent::DiscoveryFinished { count } => {
                self.discovery.set_position(*count as u64);
                self.discovery.finish();
                self.hashing.set_length(*count as u64);
            }
            PipelineEvent::Hashing { index, record, .. } => {
                self.hashing.set_position(index.saturating_sub(1) as u64);
                self.hashing.set_message(format!(
                    "Size: {}  Name: {}",
                    human_size(record.size),
                    truncate_name(&record.name)
                ));
            }
            PipelineEvent::Hashed { .. } | PipelineEvent::AlreadyHashed { .. } => {
                self.hashing.inc(1);
            }
            PipelineEvent::Finished { .. } => {
                self.hashing.finish();
            }
        }
    }
}
