//! Progress bars, panels and tables for CLI runs.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use console::{Alignment, Color, measure_text_width, pad_str, style};
use indicatif::{ProgressBar, ProgressStyle};

use crate::diff::{WorkItem, WorkPlan};
use crate::download::{BatchReport, DownloadProgress, Outcome};
use crate::stats::FileStats;
use crate::{format_bytes, format_duration};

const SEPARATOR: &str = "────────────────────────────────────────────────────────────";

/// Creates a progress bar for a single file download.
fn make_progress_bar(size: u64, name: &str) -> ProgressBar {
    let bar = ProgressBar::new(size);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} @ {bytes_per_sec} - {msg}",
        )
        .expect("progress template is valid")
        .progress_chars("━━╌"),
    );
    bar.set_message(name.to_string());
    bar
}

/// Creates a spinner for downloads without a Content-Length.
fn make_spinner(name: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {bytes} @ {bytes_per_sec} - {msg}")
            .expect("spinner template is valid"),
    );
    bar.set_message(name.to_string());
    bar
}

/// Renders per-file progress on the terminal.
#[derive(Default)]
pub struct ConsoleProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.bar.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl DownloadProgress for ConsoleProgress {
    fn on_file_start(&self, name: &str, total: Option<u64>) {
        let bar = total.map_or_else(|| make_spinner(name), |size| make_progress_bar(size, name));
        bar.enable_steady_tick(Duration::from_millis(250));
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn on_progress(&self, _name: &str, downloaded: u64, _total: Option<u64>) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.set_position(downloaded);
            }
        }
    }

    fn on_file_complete(&self, name: &str, stats: &FileStats) {
        if let Some(bar) = self.take_bar() {
            bar.finish_and_clear();
        }
        println!(
            "  {} {} - {} in {} ({}/s avg, {}/s peak)",
            style("✓").green(),
            name,
            format_bytes(stats.size),
            format_duration(stats.elapsed),
            format_bytes(stats.average_speed),
            format_bytes(stats.peak_speed),
        );
    }

    fn on_skipped(&self, name: &str, path: &Path) {
        println!(
            "  {} {name} already exists at {}",
            style("↷").yellow(),
            path.display()
        );
    }

    fn on_error(&self, name: &str, error: &str) {
        if let Some(bar) = self.take_bar() {
            bar.abandon();
        }
        println!("  {} {name}: {}", style("✗").red(), style(error).red());
    }
}

/// Prints a titled block framed by separators.
pub fn print_panel(title: &str, body: &str, color: Color) {
    println!("\n{}", style(SEPARATOR).fg(color));
    println!("{}", style(title).fg(color).bold());
    println!("{}", style(SEPARATOR).fg(color));
    for line in body.lines() {
        println!("  {line}");
    }
    println!("{}", style(SEPARATOR).fg(color));
}

/// Prints the catalogue-versus-disk counts.
pub fn print_overview(vendor: &str, plan: &WorkPlan, target_dir: &Path) {
    let body = format!(
        "{} catalogue check\n\
         {} archive(s) discovered on the site.\n\
         {} already stored in {} or sibling folders.\n\
         {} left to download.",
        style(vendor).cyan().bold(),
        style(plan.total).bold(),
        style(plan.present).green().bold(),
        style(target_dir.display()).italic(),
        style(plan.missing).magenta().bold(),
    );
    print_panel(&format!("{vendor} Harvest"), &body, Color::Cyan);
}

/// Prints how many archives are still outstanding.
pub fn print_remaining(count: usize) {
    if count == 0 {
        print_panel("Remaining Downloads", "All caught up!", Color::Green);
    } else {
        let body = format!("{} archive(s) still pending.", style(count).magenta().bold());
        print_panel("Remaining Downloads", &body, Color::Magenta);
    }
}

/// Lays out rows as left-aligned columns. Cells may carry styling; a header
/// row is printed bold.
fn print_table(title: &str, header: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = header.iter().map(|h| measure_text_width(h)).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(measure_text_width(cell));
        }
    }

    let render = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad_str(cell, *width, Alignment::Left, None).into_owned())
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("\n{}", style(title).bold());
    let header: Vec<String> = header.iter().map(|h| style(h).bold().to_string()).collect();
    println!("  {}", render(header.as_slice()));
    println!("  {}", style(SEPARATOR).dim());
    for row in rows {
        println!("  {}", render(row.as_slice()));
    }
}

/// Prints the archives about to be downloaded.
pub fn print_work_list(title: &str, items: &[WorkItem]) {
    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            vec![
                style(item.filename()).yellow().bold().to_string(),
                style(item.entry.download_url.as_str()).magenta().to_string(),
            ]
        })
        .collect();
    print_table(title, &["File", "Source"], &rows);
}

/// Prints one row per attempted archive.
pub fn print_results(report: &BatchReport) {
    let rows: Vec<Vec<String>> = report
        .results
        .iter()
        .map(|result| {
            let status = style(result.outcome.label()).bold();
            let status = match result.outcome {
                Outcome::Downloaded => status.green(),
                Outcome::Skipped => status.yellow(),
                Outcome::Failed => status.red(),
            };
            vec![
                style(&result.filename).bold().to_string(),
                status.to_string(),
                result.detail.clone(),
            ]
        })
        .collect();
    print_table("Download Summary", &["File", "Status", "Details"], &rows);
}

/// Prints the session totals.
pub fn print_session(report: &BatchReport) {
    let stats = &report.stats;
    let mut body = format!(
        "Fetched {} archive(s).\nTransferred {}.",
        style(stats.files_downloaded).bold(),
        style(format_bytes(stats.total_bytes)).bold(),
    );
    if stats.files_downloaded > 0 {
        body.push_str(&format!(
            "\nTook {} ({}/s avg, {}/s peak).",
            format_duration(stats.elapsed),
            format_bytes(stats.average_speed()),
            format_bytes(stats.peak_speed),
        ));
    }

    if report.has_failures() {
        print_panel("Session Finished", &body, Color::Yellow);
    } else {
        print_panel("Session Complete", &body, Color::Green);
    }
}
