//! Console rendering for summaries and reports

use clap::ValueEnum;
use console::style;
use std::fmt::Write as _;
use std::time::Duration;
use xfmirror_engine::{ScanOutcome, SyncReport};
use xfmirror_types::{format_bytes, SizeReport};

/// Estimate report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Aligned columns with human-readable sizes
    Table,
    /// `Top|Package|File Name|Size` with sizes in bytes
    Pipe,
    /// JSON document
    Json,
}

const HEADERS: [&str; 4] = ["Top", "Package", "File Name", "Size"];

/// Render a size report as aligned columns
pub fn render_table(report: &SizeReport) -> String {
    let rows: Vec<[String; 4]> = report
        .rows_with_total()
        .iter()
        .map(|row| {
            [
                row.area.clone(),
                row.package.clone(),
                row.file_name.clone(),
                row.human_size(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let line = |out: &mut String, cells: [&str; 4]| {
        let _ = writeln!(
            out,
            "{:<w0$}  {:<w1$}  {:<w2$}  {:>w3$}",
            cells[0],
            cells[1],
            cells[2],
            cells[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
        );
    };

    line(&mut out, HEADERS);
    let rule = widths.map(|w| "-".repeat(w));
    line(
        &mut out,
        [rule[0].as_str(), rule[1].as_str(), rule[2].as_str(), rule[3].as_str()],
    );
    for row in &rows {
        line(
            &mut out,
            [row[0].as_str(), row[1].as_str(), row[2].as_str(), row[3].as_str()],
        );
    }
    out
}

/// Render a size report as pipe-delimited lines with byte sizes
pub fn render_pipe(report: &SizeReport) -> String {
    let mut out = HEADERS.join("|");
    out.push('\n');
    for row in report.rows_with_total() {
        let _ = writeln!(
            out,
            "{}|{}|{}|{}",
            row.area, row.package, row.file_name, row.size
        );
    }
    out
}

/// Print the final summary of a sync run
pub fn print_sync_summary(report: &SyncReport) {
    let stats = &report.stats;
    println!();
    println!("{}", style("Sync Statistics:").bold().underlined());
    println!(
        "  Packages scanned: {}",
        style(report.scan.packages_scanned).cyan()
    );
    if report.scan.packages_skipped > 0 {
        println!(
            "  Packages skipped: {}",
            style(report.scan.packages_skipped).yellow()
        );
    }
    println!("  Files selected: {}", style(report.scan.tasks.len()).cyan());
    println!("  Downloaded: {}", style(stats.completed).green());
    println!("  Already present: {}", style(stats.skipped).green());
    println!(
        "  Failed: {}",
        if stats.failed > 0 {
            style(stats.failed).red()
        } else {
            style(stats.failed).green()
        }
    );
    if stats.cancelled > 0 || stats.not_started > 0 {
        println!("  Cancelled: {}", style(stats.cancelled).yellow());
        println!("  Not started: {}", style(stats.not_started).yellow());
    }
    println!(
        "  Bytes downloaded: {}",
        style(format_bytes(stats.bytes_transferred)).green()
    );
    println!(
        "  Duration: {}",
        style(format_duration(stats.duration)).blue()
    );
    println!(
        "  Transfer rate: {}",
        style(format!("{:.2} MB/s", stats.transfer_rate() / 1024.0 / 1024.0)).blue()
    );
}

/// Print the tasks selected by a dry scan
pub fn print_scan(outcome: &ScanOutcome) {
    for task in &outcome.tasks {
        let category = format!("{:<10}", task.category.as_str());
        println!("{} {}", style(category).dim(), task);
    }
    println!();
    println!(
        "{} {} files selected from {} packages",
        style("ℹ").blue().bold(),
        outcome.tasks.len(),
        outcome.packages_scanned
    );
    for area in &outcome.areas_skipped {
        display_warning(&format!("Area {} was not scanned", area));
    }
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Display a warning message with proper formatting
pub fn display_warning(message: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), style(message).yellow());
}

/// Display a success message with proper formatting
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), style(message).green());
}
