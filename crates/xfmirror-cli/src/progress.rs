//! Terminal progress bars for download runs

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use xfmirror_types::{DownloadOutcome, DownloadTask, ProgressSink};

const OVERALL_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} files {msg}";
const FILE_TEMPLATE: &str =
    "  {msg:40!} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

fn style_or_default(template: &str, fallback: ProgressStyle) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or(fallback)
}

/// One overall bar plus one bar per in-flight file
pub struct ProgressDisplay {
    multi: MultiProgress,
    overall: ProgressBar,
    file_style: ProgressStyle,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl ProgressDisplay {
    /// Create a display drawing to stderr, or nowhere when `hidden`
    pub fn new(hidden: bool) -> Self {
        let target = if hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        };
        let multi = MultiProgress::with_draw_target(target);

        let overall = multi.add(ProgressBar::new(0));
        overall.set_style(
            style_or_default(OVERALL_TEMPLATE, ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        overall.enable_steady_tick(Duration::from_millis(100));

        Self {
            multi,
            overall,
            file_style: style_or_default(FILE_TEMPLATE, ProgressStyle::default_bar())
                .progress_chars("=> "),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn bars(&self) -> MutexGuard<'_, HashMap<String, ProgressBar>> {
        self.bars.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clear every bar
    pub fn finish(&self) {
        for (_, bar) in self.bars().drain() {
            bar.finish_and_clear();
        }
        self.overall.finish_and_clear();
    }
}

impl ProgressSink for ProgressDisplay {
    fn run_started(&self, total_tasks: usize) {
        self.overall.set_length(total_tasks as u64);
        self.overall.set_position(0);
    }

    fn task_started(&self, task: &DownloadTask, total_bytes: u64) {
        let bar = self.multi.add(ProgressBar::new(total_bytes));
        bar.set_style(self.file_style.clone());
        bar.set_message(task.file_name.clone());
        self.bars().insert(task.to_string(), bar);
    }

    fn task_progress(&self, task: &DownloadTask, transferred: u64, _total_bytes: u64) {
        if let Some(bar) = self.bars().get(&task.to_string()) {
            bar.set_position(transferred);
        }
    }

    fn task_finished(&self, task: &DownloadTask, outcome: &DownloadOutcome) {
        if let Some(bar) = self.bars().remove(&task.to_string()) {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
        self.overall.inc(1);

        let line = match outcome {
            DownloadOutcome::Completed { .. } | DownloadOutcome::SkippedAlreadyPresent => return,
            DownloadOutcome::Cancelled => format!("{} {} cancelled", style("⚠").yellow(), task),
            DownloadOutcome::Failed(reason) => {
                format!("{} {} failed: {}", style("✗").red(), task, reason)
            }
        };
        let _ = self.multi.println(line);
    }
}
