//! Application UI: progress and status messages on stderr.
//!
//! Everything we show goes through one [`MultiProgress`], so that log lines,
//! status messages and progress bars never draw over each other.

use std::{borrow::Cow, io, sync::Arc, time::Duration};

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressFinish, ProgressStyle};

/// How often spinners and bars redraw.
const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Long-running things we show progress for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activity {
    /// Counting the items in an input file before we start.
    CountingItems,
    /// Sending items to the OCR service.
    OcrItems,
}

impl Activity {
    fn emoji(self) -> &'static str {
        match self {
            Activity::CountingItems => "🧮",
            Activity::OcrItems => "🔎",
        }
    }

    fn running_msg(self) -> &'static str {
        match self {
            Activity::CountingItems => "Counting input items",
            Activity::OcrItems => "OCRing items",
        }
    }

    fn done_msg(self) -> &'static str {
        match self {
            Activity::CountingItems => "Counted input items",
            Activity::OcrItems => "OCRed items",
        }
    }
}

/// Application UI state.
#[derive(Clone)]
pub struct Ui {
    multi_progress: Arc<MultiProgress>,
}

impl Ui {
    /// Create a new UI drawing to stderr.
    pub fn init() -> Ui {
        Ui {
            multi_progress: Arc::new(MultiProgress::new()),
        }
    }

    /// Create a new UI for unit tests, which never draws anything.
    #[cfg(test)]
    pub fn init_for_tests() -> Ui {
        Ui {
            multi_progress: Arc::new(MultiProgress::with_draw_target(
                ProgressDrawTarget::hidden(),
            )),
        }
    }

    /// Stop drawing progress, for when records are going to stdout.
    pub fn hide_progress_bars(&self) {
        self.multi_progress
            .set_draw_target(ProgressDrawTarget::hidden());
    }

    /// A stderr writer for `tracing`.
    pub fn get_stderr_writer(&self) -> SafeStderrWriter {
        SafeStderrWriter { ui: self.clone() }
    }

    /// Print a status line to stderr.
    pub fn display_message(&self, emoji: &str, msg: &str) {
        self.multi_progress.suspend(|| eprintln!("{emoji} {msg}"));
    }

    /// Start showing progress for `activity`. We use a bar when we know how
    /// many items to expect, and a spinner otherwise.
    pub fn start(&self, activity: Activity, len: Option<u64>) -> ProgressBar {
        let pb = match len {
            Some(len) if len > 0 => ProgressBar::new(len).with_style(bar_style()),
            _ => ProgressBar::new_spinner().with_style(spinner_style()),
        };
        let pb = self.multi_progress.add(pb);
        #[cfg(test)]
        pb.set_draw_target(ProgressDrawTarget::hidden());
        pb.set_prefix(activity.emoji());
        pb.set_message(activity.running_msg());
        pb.enable_steady_tick(TICK_INTERVAL);
        pb.with_finish(ProgressFinish::WithMessage(Cow::Borrowed(
            activity.done_msg(),
        )))
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  {prefix:3}{msg:25} {pos:>4}/{len:4} {elapsed_precise} {wide_bar:.cyan/blue} {eta_precise}")
        .expect("bad progress bar template")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner} {prefix:3}{msg} {pos}")
        .expect("bad spinner template")
}

/// Writes to stderr, suspending our progress bars while it does.
#[derive(Clone)]
pub struct SafeStderrWriter {
    ui: Ui,
}

impl io::Write for SafeStderrWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ui.multi_progress.suspend(|| io::stderr().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.ui.multi_progress.suspend(|| io::stderr().flush())
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.ui.multi_progress.suspend(|| io::stderr().write_all(buf))
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SafeStderrWriter {
    type Writer = SafeStderrWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
