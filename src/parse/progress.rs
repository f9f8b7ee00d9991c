//! Progress reporting and cooperative cancellation for a parse pass.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{HumanBytes, ProgressBar, ProgressStyle};

/// Receives progress from a running parse.
///
/// The total amount of work is unknown up front, so a sink only sees a
/// `begin`, a pulse per record, and a final `done`. `done` is called on every
/// exit path, including errors and cancellation.
pub trait ProgressSink {
    fn begin(&mut self, task: &str);

    /// Called after each record with the running record count and the number
    /// of bytes consumed so far.
    fn pulse(&mut self, records: u64, offset: u64);

    fn done(&mut self);
}

/// Sink that ignores all progress.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn begin(&mut self, _task: &str) {}

    fn pulse(&mut self, _records: u64, _offset: u64) {}

    fn done(&mut self) {}
}

/// Terminal spinner showing records and bytes read.
pub struct SpinnerProgress {
    bar: ProgressBar,
    task: String,
}

/// Redraw the message every this many records.
const SPINNER_UPDATE_INTERVAL: u64 = 256;

impl SpinnerProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Failed to set progress bar template"),
        );
        Self {
            bar,
            task: String::new(),
        }
    }
}

impl Default for SpinnerProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for SpinnerProgress {
    fn begin(&mut self, task: &str) {
        self.task = task.to_string();
        self.bar.set_message(self.task.clone());
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn pulse(&mut self, records: u64, offset: u64) {
        if records % SPINNER_UPDATE_INTERVAL == 0 {
            self.bar.set_message(format!(
                "{}: {} records, {} read",
                self.task,
                records,
                HumanBytes(offset)
            ));
        }
    }

    fn done(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Calls `done` on the wrapped sink when dropped.
pub(crate) struct ProgressGuard<'a> {
    sink: &'a mut dyn ProgressSink,
}

impl<'a> ProgressGuard<'a> {
    pub(crate) fn begin(sink: &'a mut dyn ProgressSink, task: &str) -> Self {
        sink.begin(task);
        Self { sink }
    }

    pub(crate) fn pulse(&mut self, records: u64, offset: u64) {
        self.sink.pulse(records, offset);
    }
}

impl Drop for ProgressGuard<'_> {
    fn drop(&mut self) {
        self.sink.done();
    }
}

/// Shared flag asking a running parse to stop.
///
/// Checked once per record, so a cancel takes effect after at most one more
/// record is decoded.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl From<Arc<AtomicBool>> for CancellationToken {
    fn from(flag: Arc<AtomicBool>) -> Self {
        Self(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Events(Vec<String>);

    impl ProgressSink for Events {
        fn begin(&mut self, task: &str) {
            self.0.push(format!("begin {task}"));
        }

        fn pulse(&mut self, records: u64, _offset: u64) {
            self.0.push(format!("pulse {records}"));
        }

        fn done(&mut self) {
            self.0.push("done".to_string());
        }
    }

    #[test]
    fn test_guard_reports_done_on_drop() {
        let mut events = Events::default();
        {
            let mut guard = ProgressGuard::begin(&mut events, "parse");
            guard.pulse(1, 10);
        }
        assert_eq!(events.0, vec!["begin parse", "pulse 1", "done"]);
    }

    #[test]
    fn test_cancellation_visible_across_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        std::thread::spawn(move || token.cancel())
            .join()
            .unwrap();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_token_from_existing_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let token = CancellationToken::from(flag.clone());
        flag.store(true, Ordering::Relaxed);
        assert!(token.is_cancelled());
    }
}
