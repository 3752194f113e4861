use colored::*;
use std::io::Write;

/// Receives fractional progress; `fraction` is the completed share of the
/// batch in `0.0..=1.0`.
pub trait ProgressSink {
    fn report(&mut self, fraction: f64, message: &str);
}

/// Accumulates `1 / total` per finished image and forwards it to a sink.
pub struct ProgressTracker<'a> {
    sink: &'a mut dyn ProgressSink,
    step: f64,
    completed: f64,
}

impl<'a> ProgressTracker<'a> {
    /// `total` must be non-zero; an empty batch never builds a tracker.
    pub fn new(sink: &'a mut dyn ProgressSink, total: usize) -> Self {
        Self {
            sink,
            step: 1.0 / total.max(1) as f64,
            completed: 0.0,
        }
    }

    pub fn advance(&mut self, message: &str) {
        self.completed = (self.completed + self.step).min(1.0);
        self.sink.report(self.completed, message);
    }

    pub fn completed(&self) -> f64 {
        self.completed
    }
}

/// Single-line terminal progress.
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn report(&mut self, fraction: f64, message: &str) {
        print!("\r{} {:>3.0}% {}", "Converting".yellow(), fraction * 100.0, message);
        if fraction >= 1.0 {
            println!();
        }
        let _ = std::io::stdout().flush();
    }
}

/// Discards progress.
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _fraction: f64, _message: &str) {}
}
