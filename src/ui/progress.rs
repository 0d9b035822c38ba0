//! Progress indicators for multi-step remote operations
//!
//! Uses `linya`; bars draw to stderr so stdout stays clean for `--json`.

use linya::{Bar, Progress};

/// Single progress bar for a sequence of remote deletions
pub struct OperationProgress {
  progress: Progress,
  bar: Bar,
}

impl OperationProgress {
  /// Create a new progress bar for `total` operations
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
