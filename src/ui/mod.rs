//! Terminal output: status lines, prompts and progress bars
//!
//! Status goes to stdout, errors to stderr (see `core::error::print_error`).

pub mod progress;
pub mod prompt;

use std::fmt::Display;

/// Report a mutation that dry-run mode skipped
pub fn dry_run(action: impl Display) {
  println!("[dry-run] {}", action);
}
