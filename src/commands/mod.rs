//! CLI commands for relman
//!
//! - **publish**: rename builds, create/reuse the release, upload, record the
//!   version in apps.json, then optionally clean up
//! - **cleanup**: delete releases and assets the manifest no longer references
//! - **normalize**: rewrite asset names and tags in apps.json to canonical form
//!
//! All commands accept `&ReleaseContext`; remote access goes through the
//! context's gateway so `--dry-run` applies everywhere.

pub mod cleanup;
pub mod normalize;
pub mod publish;

pub use cleanup::{CleanupOptions, run_cleanup};
pub use normalize::run_normalize;
pub use publish::{PublishOptions, run_publish};

use crate::core::context::ReleaseContext;
use crate::core::error::{InputError, RelmanError, RelmanResult};
use crate::ui::prompt::prompt;

/// App key from `--app`, asking (default: `default_app`) when it was not given
pub(crate) fn app_key(ctx: &ReleaseContext, app: Option<String>) -> RelmanResult<String> {
  let key = match app {
    Some(key) => key,
    None => prompt("App (id or name)", ctx.settings.default_app.as_deref())?,
  };
  if key.trim().is_empty() {
    return Err(missing("app"));
  }
  Ok(key)
}

/// A flag value, or the answer to `question` when the flag was omitted
pub(crate) fn required(value: Option<String>, question: &str, flag: &str) -> RelmanResult<String> {
  let value = match value {
    Some(value) => value,
    None => prompt(question, None)?,
  };
  if value.trim().is_empty() {
    return Err(missing(flag));
  }
  Ok(value)
}

fn missing(flag: &str) -> RelmanError {
  RelmanError::Input(InputError::MissingValue { what: flag.to_string() })
}
