//! GitHub releases through the `gh` command-line tool
//!
//! Every call is one `gh release ...` subprocess with `--repo owner/repo`, so
//! relman works from any directory and never depends on the current checkout.

use crate::core::error::{GatewayError, RelmanError, RelmanResult, ResultExt};
use crate::core::gateway::{ReleaseGateway, RemoteAsset};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Output};

/// `gh` backed gateway for one repository
pub struct GhCli {
  /// Executable to run (`gh` unless overridden)
  bin: OsString,

  /// `owner/repo`
  repo: String,

  /// Upper bound passed to `gh release list --limit`
  release_limit: u32,
}

#[derive(Deserialize)]
struct AssetsPayload {
  #[serde(default)]
  assets: Vec<RemoteAsset>,
}

impl GhCli {
  pub fn new(bin: impl Into<OsString>, repo: impl Into<String>, release_limit: u32) -> Self {
    Self {
      bin: bin.into(),
      repo: repo.into(),
      release_limit,
    }
  }

  /// Create a `gh` command with prompts, colors and update checks disabled
  ///
  /// The caller's environment is kept: `gh` reads its credentials from it.
  fn gh_cmd(&self) -> Command {
    let mut cmd = Command::new(&self.bin);
    cmd.env("GH_PROMPT_DISABLED", "1");
    cmd.env("GH_NO_UPDATE_NOTIFIER", "1");
    cmd.env("NO_COLOR", "1");
    cmd
  }

  fn command_line(&self, args: &[String]) -> String {
    let mut line = self.bin.to_string_lossy().into_owned();
    for arg in args {
      line.push(' ');
      if arg.contains(char::is_whitespace) || arg.is_empty() {
        line.push_str(&format!("{:?}", arg));
      } else {
        line.push_str(arg);
      }
    }
    line
  }

  /// Run `gh` and capture its output without judging the exit status
  fn exec(&self, args: &[String]) -> RelmanResult<Output> {
    self.gh_cmd().args(args).output().map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        RelmanError::with_help(
          format!("Release tool '{}' not found", self.bin.to_string_lossy()),
          "Install the GitHub CLI (https://cli.github.com) or point RELMAN_GH / `gh` in relman.toml at it.",
        )
      } else {
        RelmanError::from(e).context(format!("Failed to execute {}", self.command_line(args)))
      }
    })
  }

  /// Run `gh`, failing with a [`GatewayError`] on a non-zero exit
  fn run(&self, args: Vec<String>, context: impl FnOnce() -> String) -> RelmanResult<Output> {
    let output = self.exec(&args)?;
    if !output.status.success() {
      return Err(RelmanError::Gateway(self.failure(&args, &output))).with_context(context);
    }
    Ok(output)
  }

  fn failure(&self, args: &[String], output: &Output) -> GatewayError {
    GatewayError {
      context: None,
      command: self.command_line(args),
      status: output.status.code(),
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
  }

  fn args<const N: usize>(&self, parts: [&str; N]) -> Vec<String> {
    let mut args: Vec<String> = parts.iter().map(|s| s.to_string()).collect();
    args.push("--repo".to_string());
    args.push(self.repo.clone());
    args
  }
}

impl ReleaseGateway for GhCli {
  fn repo(&self) -> &str {
    &self.repo
  }

  fn release_exists(&self, tag: &str) -> RelmanResult<bool> {
    let args = self.args(["release", "view", tag]);
    let output = self.exec(&args)?;
    if output.status.success() {
      return Ok(true);
    }

    let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
    if stderr.contains("not found") {
      return Ok(false);
    }

    Err(RelmanError::Gateway(self.failure(&args, &output))).context(format!("Failed to look up release {}", tag))
  }

  fn create_release(&self, tag: &str, title: &str, notes: &str) -> RelmanResult<()> {
    let args = self.args(["release", "create", tag, "--title", title, "--notes", notes]);
    self.run(args, || format!("Failed to create release {} on {}", tag, self.repo))?;
    Ok(())
  }

  fn upload_assets(&self, tag: &str, files: &[PathBuf]) -> RelmanResult<()> {
    if files.is_empty() {
      return Ok(());
    }

    let mut args = vec!["release".to_string(), "upload".to_string(), tag.to_string()];
    args.extend(files.iter().map(|f| f.to_string_lossy().into_owned()));
    args.extend(["--repo".to_string(), self.repo.clone(), "--clobber".to_string()]);
    self.run(args, || format!("Failed to upload {} file(s) to {}", files.len(), tag))?;
    Ok(())
  }

  fn list_releases(&self) -> RelmanResult<Vec<String>> {
    let limit = self.release_limit.to_string();
    let args = self.args(["release", "list", "--limit", &limit]);
    let output = self.run(args, || format!("Failed to list releases of {}", self.repo))?;
    let stdout = String::from_utf8(output.stdout)?;
    Ok(parse_release_list(&stdout))
  }

  fn list_assets(&self, tag: &str) -> RelmanResult<Vec<RemoteAsset>> {
    let args = self.args(["release", "view", tag, "--json", "assets"]);
    let output = self.run(args, || format!("Failed to list assets of {}", tag))?;
    let payload: AssetsPayload =
      serde_json::from_slice(&output.stdout).context(format!("Unexpected asset listing for {}", tag))?;
    Ok(payload.assets)
  }

  fn delete_asset(&self, tag: &str, name: &str) -> RelmanResult<()> {
    let args = self.args(["release", "delete-asset", tag, name, "--yes"]);
    self.run(args, || format!("Failed to delete asset {} from {}", name, tag))?;
    Ok(())
  }

  fn delete_release(&self, tag: &str, cleanup_tag: bool) -> RelmanResult<()> {
    let mut args = self.args(["release", "delete", tag, "--yes"]);
    if cleanup_tag {
      args.push("--cleanup-tag".to_string());
    }
    self.run(args, || format!("Failed to delete release {}", tag))?;
    Ok(())
  }
}

/// Extract tags from `gh release list` output
///
/// Non-interactive output is tab separated: title, type, tag, published.
/// Lines with fewer than three columns are skipped.
fn parse_release_list(stdout: &str) -> Vec<String> {
  stdout
    .lines()
    .filter_map(|line| {
      let columns: Vec<&str> = line.split('\t').collect();
      if columns.len() < 3 {
        return None;
      }
      let tag = columns[2].trim();
      (!tag.is_empty()).then(|| tag.to_string())
    })
    .collect()
}
