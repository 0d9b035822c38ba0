//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Stand-in for `gh release ...`
///
/// Remote state lives in `$FAKE_GH_STATE`: `releases` holds one tag per line,
/// `assets/<tag>` one asset name per line. Every invocation is appended to
/// `calls.log` (newlines folded to spaces). `FAKE_GH_FAIL=<n>` makes every call exit with status n.
const FAKE_GH: &str = r#"#!/usr/bin/env bash
set -u
state="${FAKE_GH_STATE:?}"
line="$*"
echo "${line//$'\n'/ }" >> "$state/calls.log"
if [ -n "${FAKE_GH_FAIL:-}" ]; then
  echo "HTTP 500: simulated outage" >&2
  exit "$FAKE_GH_FAIL"
fi
[ "$1" = "release" ] || exit 2
sub="$2"
shift 2
case "$sub" in
  view)
    tag="$1"
    if ! grep -qxF -- "$tag" "$state/releases"; then
      echo "release not found" >&2
      exit 1
    fi
    json=""
    for arg in "$@"; do
      [ "$arg" = "--json" ] && json=1
    done
    if [ -n "$json" ]; then
      printf '{"assets":['
      sep=""
      if [ -f "$state/assets/$tag" ]; then
        while IFS= read -r name; do
          [ -n "$name" ] || continue
          printf '%s{"name":"%s","size":1}' "$sep" "$name"
          sep=","
        done < "$state/assets/$tag"
      fi
      printf ']}\n'
    fi
    ;;
  list)
    while IFS= read -r tag; do
      [ -n "$tag" ] || continue
      printf '%s\tLatest\t%s\t2025-01-01T00:00:00Z\n' "Release $tag" "$tag"
    done < "$state/releases"
    ;;
  create)
    echo "$1" >> "$state/releases"
    ;;
  upload)
    tag="$1"
    shift
    while [ $# -gt 0 ]; do
      case "$1" in
        --repo) shift 2 ;;
        --clobber) shift ;;
        *)
          name="$(basename "$1")"
          grep -qxF -- "$name" "$state/assets/$tag" 2>/dev/null || echo "$name" >> "$state/assets/$tag"
          shift
          ;;
      esac
    done
    ;;
  delete-asset)
    tag="$1"
    name="$2"
    grep -vxF -- "$name" "$state/assets/$tag" > "$state/tmp" || true
    mv "$state/tmp" "$state/assets/$tag"
    ;;
  delete)
    tag="$1"
    grep -vxF -- "$tag" "$state/releases" > "$state/tmp" || true
    mv "$state/tmp" "$state/releases"
    rm -f "$state/assets/$tag"
    ;;
  *)
    echo "unknown command $sub" >&2
    exit 2
    ;;
esac
"#;

/// Manifest with one app, one published alpha build
pub const APPS_JSON: &str = r#"{
  "apps": [
    {
      "id": "boochat",
      "name": "BooChat",
      "github": {
        "owner": "acme",
        "repo": "boochat-releases"
      },
      "versions": {
        "alpha": [
          {
            "version": "1.0.0-alpha.1",
            "date": "2025-01-01",
            "changelog": "First build",
            "android": {
              "tag": "v1.0.0.alpha",
              "asset": "boochat-alpha.1.apk"
            }
          }
        ]
      }
    }
  ]
}
"#;

/// A temporary working directory with apps.json and a fake remote
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
  state: PathBuf,
  gh: PathBuf,
}

impl TestWorkspace {
  /// Create a workspace holding [`APPS_JSON`] and an empty remote
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("work");
    let state = root.path().join("remote");
    std::fs::create_dir_all(&path)?;
    std::fs::create_dir_all(state.join("assets"))?;
    std::fs::write(state.join("releases"), "")?;
    std::fs::write(state.join("calls.log"), "")?;

    let gh = root.path().join("gh");
    std::fs::write(&gh, FAKE_GH)?;
    std::fs::set_permissions(&gh, std::fs::Permissions::from_mode(0o755))?;

    let ws = Self {
      _root: root,
      path,
      state,
      gh,
    };
    ws.write_file("apps.json", APPS_JSON)?;
    Ok(ws)
  }

  /// Put a release with assets on the fake remote
  pub fn add_release(&self, tag: &str, assets: &[&str]) -> Result<()> {
    let mut releases = std::fs::read_to_string(self.state.join("releases"))?;
    releases.push_str(tag);
    releases.push('\n');
    std::fs::write(self.state.join("releases"), releases)?;

    let mut listing = String::new();
    for asset in assets {
      listing.push_str(asset);
      listing.push('\n');
    }
    std::fs::write(self.state.join("assets").join(tag), listing)?;
    Ok(())
  }

  /// Release tags on the fake remote, in creation order
  pub fn releases(&self) -> Result<Vec<String>> {
    read_lines(&self.state.join("releases"))
  }

  /// Asset names of a release on the fake remote
  pub fn assets(&self, tag: &str) -> Result<Vec<String>> {
    let path = self.state.join("assets").join(tag);
    if !path.exists() {
      return Ok(Vec::new());
    }
    read_lines(&path)
  }

  /// Arguments of every fake gh invocation
  pub fn gh_calls(&self) -> Result<Vec<String>> {
    read_lines(&self.state.join("calls.log"))
  }

  /// Write a file relative to the workspace
  pub fn write_file(&self, rel: &str, content: &str) -> Result<PathBuf> {
    let path = self.path.join(rel);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, content)?;
    Ok(path)
  }

  /// Check if a file exists
  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  /// Read a file
  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }

  /// Parsed apps.json
  pub fn manifest(&self) -> Result<serde_json::Value> {
    Ok(serde_json::from_str(&self.read_file("apps.json")?)?)
  }

  fn command(&self, args: &[&str], envs: &[(&str, &str)]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_relman"));
    cmd
      .current_dir(&self.path)
      .args(["--manifest", "apps.json"])
      .args(args)
      .env("RELMAN_GH", &self.gh)
      .env("FAKE_GH_STATE", &self.state)
      .env_remove("FAKE_GH_FAIL");
    for (key, value) in envs {
      cmd.env(key, value);
    }
    cmd
  }

  /// Run relman and return its output whatever the exit status
  ///
  /// Retries when the freshly written fake gh is still busy (ETXTBSY) because
  /// another test thread forked while it was open for writing.
  pub fn run_raw(&self, args: &[&str], envs: &[(&str, &str)]) -> Result<Output> {
    let mut attempt = 0;
    loop {
      let output = self.command(args, envs).output().context("Failed to run relman")?;
      attempt += 1;
      if attempt < 3 && String::from_utf8_lossy(&output.stderr).contains("Text file busy") {
        std::thread::sleep(std::time::Duration::from_millis(50));
        continue;
      }
      return Ok(output);
    }
  }

  /// Run relman, failing unless it exits successfully
  pub fn run(&self, args: &[&str]) -> Result<Output> {
    let output = self.run_raw(args, &[])?;
    if !output.status.success() {
      anyhow::bail!(
        "relman command failed: relman {}\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
      );
    }
    Ok(output)
  }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
  Ok(
    std::fs::read_to_string(path)?
      .lines()
      .filter(|line| !line.is_empty())
      .map(String::from)
      .collect(),
  )
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).into_owned()
}
