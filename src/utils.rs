//! File helpers for publishing: glob expansion, platform buckets, renames

use crate::core::error::{InputError, RelmanError, RelmanResult, ResultExt};
use crate::release::Platform;
use crate::ui;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Expand a leading `~` to the home directory
pub fn expand_home(pattern: &str) -> String {
  let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"));
  match (pattern, home) {
    ("~", Ok(home)) => home,
    (p, Ok(home)) if p.starts_with("~/") || p.starts_with("~\\") => format!("{}{}", home, &p[1..]),
    (p, _) => p.to_string(),
  }
}

/// Regular files matching a glob (`**` recurses), sorted and deduplicated
///
/// Paths are canonicalized where possible so two spellings of one file
/// collapse into one entry.
pub fn resolve_files(pattern: &str) -> RelmanResult<Vec<PathBuf>> {
  let expanded = expand_home(pattern.trim());
  let paths = glob::glob(&expanded).map_err(|e| {
    RelmanError::Input(InputError::InvalidGlob {
      pattern: pattern.to_string(),
      reason: e.msg.to_string(),
    })
  })?;

  let files: BTreeSet<PathBuf> = paths
    .filter_map(Result::ok)
    .filter(|path| path.is_file())
    .map(|path| fs::canonicalize(&path).unwrap_or(path))
    .collect();

  Ok(files.into_iter().collect())
}

/// Files split by target platform; other extensions are dropped
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlatformFiles {
  pub android: Vec<PathBuf>,
  pub ios: Vec<PathBuf>,
}

impl PlatformFiles {
  pub fn classify(paths: impl IntoIterator<Item = PathBuf>) -> Self {
    let mut files = Self::default();
    for path in paths {
      let platform = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(Platform::from_extension);
      match platform {
        Some(Platform::Android) => files.android.push(path),
        Some(Platform::Ios) => files.ios.push(path),
        None => {}
      }
    }
    files
  }

  pub fn is_empty(&self) -> bool {
    self.android.is_empty() && self.ios.is_empty()
  }

  pub fn get(&self, platform: Platform) -> &[PathBuf] {
    match platform {
      Platform::Android => &self.android,
      Platform::Ios => &self.ios,
    }
  }
}

/// Rename `path` to `name` within its directory
///
/// A file already carrying the name is left alone. Another file occupying the
/// name is an error; nothing is ever overwritten.
pub fn rename_to(path: &Path, name: &str, dry_run: bool) -> RelmanResult<PathBuf> {
  let dest = path.with_file_name(name);
  if dest == path {
    return Ok(dest);
  }

  if dest.exists() {
    let same_file = match (fs::canonicalize(path), fs::canonicalize(&dest)) {
      (Ok(a), Ok(b)) => a == b,
      _ => false,
    };
    if same_file {
      return Ok(dest);
    }
    return Err(RelmanError::DestinationExists {
      source: path.to_path_buf(),
      dest,
    });
  }

  if dry_run {
    ui::dry_run(format!("rename {} -> {}", path.display(), dest.display()));
    return Ok(dest);
  }

  fs::rename(path, &dest).with_context(|| format!("Failed to rename {} to {}", path.display(), dest.display()))?;
  Ok(dest)
}
