//! Remote release gateway
//!
//! The commands only ever talk to the release host through
//! [`ReleaseGateway`]. [`GhCli`] drives the `gh` command-line tool;
//! [`DryRun`] wraps any gateway, forwards the read-only calls and turns every
//! mutation into a printed `[dry-run]` line.

pub mod gh;
#[cfg(test)]
pub mod memory;

pub use gh::GhCli;

use crate::core::error::RelmanResult;
use crate::ui;
use serde::Deserialize;
use std::path::PathBuf;

/// An asset attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteAsset {
  pub name: String,
}

/// Operations relman needs from a release host, keyed by tag
pub trait ReleaseGateway {
  /// `owner/repo` this gateway targets
  fn repo(&self) -> &str;

  fn release_exists(&self, tag: &str) -> RelmanResult<bool>;

  fn create_release(&self, tag: &str, title: &str, notes: &str) -> RelmanResult<()>;

  /// Upload files; same-named assets are overwritten
  fn upload_assets(&self, tag: &str, files: &[PathBuf]) -> RelmanResult<()>;

  /// Tags of all releases
  fn list_releases(&self) -> RelmanResult<Vec<String>>;

  fn list_assets(&self, tag: &str) -> RelmanResult<Vec<RemoteAsset>>;

  fn delete_asset(&self, tag: &str, name: &str) -> RelmanResult<()>;

  /// Delete a release, optionally together with its git tag
  fn delete_release(&self, tag: &str, cleanup_tag: bool) -> RelmanResult<()>;
}

/// Gateway decorator that never mutates remote state
pub struct DryRun<G> {
  inner: G,
}

impl<G: ReleaseGateway> DryRun<G> {
  pub fn new(inner: G) -> Self {
    Self { inner }
  }
}

impl<G: ReleaseGateway> ReleaseGateway for DryRun<G> {
  fn repo(&self) -> &str {
    self.inner.repo()
  }

  fn release_exists(&self, tag: &str) -> RelmanResult<bool> {
    self.inner.release_exists(tag)
  }

  fn create_release(&self, tag: &str, title: &str, notes: &str) -> RelmanResult<()> {
    ui::dry_run(format!(
      "create release {} on {} (title: {:?}, notes: {} chars)",
      tag,
      self.repo(),
      title,
      notes.chars().count()
    ));
    Ok(())
  }

  fn upload_assets(&self, tag: &str, files: &[PathBuf]) -> RelmanResult<()> {
    for file in files {
      ui::dry_run(format!("upload {} to {} on {}", file.display(), tag, self.repo()));
    }
    Ok(())
  }

  fn list_releases(&self) -> RelmanResult<Vec<String>> {
    self.inner.list_releases()
  }

  fn list_assets(&self, tag: &str) -> RelmanResult<Vec<RemoteAsset>> {
    self.inner.list_assets(tag)
  }

  fn delete_asset(&self, tag: &str, name: &str) -> RelmanResult<()> {
    ui::dry_run(format!("delete asset {} from {} on {}", name, tag, self.repo()));
    Ok(())
  }

  fn delete_release(&self, tag: &str, cleanup_tag: bool) -> RelmanResult<()> {
    let suffix = if cleanup_tag { " (and its git tag)" } else { "" };
    ui::dry_run(format!("delete release {}{} on {}", tag, suffix, self.repo()));
    Ok(())
  }
}

impl<G: ReleaseGateway + ?Sized> ReleaseGateway for &G {
  fn repo(&self) -> &str {
    (**self).repo()
  }

  fn release_exists(&self, tag: &str) -> RelmanResult<bool> {
    (**self).release_exists(tag)
  }

  fn create_release(&self, tag: &str, title: &str, notes: &str) -> RelmanResult<()> {
    (**self).create_release(tag, title, notes)
  }

  fn upload_assets(&self, tag: &str, files: &[PathBuf]) -> RelmanResult<()> {
    (**self).upload_assets(tag, files)
  }

  fn list_releases(&self) -> RelmanResult<Vec<String>> {
    (**self).list_releases()
  }

  fn list_assets(&self, tag: &str) -> RelmanResult<Vec<RemoteAsset>> {
    (**self).list_assets(tag)
  }

  fn delete_asset(&self, tag: &str, name: &str) -> RelmanResult<()> {
    (**self).delete_asset(tag, name)
  }

  fn delete_release(&self, tag: &str, cleanup_tag: bool) -> RelmanResult<()> {
    (**self).delete_release(tag, cleanup_tag)
  }
}
