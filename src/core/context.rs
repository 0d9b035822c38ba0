//! Run context - resolved once in main.rs, passed to every command
//!
//! ```text
//! main.rs:
//!   ReleaseContext::build(cwd, --manifest, --dry-run) -> &ReleaseContext
//!   |
//!   v
//! commands/publish.rs, cleanup.rs, normalize.rs:
//!   fn run_*(ctx: &ReleaseContext, ...)
//! ```

use crate::core::config::Settings;
use crate::core::error::RelmanResult;
use crate::core::gateway::{DryRun, GhCli, ReleaseGateway};
use crate::manifest::{GithubRepo, Manifest};
use crate::utils::expand_home;
use std::path::{Path, PathBuf};

/// Settings, manifest location and mode of one relman invocation
pub struct ReleaseContext {
  /// relman.toml contents (defaults when absent)
  pub settings: Settings,

  /// Resolved apps.json path
  pub manifest_path: PathBuf,

  /// Describe mutations instead of performing them
  pub dry_run: bool,
}

impl ReleaseContext {
  /// Load settings under `root` and resolve the manifest path
  ///
  /// `--manifest` wins over the `manifest` setting.
  pub fn build(root: &Path, manifest_override: Option<PathBuf>, dry_run: bool) -> RelmanResult<Self> {
    let (settings, _) = Settings::load(root)?;
    Ok(Self::with_settings(root, settings, manifest_override, dry_run))
  }

  /// Relative manifest paths are resolved against `root`
  pub fn with_settings(root: &Path, settings: Settings, manifest_override: Option<PathBuf>, dry_run: bool) -> Self {
    let manifest = manifest_override.unwrap_or_else(|| settings.manifest.clone());
    let manifest = PathBuf::from(expand_home(&manifest.to_string_lossy()));
    let manifest_path = if manifest.is_absolute() {
      manifest
    } else {
      root.join(manifest)
    };

    Self {
      settings,
      manifest_path,
      dry_run,
    }
  }

  pub fn load_manifest(&self) -> RelmanResult<Manifest> {
    Manifest::load(&self.manifest_path)
  }

  pub fn save_manifest(&self, manifest: &Manifest) -> RelmanResult<()> {
    manifest.save(&self.manifest_path, self.dry_run)
  }

  /// Gateway for an app's repository, wrapped in [`DryRun`] when requested
  pub fn gateway(&self, github: &GithubRepo) -> Box<dyn ReleaseGateway> {
    let gh = GhCli::new(self.settings.gh_binary(), github.full_name(), self.settings.release_limit);
    if self.dry_run {
      Box::new(DryRun::new(gh))
    } else {
      Box::new(gh)
    }
  }
}
