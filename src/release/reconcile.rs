//! Reconciliation of remote releases against the manifest
//!
//! Given what the manifest references and a snapshot of what the remote
//! holds, decide what must be deleted. Rules, in precedence order:
//!
//! 1. Tags outside the release grammar are never touched.
//! 2. Tags with an index suffix (`v1.0.0-alpha.2`) are deleted.
//! 3. Base tags the manifest does not reference are deleted.
//! 4. On referenced releases, managed assets the manifest does not expect are
//!    deleted; unmanaged attachments are never touched.
//!
//! Everything here is pure: no gateway, no filesystem.

use crate::core::plan::{CleanupPlan, DeleteReason, Operation};
use crate::release::version::{TagForm, classify_tag, is_managed_asset, normalize_base_tag};
use std::collections::{BTreeMap, BTreeSet};

/// One remote release as seen by a cleanup run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRelease {
  pub tag: String,
  /// Attached asset names; `None` when assets were not inspected
  pub assets: Option<Vec<String>>,
}

impl RemoteRelease {
  pub fn new(tag: impl Into<String>, assets: Option<Vec<String>>) -> Self {
    Self {
      tag: tag.into(),
      assets,
    }
  }
}

/// Verdict for a single release tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseVerdict {
  /// Not managed by relman
  Ignore,
  /// Release must go
  Delete(DeleteReason),
  /// Referenced by the manifest; its assets are checked against `base`
  Keep { base: String },
}

/// Decides what to delete from manifest-derived sets
#[derive(Debug)]
pub struct Reconciler<'a> {
  valid_tags: &'a BTreeSet<String>,
  allowed_assets: &'a BTreeMap<String, BTreeSet<String>>,
}

impl<'a> Reconciler<'a> {
  pub fn new(valid_tags: &'a BTreeSet<String>, allowed_assets: &'a BTreeMap<String, BTreeSet<String>>) -> Self {
    Self {
      valid_tags,
      allowed_assets,
    }
  }

  /// Apply rules 1-3 to a tag
  pub fn classify_release(&self, tag: &str) -> ReleaseVerdict {
    match classify_tag(tag) {
      TagForm::Foreign => ReleaseVerdict::Ignore,
      TagForm::Indexed { canonical } => ReleaseVerdict::Delete(DeleteReason::IndexedTag { canonical }),
      TagForm::Base => {
        let base = normalize_base_tag(tag);
        if self.valid_tags.contains(&base) {
          ReleaseVerdict::Keep { base }
        } else {
          ReleaseVerdict::Delete(DeleteReason::NotInManifest)
        }
      }
    }
  }

  /// Apply rule 4 to one asset of a kept release
  pub fn is_orphaned_asset(&self, base: &str, name: &str) -> bool {
    if !is_managed_asset(name) {
      return false;
    }
    !self
      .allowed_assets
      .get(base)
      .is_some_and(|allowed| allowed.contains(name))
  }

  /// Build the cleanup plan for a snapshot
  ///
  /// Indexed-tag releases come first, then orphaned releases, then orphaned
  /// assets; each group keeps the snapshot order.
  pub fn plan(&self, repo: &str, snapshot: &[RemoteRelease]) -> CleanupPlan {
    let mut indexed = Vec::new();
    let mut orphaned = Vec::new();
    let mut assets = Vec::new();

    for release in snapshot {
      let tag = release.tag.trim();
      if tag.is_empty() {
        continue;
      }

      match self.classify_release(tag) {
        ReleaseVerdict::Ignore => {}
        ReleaseVerdict::Delete(reason @ DeleteReason::IndexedTag { .. }) => indexed.push(Operation::DeleteRelease {
          tag: tag.to_string(),
          reason,
        }),
        ReleaseVerdict::Delete(reason) => orphaned.push(Operation::DeleteRelease {
          tag: tag.to_string(),
          reason,
        }),
        ReleaseVerdict::Keep { base } => {
          for name in release.assets.iter().flatten() {
            let name = name.trim();
            if !name.is_empty() && self.is_orphaned_asset(&base, name) {
              assets.push(Operation::DeleteAsset {
                tag: tag.to_string(),
                name: name.to_string(),
              });
            }
          }
        }
      }
    }

    indexed.extend(orphaned);
    indexed.extend(assets);
    CleanupPlan::new(repo, indexed)
  }
}
