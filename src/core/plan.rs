//! Reviewable cleanup plans
//!
//! Cleanup never deletes anything directly. The reconciliation engine
//! produces a `CleanupPlan`, the plan is shown to the user (or emitted as
//! JSON), and only a confirmed plan is executed.
//!
//! Each plan has an ID derived from its operations, so the plan printed by
//! `relman cleanup --json` can be matched with the one executed later.

use crate::core::error::RelmanResult;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Plan identifier (SHA256 hash of plan operations)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanId(String);

impl PlanId {
  /// Create a plan ID from plan contents
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Get the short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// Why a release is scheduled for deletion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DeleteReason {
  /// Tag embeds an index; the release should live under `canonical`
  IndexedTag { canonical: String },
  /// Base tag is not referenced by any manifest entry
  NotInManifest,
}

/// A single remote mutation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
  DeleteRelease {
    tag: String,
    #[serde(flatten)]
    reason: DeleteReason,
  },
  DeleteAsset {
    tag: String,
    name: String,
  },
}

/// Releases and assets to delete, release deletions first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupPlan {
  /// Plan ID (content hash)
  pub id: PlanId,

  /// `owner/repo` the plan targets
  pub repo: String,

  /// Operations to perform (in order)
  pub operations: Vec<Operation>,
}

impl CleanupPlan {
  /// Create a plan; release deletions are moved ahead of asset deletions
  pub fn new(repo: impl Into<String>, operations: Vec<Operation>) -> Self {
    let (mut ordered, assets): (Vec<_>, Vec<_>) = operations
      .into_iter()
      .partition(|op| matches!(op, Operation::DeleteRelease { .. }));
    ordered.extend(assets);

    let mut plan = Self {
      id: PlanId::from_contents(&[]),
      repo: repo.into(),
      operations: ordered,
    };
    plan.recompute_id();
    plan
  }

  /// Recompute plan ID based on current contents
  fn recompute_id(&mut self) {
    let json = serde_json::to_vec(&self.operations).unwrap_or_default();
    self.id = PlanId::from_contents(&json);
  }

  /// Tags of releases to delete, in execution order
  pub fn releases_to_delete(&self) -> Vec<&str> {
    self
      .operations
      .iter()
      .filter_map(|op| match op {
        Operation::DeleteRelease { tag, .. } => Some(tag.as_str()),
        Operation::DeleteAsset { .. } => None,
      })
      .collect()
  }

  /// `(tag, asset)` pairs to delete, in execution order
  pub fn assets_to_delete(&self) -> Vec<(&str, &str)> {
    self
      .operations
      .iter()
      .filter_map(|op| match op {
        Operation::DeleteAsset { tag, name } => Some((tag.as_str(), name.as_str())),
        Operation::DeleteRelease { .. } => None,
      })
      .collect()
  }

  /// Serialize to JSON
  pub fn to_json(&self) -> RelmanResult<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Get human-readable representation, grouped by reason
  pub fn to_human_readable(&self) -> String {
    let mut output = format!("📋 Cleanup plan for {} ({})\n", self.repo, self.id);

    let indexed: Vec<_> = self
      .operations
      .iter()
      .filter_map(|op| match op {
        Operation::DeleteRelease {
          tag,
          reason: DeleteReason::IndexedTag { canonical },
        } => Some((tag, canonical)),
        _ => None,
      })
      .collect();
    if !indexed.is_empty() {
      output.push_str("\n   Releases with an index in the tag (base tags must not carry one):\n");
      for (tag, canonical) in indexed {
        output.push_str(&format!("   - {} (should be {})\n", tag, canonical));
      }
    }

    let orphaned: Vec<_> = self
      .operations
      .iter()
      .filter_map(|op| match op {
        Operation::DeleteRelease {
          tag,
          reason: DeleteReason::NotInManifest,
        } => Some(tag),
        _ => None,
      })
      .collect();
    if !orphaned.is_empty() {
      output.push_str("\n   Releases whose base tag is not in the manifest:\n");
      for tag in orphaned {
        output.push_str(&format!("   - {}\n", tag));
      }
    }

    let assets = self.assets_to_delete();
    if !assets.is_empty() {
      output.push_str("\n   Assets with no matching manifest version:\n");
      for (tag, name) in assets {
        output.push_str(&format!("   - {}: {}\n", tag, name));
      }
    }

    output
  }

  /// Get number of operations
  pub fn len(&self) -> usize {
    self.operations.len()
  }

  /// Check if plan is empty
  pub fn is_empty(&self) -> bool {
    self.operations.is_empty()
  }
}
