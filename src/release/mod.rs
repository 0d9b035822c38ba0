//! Release grammar and reconciliation
//!
//! # Core Invariants
//!
//! 1. **A release tag never carries an index**
//!    - One release per (app version, stage): `v1.0.0.alpha`
//!    - Repeated builds of that stage are told apart by asset names:
//!      `boochat-alpha.1.apk`, `boochat-alpha.2.apk`
//!
//! 2. **Managed asset names are derivable**
//!    - `{app_id}-{stage}.{index}.{apk|ipa}`, nothing else is "ours"
//!
//! 3. **Only positively identified things are deleted**
//!    - Foreign tags and unmanaged attachments are never touched
//!
//! Both modules are pure; the commands layer feeds them manifest data and
//! gateway snapshots.

pub mod reconcile;
pub mod version;

pub use reconcile::{Reconciler, RemoteRelease};
pub use version::{Platform, TagStyle, Version};
