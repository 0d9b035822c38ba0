//! Cleanup command implementation
//!
//! snapshot (list releases, list assets of kept ones) → plan → show →
//! confirm → delete releases → delete assets

use crate::commands::app_key;
use crate::core::context::ReleaseContext;
use crate::core::error::RelmanResult;
use crate::core::gateway::ReleaseGateway;
use crate::core::plan::{CleanupPlan, Operation};
use crate::manifest::Manifest;
use crate::release::reconcile::ReleaseVerdict;
use crate::release::{Reconciler, RemoteRelease};
use crate::ui::progress::OperationProgress;
use crate::ui::prompt::prompt_bool;
use std::io::IsTerminal;

/// Resolved cleanup flags
#[derive(Debug, Clone)]
pub struct CleanupOptions {
  pub app: Option<String>,
  /// Skip the confirmation prompt
  pub yes: bool,
  /// Delete git tags together with releases
  pub cleanup_tag: bool,
  /// Inspect assets of kept releases
  pub cleanup_assets: bool,
  /// Print the plan as JSON and stop
  pub json: bool,
}

/// What a cleanup run ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
  NothingToDo,
  PlanOnly,
  Cancelled,
  Executed { releases: usize, assets: usize },
}

/// Run the cleanup command
pub fn run_cleanup(ctx: &ReleaseContext, options: CleanupOptions) -> RelmanResult<()> {
  let manifest = ctx.load_manifest()?;
  let app = manifest.find_app(&app_key(ctx, options.app.clone())?)?;
  let gateway = ctx.gateway(&app.github);

  cleanup_app(&manifest, gateway.as_ref(), &options, ctx.dry_run)?;
  Ok(())
}

/// Plan and (after confirmation) execute cleanup of one repository
///
/// The manifest is the whole document: a base tag referenced by any app
/// counts as valid.
pub fn cleanup_app(
  manifest: &Manifest,
  gateway: &dyn ReleaseGateway,
  options: &CleanupOptions,
  dry_run: bool,
) -> RelmanResult<CleanupOutcome> {
  let plan = build_plan(manifest, gateway, options.cleanup_assets)?;

  if options.json {
    println!("{}", plan.to_json()?);
    return Ok(CleanupOutcome::PlanOnly);
  }

  if plan.is_empty() {
    println!("✅ Nothing to clean up in {}", plan.repo);
    return Ok(CleanupOutcome::NothingToDo);
  }

  print!("{}", plan.to_human_readable());
  println!();

  let releases = plan.releases_to_delete().len();
  let assets = plan.assets_to_delete().len();

  if !options.yes && !dry_run {
    let question = format!("Delete {} release(s) and {} asset(s) from {}?", releases, assets, plan.repo);
    if !prompt_bool(&question, false)? {
      println!("Cancelled");
      return Ok(CleanupOutcome::Cancelled);
    }
  }

  execute_plan(&plan, gateway, options.cleanup_tag, !dry_run && std::io::stderr().is_terminal())?;
  println!("✅ Cleanup of {} complete", plan.repo);
  Ok(CleanupOutcome::Executed { releases, assets })
}

/// Snapshot the remote and reconcile it against the manifest
///
/// Assets are only listed for releases that survive rules 1-3.
pub fn build_plan(manifest: &Manifest, gateway: &dyn ReleaseGateway, include_assets: bool) -> RelmanResult<CleanupPlan> {
  let valid_tags = manifest.valid_base_tags();
  let allowed_assets = manifest.allowed_assets();
  let reconciler = Reconciler::new(&valid_tags, &allowed_assets);

  let mut snapshot = Vec::new();
  for tag in gateway.list_releases()? {
    let tag = tag.trim();
    if tag.is_empty() {
      continue;
    }

    let assets = match reconciler.classify_release(tag) {
      ReleaseVerdict::Keep { .. } if include_assets => Some(
        gateway
          .list_assets(tag)?
          .into_iter()
          .map(|asset| asset.name)
          .collect(),
      ),
      _ => None,
    };
    snapshot.push(RemoteRelease::new(tag, assets));
  }

  Ok(reconciler.plan(gateway.repo(), &snapshot))
}

/// Execute a plan in order; the first failure aborts
pub fn execute_plan(
  plan: &CleanupPlan,
  gateway: &dyn ReleaseGateway,
  cleanup_tag: bool,
  show_progress: bool,
) -> RelmanResult<()> {
  let mut progress = show_progress.then(|| OperationProgress::new(plan.len(), format!("Cleaning {}", plan.repo)));

  for op in &plan.operations {
    match op {
      Operation::DeleteRelease { tag, .. } => gateway.delete_release(tag, cleanup_tag)?,
      Operation::DeleteAsset { tag, name } => gateway.delete_asset(tag, name)?,
    }
    if let Some(progress) = progress.as_mut() {
      progress.inc();
    }
  }

  Ok(())
}
