//! Normalize command implementation

use crate::core::context::ReleaseContext;
use crate::core::error::RelmanResult;

/// Rewrite every platform asset/tag in apps.json to canonical form
///
/// The file is only written when something changed.
pub fn run_normalize(ctx: &ReleaseContext) -> RelmanResult<()> {
  let mut manifest = ctx.load_manifest()?;

  if !manifest.normalize_assets() {
    println!("✅ {} is already normalized", ctx.manifest_path.display());
    return Ok(());
  }

  ctx.save_manifest(&manifest)?;
  println!("✅ Normalized asset names and tags in {}", ctx.manifest_path.display());
  Ok(())
}
