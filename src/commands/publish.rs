//! Publish command implementation
//!
//! resolve inputs → rename builds → find or create the base-tag release →
//! upload → record in apps.json → normalize → save → cleanup
//!
//! Everything that can be rejected locally (unknown app, bad version, no
//! files, occupied file names) is rejected before the first remote call.

use crate::commands::cleanup::{CleanupOptions, cleanup_app};
use crate::commands::{app_key, required};
use crate::core::context::ReleaseContext;
use crate::core::error::{InputError, RelmanError, RelmanResult};
use crate::core::gateway::ReleaseGateway;
use crate::manifest::{Manifest, VersionUpdate};
use crate::release::version::{VersionInput, next_index, parse_version};
use crate::release::{Platform, TagStyle, Version};
use crate::ui::prompt::{prompt, prompt_bool};
use crate::utils::{PlatformFiles, rename_to, resolve_files};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Resolved publish flags; `None` values are asked for interactively
#[derive(Debug, Clone)]
pub struct PublishOptions {
  pub app: Option<String>,
  pub version: Option<String>,
  pub files: Option<String>,
  pub notes: Option<String>,
  pub date: Option<String>,
  pub ios_testflight: Option<bool>,
  pub cleanup: bool,
  pub yes: bool,
  pub cleanup_tag: bool,
  pub cleanup_assets: bool,
  pub normalize: bool,
  pub tag_style: TagStyle,
}

/// Everything `publish` needs, already validated
#[derive(Debug, Clone)]
pub struct PublishRequest {
  pub app_index: usize,
  pub version: VersionInput,
  pub files: PlatformFiles,
  pub notes: String,
  pub date: String,
  pub ios_testflight: Option<bool>,
  pub tag_style: TagStyle,
}

/// Result of a publish run
#[derive(Debug, Clone)]
pub struct PublishReport {
  pub repo: String,
  pub version: Version,
  /// Release the assets went to
  pub base_tag: String,
  /// Whether the release had to be created
  pub created: bool,
  pub uploaded: Vec<PathBuf>,
}

/// Run the publish command
pub fn run_publish(ctx: &ReleaseContext, options: PublishOptions) -> RelmanResult<()> {
  let mut manifest = ctx.load_manifest()?;
  let app_index = manifest.app_index(&app_key(ctx, options.app)?)?;

  let raw_version = required(options.version, "Version (e.g. 1.0.0-alpha.2 or 1.0.0.beta)", "version")?;
  let version = parse_version(&raw_version)?;

  let pattern = required(options.files, "Files (glob, e.g. release/boochat/**/*.apk)", "files")?;
  let files = PlatformFiles::classify(resolve_files(&pattern)?);
  if files.is_empty() {
    return Err(RelmanError::Input(InputError::NoMatchingFiles { pattern }));
  }

  let notes = match options.notes {
    Some(notes) => notes,
    None => prompt("Release notes (\\n for a line break)", Some(""))?,
  };
  let notes = notes.replace("\\n", "\n");
  let date = resolve_date(options.date)?;

  let ios_testflight = if files.ios.is_empty() {
    None
  } else {
    match options.ios_testflight {
      Some(value) => Some(value),
      None => Some(prompt_bool("Submit the iOS build to TestFlight?", false)?),
    }
  };

  let request = PublishRequest {
    app_index,
    version,
    files,
    notes,
    date,
    ios_testflight,
    tag_style: options.tag_style,
  };

  let gateway = ctx.gateway(&manifest.apps[app_index].github);
  let report = publish(&mut manifest, &request, gateway.as_ref(), ctx.dry_run)?;

  let action = if report.created { "Created" } else { "Reused" };
  println!("📦 {} release {} on {}", action, report.base_tag, report.repo);
  for path in &report.uploaded {
    println!("   ⬆️  {}", path.display());
  }

  if options.normalize {
    manifest.normalize_assets();
  }
  ctx.save_manifest(&manifest)?;
  println!("📝 Recorded {} in {}", report.version, ctx.manifest_path.display());

  if options.cleanup {
    let cleanup = CleanupOptions {
      app: None,
      yes: options.yes,
      cleanup_tag: options.cleanup_tag,
      cleanup_assets: options.cleanup_assets,
      json: false,
    };
    cleanup_app(&manifest, gateway.as_ref(), &cleanup, ctx.dry_run)?;
  }

  println!("✅ Published {} {}", report.repo, report.base_tag);
  Ok(())
}

/// Rename, release, upload and record one version
///
/// The manifest is updated in memory only; saving is up to the caller.
pub fn publish(
  manifest: &mut Manifest,
  request: &PublishRequest,
  gateway: &dyn ReleaseGateway,
  dry_run: bool,
) -> RelmanResult<PublishReport> {
  let app = &manifest.apps[request.app_index];
  let app_id = app.id.trim().to_string();
  let app_name = match app.name.trim() {
    "" => app_id.clone(),
    name => name.to_string(),
  };

  let index = match request.version.index {
    Some(index) => index,
    None => next_index(&request.version, &app.existing_indices(&request.version.semver, request.version.stage))?,
  };
  let version = request.version.clone().with_index(index, request.tag_style);

  let renames = plan_renames(&request.files, &version, &app_id)?;
  let mut uploaded = Vec::with_capacity(renames.len());
  for (path, name) in &renames {
    uploaded.push(rename_to(path, name, dry_run)?);
  }

  let mut existing = None;
  for candidate in version.candidate_base_tags() {
    if gateway.release_exists(&candidate)? {
      existing = Some(candidate);
      break;
    }
  }

  let (base_tag, created) = match existing {
    Some(tag) => (tag, false),
    None => {
      let tag = version.base_tag();
      gateway.create_release(&tag, &format!("{} {}", app_name, tag), &request.notes)?;
      (tag, true)
    }
  };

  gateway.upload_assets(&base_tag, &uploaded)?;

  let android_asset = (!request.files.android.is_empty()).then(|| version.asset_name(&app_id, Platform::Android));
  let ios_asset = (!request.files.ios.is_empty()).then(|| version.asset_name(&app_id, Platform::Ios));
  let recorded = Version {
    tag_style: TagStyle::of_base_tag(&base_tag).unwrap_or(version.tag_style),
    ..version
  };

  manifest.apps[request.app_index].upsert_version(VersionUpdate {
    version: &recorded,
    base_tag: &base_tag,
    date: request.date.clone(),
    changelog: request.notes.clone(),
    android_asset,
    ios_asset,
    ios_testflight: request.ios_testflight,
  });

  Ok(PublishReport {
    repo: gateway.repo().to_string(),
    version: recorded,
    base_tag,
    created,
    uploaded,
  })
}

/// Pair each file with its canonical name, refusing clashes up front
///
/// Two builds of one platform in the same directory would both claim the
/// same name; so would a foreign file already sitting at the target.
fn plan_renames(files: &PlatformFiles, version: &Version, app_id: &str) -> RelmanResult<Vec<(PathBuf, String)>> {
  let mut renames = Vec::new();
  let mut claimed = BTreeSet::new();

  for platform in [Platform::Android, Platform::Ios] {
    let name = version.asset_name(app_id, platform);
    for path in files.get(platform) {
      let dest = path.with_file_name(&name);
      let occupied = dest != *path && dest.exists() && !same_file(path, &dest);
      if occupied || !claimed.insert(dest.clone()) {
        return Err(RelmanError::DestinationExists {
          source: path.clone(),
          dest,
        });
      }
      renames.push((path.clone(), name.clone()));
    }
  }

  Ok(renames)
}

fn same_file(a: &std::path::Path, b: &std::path::Path) -> bool {
  match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
    (Ok(a), Ok(b)) => a == b,
    _ => false,
  }
}

/// `--date`, validated as YYYY-MM-DD, or today's local date
fn resolve_date(date: Option<String>) -> RelmanResult<String> {
  match date {
    Some(raw) => {
      let trimmed = raw.trim();
      NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| RelmanError::Input(InputError::InvalidDate { raw }))
    }
    None => Ok(chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()),
  }
}
