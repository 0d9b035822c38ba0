//! Typed model of the `apps.json` version manifest
//!
//! ```json
//! {
//!   "apps": [
//!     {
//!       "id": "boochat",
//!       "name": "BooChat",
//!       "github": { "owner": "acme", "repo": "boochat-releases" },
//!       "versions": {
//!         "alpha": [
//!           {
//!             "version": "1.0.0-alpha.2",
//!             "date": "2025-01-15",
//!             "changelog": "...",
//!             "android": { "tag": "v1.0.0.alpha", "asset": "boochat-alpha.2.apk" },
//!             "ios": { "tag": "v1.0.0.alpha", "asset": "boochat-alpha.2.ipa", "testflight": true }
//!           }
//!         ]
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! Shape problems are reported once, at load time. Members the model does
//! not know are carried through untouched, and every object is written back
//! with its members in the order they were read, so a load/save cycle only
//! changes what an operation meant to change.

use crate::core::error::{ConfigError, RelmanError, RelmanResult, ResultExt};
use crate::release::version::{Platform, Stage, Version, expected_asset, normalize_base_tag};
use crate::ui;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::Path;

/// Root of `apps.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
  pub apps: Vec<App>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
  #[serde(skip)]
  order: KeyOrder,
}

/// One published app
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
  pub id: String,
  pub name: String,
  pub github: GithubRepo,
  /// Stage -> entries, most recent first
  #[serde(default)]
  pub versions: IndexMap<Stage, Vec<VersionEntry>>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
  #[serde(skip)]
  order: KeyOrder,
}

/// Where an app's releases live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubRepo {
  pub owner: String,
  pub repo: String,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
  #[serde(skip)]
  order: KeyOrder,
}

impl GithubRepo {
  /// `owner/repo`
  pub fn full_name(&self) -> String {
    format!("{}/{}", self.owner, self.repo)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionEntry {
  pub version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub changelog: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub android: Option<PlatformAsset>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ios: Option<PlatformAsset>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
  #[serde(skip)]
  order: KeyOrder,
}

impl VersionEntry {
  fn new(version: String) -> Self {
    Self {
      version,
      date: None,
      changelog: None,
      android: None,
      ios: None,
      extra: Map::new(),
      order: KeyOrder::default(),
    }
  }

  /// Parsed `version`, `None` for entries outside the canonical pattern
  pub fn parsed(&self) -> Option<Version> {
    Version::parse_full(&self.version)
  }

  pub fn platform(&self, platform: Platform) -> Option<&PlatformAsset> {
    match platform {
      Platform::Android => self.android.as_ref(),
      Platform::Ios => self.ios.as_ref(),
    }
  }

  fn platform_mut(&mut self, platform: Platform) -> &mut Option<PlatformAsset> {
    match platform {
      Platform::Android => &mut self.android,
      Platform::Ios => &mut self.ios,
    }
  }

  /// First non-empty platform tag, android before ios
  pub fn configured_tag(&self) -> Option<&str> {
    [Platform::Android, Platform::Ios]
      .into_iter()
      .filter_map(|p| self.platform(p))
      .map(|asset| asset.tag.trim())
      .find(|tag| !tag.is_empty())
  }
}

/// Release tag and asset name for one platform build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformAsset {
  pub tag: String,
  pub asset: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub testflight: Option<bool>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
  #[serde(skip)]
  order: KeyOrder,
}

impl PlatformAsset {
  fn new(tag: &str, asset: String, testflight: Option<bool>) -> Self {
    Self {
      tag: tag.to_string(),
      asset,
      testflight,
      extra: Map::new(),
      order: KeyOrder::default(),
    }
  }
}

/// Member order of a JSON object as it was read
///
/// Empty for objects relman created itself; those keep model order.
#[derive(Debug, Clone, Default)]
struct KeyOrder(Vec<String>);

impl KeyOrder {
  fn of(raw: &Value) -> Self {
    match raw.as_object() {
      Some(map) => Self(map.keys().cloned().collect()),
      None => Self::default(),
    }
  }

  fn contains(&self, key: &str) -> bool {
    self.0.iter().any(|k| k == key)
  }

  /// Put the members of `value` back in the recorded order
  ///
  /// A recorded member the model skipped (an explicit `null` read into
  /// `None`) is written back as `null`; members the model added go last.
  fn apply(&self, value: &mut Value) {
    let Value::Object(map) = value else {
      return;
    };
    if self.0.is_empty() {
      return;
    }

    let mut rest = std::mem::take(map);
    for key in &self.0 {
      let member = rest.shift_remove(key).unwrap_or(Value::Null);
      map.insert(key.clone(), member);
    }
    map.extend(rest);
  }
}

/// Elements of the array member `key`, none when it is absent
fn elements<'a>(raw: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
  raw.get(key).and_then(Value::as_array).into_iter().flatten()
}

fn elements_mut<'a>(value: &'a mut Value, key: &str) -> impl Iterator<Item = &'a mut Value> {
  value.get_mut(key).and_then(Value::as_array_mut).into_iter().flatten()
}

/// Fields written by one publish run
#[derive(Debug, Clone)]
pub struct VersionUpdate<'a> {
  pub version: &'a Version,
  /// Base tag of the release the assets were uploaded to
  pub base_tag: &'a str,
  pub date: String,
  pub changelog: String,
  pub android_asset: Option<String>,
  pub ios_asset: Option<String>,
  pub ios_testflight: Option<bool>,
}

impl Manifest {
  /// Load and validate `apps.json`
  pub fn load(path: &Path) -> RelmanResult<Self> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        return Err(RelmanError::Config(ConfigError::ManifestNotFound {
          path: path.to_path_buf(),
        }));
      }
      Err(e) => return Err(e.into()),
    };

    Self::from_json(&content).map_err(|detail| {
      RelmanError::Config(ConfigError::ManifestShape {
        path: path.to_path_buf(),
        detail,
      })
    })
  }

  /// Parse manifest text; the error is the shape problem description
  pub fn from_json(content: &str) -> Result<Self, String> {
    let mut manifest: Manifest = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let raw: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    manifest.record_order(&raw);
    Ok(manifest)
  }

  /// On-disk form: 2-space indentation, trailing newline, members in the
  /// order they were read
  pub fn to_json_string(&self) -> RelmanResult<String> {
    let mut value = serde_json::to_value(self)?;
    self.restore_order(&mut value);
    let mut content = serde_json::to_string_pretty(&value)?;
    if !content.ends_with('\n') {
      content.push('\n');
    }
    Ok(content)
  }

  /// Write the manifest (or describe the write in dry-run mode)
  pub fn save(&self, path: &Path, dry_run: bool) -> RelmanResult<()> {
    let content = self.to_json_string()?;
    if dry_run {
      ui::dry_run(format!("write manifest: {}", path.display()));
      return Ok(());
    }
    fs::write(path, content).with_context(|| format!("Failed to write manifest {}", path.display()))?;
    Ok(())
  }

  /// Position of the app whose id or name matches `key` (case-insensitive)
  pub fn app_index(&self, key: &str) -> RelmanResult<usize> {
    let wanted = key.trim().to_lowercase();
    self
      .apps
      .iter()
      .position(|app| app.id.trim().to_lowercase() == wanted || app.name.trim().to_lowercase() == wanted)
      .ok_or_else(|| {
        RelmanError::Config(ConfigError::AppNotFound {
          key: key.to_string(),
          available: self.apps.iter().map(|app| app.id.clone()).collect(),
        })
      })
  }

  pub fn find_app(&self, key: &str) -> RelmanResult<&App> {
    let index = self.app_index(key)?;
    Ok(&self.apps[index])
  }

  /// Every normalized base tag referenced by any app's platform objects
  pub fn valid_base_tags(&self) -> BTreeSet<String> {
    self
      .apps
      .iter()
      .flat_map(|app| app.entries())
      .flat_map(|(_, entry)| [entry.android.as_ref(), entry.ios.as_ref()])
      .flatten()
      .map(|asset| asset.tag.trim())
      .filter(|tag| !tag.is_empty())
      .map(normalize_base_tag)
      .collect()
  }

  /// Asset names each base tag is expected to hold
  ///
  /// Both the `.apk` and `.ipa` names are allowed for every parseable entry,
  /// whether or not that platform was published.
  pub fn allowed_assets(&self) -> BTreeMap<String, BTreeSet<String>> {
    let mut out: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for app in &self.apps {
      let app_id = app.id.trim();
      if app_id.is_empty() {
        continue;
      }

      for (_, entry) in app.entries() {
        let Some(version) = entry.parsed() else {
          continue;
        };
        let base = match entry.configured_tag() {
          Some(tag) => normalize_base_tag(tag),
          None => normalize_base_tag(&format!("v{}.{}", version.semver, version.stage)),
        };

        let names = out.entry(base).or_default();
        names.insert(expected_asset(app_id, version.stage, version.index, Platform::Android));
        names.insert(expected_asset(app_id, version.stage, version.index, Platform::Ios));
      }
    }

    out
  }

  /// Normalize every app; returns whether anything changed
  pub fn normalize_assets(&mut self) -> bool {
    let mut changed = false;
    for app in &mut self.apps {
      changed |= app.normalize_assets();
    }
    changed
  }

  fn record_order(&mut self, raw: &Value) {
    self.order = KeyOrder::of(raw);
    for (app, raw) in self.apps.iter_mut().zip(elements(raw, "apps")) {
      app.record_order(raw);
    }
  }

  fn restore_order(&self, value: &mut Value) {
    for (app, value) in self.apps.iter().zip(elements_mut(value, "apps")) {
      app.restore_order(value);
    }
    self.order.apply(value);
  }
}

impl App {
  /// All entries, stage by stage in manifest order
  pub fn entries(&self) -> impl Iterator<Item = (Stage, &VersionEntry)> {
    self
      .versions
      .iter()
      .flat_map(|(stage, entries)| entries.iter().map(move |entry| (*stage, entry)))
  }

  /// Indices already used for `semver` in `stage`
  pub fn existing_indices(&self, semver: &semver::Version, stage: Stage) -> Vec<u32> {
    self
      .versions
      .get(&stage)
      .into_iter()
      .flatten()
      .filter_map(VersionEntry::parsed)
      .filter(|v| &v.semver == semver && v.stage == stage)
      .map(|v| v.index)
      .collect()
  }

  /// Insert or update the entry for a version and move it to the front
  pub fn upsert_version(&mut self, update: VersionUpdate<'_>) {
    let version_str = update.version.version_str();
    let stage_list = self.versions.entry(update.version.stage).or_default();

    let found = stage_list.iter().position(|entry| {
      entry.version.trim() == version_str || entry.parsed().is_some_and(|v| v.same_release(update.version))
    });

    let mut entry = match found {
      Some(pos) => stage_list.remove(pos),
      None => VersionEntry::new(version_str.clone()),
    };
    entry.version = version_str;
    entry.date = Some(update.date);
    entry.changelog = Some(update.changelog);

    if let Some(asset) = update.android_asset {
      set_platform(&mut entry, Platform::Android, update.base_tag, asset, None);
    }
    if let Some(asset) = update.ios_asset {
      set_platform(&mut entry, Platform::Ios, update.base_tag, asset, update.ios_testflight);
    }

    stage_list.insert(0, entry);
  }

  /// Rewrite asset names and tags to their canonical forms
  pub fn normalize_assets(&mut self) -> bool {
    let app_id = self.id.trim().to_string();
    if app_id.is_empty() {
      return false;
    }

    let mut changed = false;
    for entry in self.versions.values_mut().flatten() {
      let Some(version) = entry.parsed() else {
        continue;
      };

      for platform in [Platform::Android, Platform::Ios] {
        let Some(asset) = entry.platform_mut(platform).as_mut() else {
          continue;
        };

        let want = expected_asset(&app_id, version.stage, version.index, platform);
        if asset.asset.trim() != want {
          asset.asset = want;
          changed = true;
        }

        let tag = asset.tag.trim();
        if !tag.is_empty() {
          let base = normalize_base_tag(tag);
          if base != tag {
            asset.tag = base;
            changed = true;
          }
        }
      }
    }

    changed
  }

  fn record_order(&mut self, raw: &Value) {
    self.order = KeyOrder::of(raw);
    if let Some(github) = raw.get("github") {
      self.github.order = KeyOrder::of(github);
    }
    for (stage, entries) in &mut self.versions {
      let Some(raw_entries) = raw.get("versions") else {
        continue;
      };
      for (entry, raw) in entries.iter_mut().zip(elements(raw_entries, stage.as_str())) {
        entry.record_order(raw);
      }
    }
  }

  fn restore_order(&self, value: &mut Value) {
    if let Some(github) = value.get_mut("github") {
      self.github.order.apply(github);
    }
    if let Some(versions) = value.get_mut("versions") {
      for (stage, entries) in &self.versions {
        for (entry, value) in entries.iter().zip(elements_mut(versions, stage.as_str())) {
          entry.restore_order(value);
        }
      }
    }
    self.order.apply(value);

    // an app read without `versions` gets one only once something is published
    if !self.order.0.is_empty()
      && !self.order.contains("versions")
      && self.versions.is_empty()
      && let Some(map) = value.as_object_mut()
    {
      map.shift_remove("versions");
    }
  }
}

impl VersionEntry {
  fn record_order(&mut self, raw: &Value) {
    self.order = KeyOrder::of(raw);
    for platform in [Platform::Android, Platform::Ios] {
      if let (Some(asset), Some(raw)) = (self.platform_mut(platform).as_mut(), raw.get(platform_key(platform))) {
        asset.order = KeyOrder::of(raw);
      }
    }
  }

  fn restore_order(&self, value: &mut Value) {
    for platform in [Platform::Android, Platform::Ios] {
      if let (Some(asset), Some(value)) = (self.platform(platform), value.get_mut(platform_key(platform))) {
        asset.order.apply(value);
      }
    }
    self.order.apply(value);
  }
}

fn platform_key(platform: Platform) -> &'static str {
  match platform {
    Platform::Android => "android",
    Platform::Ios => "ios",
  }
}

/// Replace a platform object wholesale; a re-publish drops its old members
fn set_platform(entry: &mut VersionEntry, platform: Platform, tag: &str, asset: String, testflight: Option<bool>) {
  *entry.platform_mut(platform) = Some(PlatformAsset::new(tag, asset, testflight));
}
