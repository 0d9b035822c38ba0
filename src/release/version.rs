//! Version, tag and asset-name grammar
//!
//! Every string relman classifies goes through one of the named patterns
//! below. Versions look like `1.2.0-beta.3` (or `1.2.0.beta.3`), release tags
//! like `v1.2.0.beta` (or `v1.2.0-beta`), managed assets like
//! `boochat-beta.3.apk`.

use crate::core::error::{InputError, RelmanResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// `1.0.0-alpha`, `v1.0.0.alpha.2`; index optional
static VERSION_INPUT: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"^v?(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)[.-](?P<stage>alpha|beta|rc|pre|release)(?:[.-](?P<index>\d+))?$",
  )
  .expect("version input pattern")
});

/// `v1.0.0.alpha`, `v1.0.0-alpha`
static BASE_TAG: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^v(?P<semver>\d+\.\d+\.\d+)(?P<sep>[.-])(?P<stage>alpha|beta|rc|pre|release)$").expect("base tag pattern")
});

/// `v1.0.0-alpha.2`, `v1.0.0.alpha.2` (legacy, index must not be in a tag)
static INDEXED_TAG: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^v(?P<semver>\d+\.\d+\.\d+)[.-](?P<stage>alpha|beta|rc|pre|release)[.-]\d+$")
    .expect("indexed tag pattern")
});

/// `{app}-{stage}.{index}.{apk|ipa}`
static MANAGED_ASSET: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?P<app>.+)-(?P<stage>alpha|beta|rc|pre|release)\.(?P<index>\d+)\.(?P<ext>apk|ipa)$")
    .expect("managed asset pattern")
});

/// Release maturity stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
  Alpha,
  Beta,
  Rc,
  Pre,
  Release,
}

impl Stage {
  pub const ALL: [Stage; 5] = [Stage::Alpha, Stage::Beta, Stage::Rc, Stage::Pre, Stage::Release];

  pub fn as_str(self) -> &'static str {
    match self {
      Stage::Alpha => "alpha",
      Stage::Beta => "beta",
      Stage::Rc => "rc",
      Stage::Pre => "pre",
      Stage::Release => "release",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Stage {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Stage::ALL
      .into_iter()
      .find(|stage| stage.as_str() == s)
      .ok_or_else(|| format!("unknown stage '{}'", s))
  }
}

/// Punctuation between semver and stage in a base tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TagStyle {
  /// `v1.0.0.alpha`
  #[default]
  Dot,
  /// `v1.0.0-alpha`
  Dash,
}

impl TagStyle {
  pub fn separator(self) -> char {
    match self {
      TagStyle::Dot => '.',
      TagStyle::Dash => '-',
    }
  }

  pub fn other(self) -> TagStyle {
    match self {
      TagStyle::Dot => TagStyle::Dash,
      TagStyle::Dash => TagStyle::Dot,
    }
  }

  /// Style of a canonical base tag, `None` for anything else
  pub fn of_base_tag(tag: &str) -> Option<TagStyle> {
    let caps = BASE_TAG.captures(tag)?;
    match &caps["sep"] {
      "-" => Some(TagStyle::Dash),
      _ => Some(TagStyle::Dot),
    }
  }
}

impl fmt::Display for TagStyle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TagStyle::Dot => f.write_str("dot"),
      TagStyle::Dash => f.write_str("dash"),
    }
  }
}

/// Build target an artifact belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
  Android,
  Ios,
}

impl Platform {
  pub fn extension(self) -> &'static str {
    match self {
      Platform::Android => "apk",
      Platform::Ios => "ipa",
    }
  }

  /// Platform for a file extension (case-insensitive)
  pub fn from_extension(ext: &str) -> Option<Platform> {
    match ext.to_ascii_lowercase().as_str() {
      "apk" => Some(Platform::Android),
      "ipa" => Some(Platform::Ios),
      _ => None,
    }
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Platform::Android => f.write_str("android"),
      Platform::Ios => f.write_str("ios"),
    }
  }
}

/// A version as typed by the user; the index may still be unassigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInput {
  pub semver: semver::Version,
  pub stage: Stage,
  pub index: Option<u32>,
}

impl VersionInput {
  /// Complete the version with an index and tag style
  pub fn with_index(self, index: u32, tag_style: TagStyle) -> Version {
    Version {
      semver: self.semver,
      stage: self.stage,
      index,
      tag_style,
    }
  }
}

/// Parse `X.Y.Z[.-]stage[[.-]N]`, optionally prefixed with `v`
pub fn parse_version(raw: &str) -> RelmanResult<VersionInput> {
  let invalid = || InputError::InvalidVersionFormat { raw: raw.to_string() };
  let caps = VERSION_INPUT.captures(raw.trim()).ok_or_else(invalid)?;

  let number = |name: &str| caps[name].parse::<u64>().map_err(|_| invalid());
  let semver = semver::Version::new(number("major")?, number("minor")?, number("patch")?);
  let stage = caps["stage"].parse::<Stage>().map_err(|_| invalid())?;
  let index = match caps.name("index") {
    Some(m) => Some(m.as_str().parse::<u32>().map_err(|_| invalid())?),
    None => None,
  };

  Ok(VersionInput { semver, stage, index })
}

/// A fully resolved version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
  pub semver: semver::Version,
  pub stage: Stage,
  pub index: u32,
  pub tag_style: TagStyle,
}

impl Version {
  /// Parse a manifest `version` field; the index is mandatory here
  pub fn parse_full(raw: &str) -> Option<Version> {
    let input = parse_version(raw).ok()?;
    let index = input.index?;
    Some(input.with_index(index, TagStyle::default()))
  }

  /// Canonical manifest form, `1.0.0-alpha.2`
  pub fn version_str(&self) -> String {
    format!("{}-{}.{}", self.semver, self.stage, self.index)
  }

  /// Release tag in this version's own style
  pub fn base_tag(&self) -> String {
    base_tag(&self.semver, self.stage, self.tag_style)
  }

  /// Both punctuations of the base tag, own style first
  pub fn candidate_base_tags(&self) -> [String; 2] {
    [
      base_tag(&self.semver, self.stage, self.tag_style),
      base_tag(&self.semver, self.stage, self.tag_style.other()),
    ]
  }

  /// Managed asset file name for a platform
  pub fn asset_name(&self, app_id: &str, platform: Platform) -> String {
    expected_asset(app_id, self.stage, self.index, platform)
  }

  /// Same (semver, stage, index) regardless of tag style
  pub fn same_release(&self, other: &Version) -> bool {
    self.semver == other.semver && self.stage == other.stage && self.index == other.index
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.version_str())
  }
}

fn base_tag(semver: &semver::Version, stage: Stage, style: TagStyle) -> String {
  format!("v{}{}{}", semver, style.separator(), stage)
}

/// Canonical managed asset name: `{app_id}-{stage}.{index}.{apk|ipa}`
pub fn expected_asset(app_id: &str, stage: Stage, index: u32, platform: Platform) -> String {
  format!("{}-{}.{}.{}", app_id, stage, index, platform.extension())
}

/// Next index for a (semver, stage): one past the highest existing, or 1
pub fn next_index(input: &VersionInput, existing: &[u32]) -> RelmanResult<u32> {
  match existing.iter().max() {
    None => Ok(1),
    Some(max) => max.checked_add(1).ok_or_else(|| {
      InputError::IndexExhausted {
        version: format!("{}-{}", input.semver, input.stage),
      }
      .into()
    }),
  }
}

/// Reduce a tag to its base form
///
/// Index-bearing tags lose the index and come back dot-style. Tags that are
/// already base tags keep their punctuation and only gain a leading `v`.
/// Anything else is returned unchanged.
pub fn normalize_base_tag(tag: &str) -> String {
  let trimmed = tag.trim();
  let prefixed = if trimmed.starts_with('v') {
    trimmed.to_string()
  } else {
    format!("v{}", trimmed)
  };

  if BASE_TAG.is_match(&prefixed) {
    return prefixed;
  }

  if let Some(caps) = INDEXED_TAG.captures(&prefixed) {
    return format!("v{}.{}", &caps["semver"], &caps["stage"]);
  }

  tag.to_string()
}

/// How a remote release tag relates to the release grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagForm {
  /// `v1.0.0.alpha` / `v1.0.0-alpha`
  Base,
  /// `v1.0.0-alpha.2`; carries the base tag it should have been
  Indexed { canonical: String },
  /// Not a release tag relman manages
  Foreign,
}

pub fn classify_tag(tag: &str) -> TagForm {
  if BASE_TAG.is_match(tag) {
    TagForm::Base
  } else if INDEXED_TAG.is_match(tag) {
    TagForm::Indexed {
      canonical: normalize_base_tag(tag),
    }
  } else {
    TagForm::Foreign
  }
}

/// Whether an asset name follows the managed naming grammar
pub fn is_managed_asset(name: &str) -> bool {
  MANAGED_ASSET.is_match(name)
}
