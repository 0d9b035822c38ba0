use crate::core::error::{ConfigError, RelmanError, RelmanResult, ResultExt};
use crate::release::TagStyle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default manifest location, relative to the working directory
pub const DEFAULT_MANIFEST: &str = "app/config/apps.json";

/// Environment variable overriding the `gh` executable
pub const GH_ENV: &str = "RELMAN_GH";

/// Optional settings for relman
/// Searched in order: relman.toml, .relman.toml, .config/relman.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
  /// Manifest path, relative to the working directory
  #[serde(default = "default_manifest")]
  pub manifest: PathBuf,

  /// App offered as the default answer when `--app` is omitted
  #[serde(default)]
  pub default_app: Option<String>,

  /// Punctuation used when a new release has to be created
  #[serde(default)]
  pub tag_style: TagStyle,

  /// Release tool executable (default: `gh`)
  #[serde(default)]
  pub gh: Option<String>,

  /// Maximum number of releases fetched during cleanup
  #[serde(default = "default_release_limit")]
  pub release_limit: u32,

  #[serde(default)]
  pub defaults: CommandDefaults,
}

fn default_manifest() -> PathBuf {
  PathBuf::from(DEFAULT_MANIFEST)
}

fn default_release_limit() -> u32 {
  1000
}

fn default_true() -> bool {
  true
}

/// Fallbacks for the paired `--x` / `--no-x` flags
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandDefaults {
  /// Run cleanup after publish
  #[serde(default = "default_true")]
  pub cleanup: bool,

  /// Delete git tags together with releases
  #[serde(default = "default_true")]
  pub cleanup_tag: bool,

  /// Inspect and delete orphaned assets
  #[serde(default = "default_true")]
  pub cleanup_assets: bool,

  /// Normalize asset names before writing the manifest
  #[serde(default = "default_true")]
  pub normalize: bool,
}

impl Default for CommandDefaults {
  fn default() -> Self {
    Self {
      cleanup: true,
      cleanup_tag: true,
      cleanup_assets: true,
      normalize: true,
    }
  }
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      manifest: default_manifest(),
      default_app: None,
      tag_style: TagStyle::default(),
      gh: None,
      release_limit: default_release_limit(),
      defaults: CommandDefaults::default(),
    }
  }
}

impl Settings {
  /// Find settings file in search order
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("relman.toml"),
      path.join(".relman.toml"),
      path.join(".config").join("relman.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load settings found under `root`, or the defaults when there are none
  pub fn load(root: &Path) -> RelmanResult<(Self, Option<PathBuf>)> {
    let Some(config_path) = Self::find_config_path(root) else {
      return Ok((Self::default(), None));
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read settings from {}", config_path.display()))?;
    let settings = Self::parse(&content, &config_path)?;
    Ok((settings, Some(config_path)))
  }

  /// Parse and validate settings text
  pub fn parse(content: &str, config_path: &Path) -> RelmanResult<Self> {
    let settings: Settings = toml_edit::de::from_str(content).map_err(|e| {
      RelmanError::Config(ConfigError::SettingsInvalid {
        path: config_path.to_path_buf(),
        detail: e.to_string().trim().to_string(),
      })
    })?;
    settings.validate(config_path)?;
    Ok(settings)
  }

  fn validate(&self, config_path: &Path) -> RelmanResult<()> {
    let invalid = |detail: &str| -> RelmanResult<()> {
      Err(RelmanError::Config(ConfigError::SettingsInvalid {
        path: config_path.to_path_buf(),
        detail: detail.to_string(),
      }))
    };

    if self.manifest.as_os_str().is_empty() {
      return invalid("`manifest` must not be empty");
    }
    if self.release_limit == 0 {
      return invalid("`release_limit` must be at least 1");
    }
    if self.default_app.as_deref().is_some_and(|app| app.trim().is_empty()) {
      return invalid("`default_app` must not be blank");
    }
    if self.gh.as_deref().is_some_and(|gh| gh.trim().is_empty()) {
      return invalid("`gh` must not be blank");
    }
    Ok(())
  }

  /// Release tool executable: `RELMAN_GH`, then `gh` setting, then `gh`
  pub fn gh_binary(&self) -> String {
    std::env::var(GH_ENV)
      .ok()
      .filter(|v| !v.trim().is_empty())
      .or_else(|| self.gh.clone())
      .unwrap_or_else(|| "gh".to_string())
  }
}
