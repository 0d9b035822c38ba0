//! Error types for relman with contextual messages and exit codes
//!
//! Every failure stops the run. Errors are grouped by who has to act on them
//! (the user, the manifest author, the release tool) and each group carries a
//! help message pointing at the fix.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for relman
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (bad input, missing app, manifest shape)
  User = 1,
  /// System error (I/O, spawning processes)
  System = 2,
  /// Interrupted at an interactive prompt
  Interrupted = 130,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for relman
#[derive(Debug)]
pub enum RelmanError {
  /// Bad command-line or prompted input
  Input(InputError),

  /// Manifest and settings errors
  Config(ConfigError),

  /// Rename target is already taken by another file
  DestinationExists { source: PathBuf, dest: PathBuf },

  /// Release tool returned a failure
  Gateway(GatewayError),

  /// I/O errors
  Io(io::Error),

  /// User interrupted an interactive prompt
  Interrupted,

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl RelmanError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    RelmanError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    RelmanError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      RelmanError::Message { message, context, help } => RelmanError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      RelmanError::Gateway(mut e) => {
        e.context = Some(ctx_str);
        RelmanError::Gateway(e)
      }
      _ => self,
    }
  }

  /// Process exit status for this error
  ///
  /// Gateway failures propagate the release tool's own status.
  pub fn exit_status(&self) -> i32 {
    match self {
      RelmanError::Input(_) => ExitCode::User.as_i32(),
      RelmanError::Config(_) => ExitCode::User.as_i32(),
      RelmanError::DestinationExists { .. } => ExitCode::User.as_i32(),
      RelmanError::Gateway(e) => match e.status {
        Some(code) if code != 0 => code,
        _ => ExitCode::System.as_i32(),
      },
      RelmanError::Io(_) => ExitCode::System.as_i32(),
      RelmanError::Interrupted => ExitCode::Interrupted.as_i32(),
      RelmanError::Message { .. } => ExitCode::User.as_i32(),
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      RelmanError::Input(e) => e.help_message(),
      RelmanError::Config(e) => e.help_message(),
      RelmanError::DestinationExists { dest, .. } => Some(format!(
        "Move or delete {} first; relman never overwrites local files.",
        dest.display()
      )),
      RelmanError::Gateway(e) => e.help_message(),
      RelmanError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for RelmanError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RelmanError::Input(e) => write!(f, "{}", e),
      RelmanError::Config(e) => write!(f, "{}", e),
      RelmanError::DestinationExists { source, dest } => write!(
        f,
        "Refusing to rename {} -> {}: destination already exists",
        source.display(),
        dest.display()
      ),
      RelmanError::Gateway(e) => write!(f, "{}", e),
      RelmanError::Io(e) => write!(f, "I/O error: {}", e),
      RelmanError::Interrupted => write!(f, "Interrupted"),
      RelmanError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for RelmanError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      RelmanError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for RelmanError {
  fn from(err: io::Error) -> Self {
    if err.kind() == io::ErrorKind::Interrupted {
      return RelmanError::Interrupted;
    }
    RelmanError::Io(err)
  }
}

impl From<String> for RelmanError {
  fn from(msg: String) -> Self {
    RelmanError::message(msg)
  }
}

impl From<&str> for RelmanError {
  fn from(msg: &str) -> Self {
    RelmanError::message(msg)
  }
}

impl From<InputError> for RelmanError {
  fn from(err: InputError) -> Self {
    RelmanError::Input(err)
  }
}

impl From<ConfigError> for RelmanError {
  fn from(err: ConfigError) -> Self {
    RelmanError::Config(err)
  }
}

impl From<GatewayError> for RelmanError {
  fn from(err: GatewayError) -> Self {
    RelmanError::Gateway(err)
  }
}

impl From<serde_json::Error> for RelmanError {
  fn from(err: serde_json::Error) -> Self {
    RelmanError::message(format!("JSON error: {}", err))
  }
}

impl From<toml_edit::de::Error> for RelmanError {
  fn from(err: toml_edit::de::Error) -> Self {
    RelmanError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for RelmanError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    RelmanError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Bad input from flags or prompts
#[derive(Debug)]
pub enum InputError {
  /// Version string does not match `X.Y.Z[.-]stage[[.-]N]`
  InvalidVersionFormat { raw: String },

  /// File pattern matched no `.apk`/`.ipa` files
  NoMatchingFiles { pattern: String },

  /// File pattern could not be compiled
  InvalidGlob { pattern: String, reason: String },

  /// A required value was left empty
  MissingValue { what: String },

  /// Release date is not a calendar date
  InvalidDate { raw: String },

  /// Every index of a (semver, stage) is already taken
  IndexExhausted { version: String },
}

impl InputError {
  fn help_message(&self) -> Option<String> {
    match self {
      InputError::InvalidVersionFormat { .. } => {
        Some("Examples: 1.0.0-alpha.2, 1.0.0.beta.2, 1.0.0-alpha (index assigned automatically)".to_string())
      }
      InputError::NoMatchingFiles { .. } => {
        Some("Use a glob such as 'release/boochat/**/*.apk'. Only .apk and .ipa files are published.".to_string())
      }
      InputError::InvalidGlob { .. } => Some("Check the pattern syntax ('**' matches any directory depth).".to_string()),
      InputError::MissingValue { what } => Some(format!("Pass --{} or answer the prompt.", what)),
      InputError::InvalidDate { .. } => Some("Dates are written as YYYY-MM-DD, e.g. 2025-03-14.".to_string()),
      InputError::IndexExhausted { .. } => {
        Some("Pass an explicit index (e.g. --version 1.0.0-alpha.2) or bump the version.".to_string())
      }
    }
  }
}

impl fmt::Display for InputError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      InputError::InvalidVersionFormat { raw } => write!(f, "Invalid version format: '{}'", raw),
      InputError::NoMatchingFiles { pattern } => write!(f, "No .apk or .ipa files matched: {}", pattern),
      InputError::InvalidGlob { pattern, reason } => write!(f, "Invalid file pattern '{}': {}", pattern, reason),
      InputError::MissingValue { what } => write!(f, "Missing required value: {}", what),
      InputError::InvalidDate { raw } => write!(f, "Invalid release date: '{}'", raw),
      InputError::IndexExhausted { version } => write!(f, "No index left after the highest one recorded for {}", version),
    }
  }
}

/// Manifest and settings errors
#[derive(Debug)]
pub enum ConfigError {
  /// apps.json not found
  ManifestNotFound { path: PathBuf },

  /// apps.json is missing required members or has the wrong types
  ManifestShape { path: PathBuf, detail: String },

  /// No app matches by id or name
  AppNotFound { key: String, available: Vec<String> },

  /// relman.toml holds an invalid value
  SettingsInvalid { path: PathBuf, detail: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::ManifestNotFound { .. } => {
        Some("Pass --manifest <path> or set `manifest` in relman.toml.".to_string())
      }
      ConfigError::ManifestShape { .. } => Some(
        "Every app needs id, name and github.owner/github.repo; every platform object needs tag and asset.".to_string(),
      ),
      ConfigError::AppNotFound { available, .. } if !available.is_empty() => {
        Some(format!("Known apps: {}", available.join(", ")))
      }
      ConfigError::AppNotFound { .. } => Some("The manifest has no apps yet.".to_string()),
      ConfigError::SettingsInvalid { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::ManifestNotFound { path } => write!(f, "Manifest not found: {}", path.display()),
      ConfigError::ManifestShape { path, detail } => {
        write!(f, "Malformed manifest {}: {}", path.display(), detail)
      }
      ConfigError::AppNotFound { key, .. } => write!(f, "App '{}' not found (matched by id or name)", key),
      ConfigError::SettingsInvalid { path, detail } => {
        write!(f, "Invalid settings in {}: {}", path.display(), detail)
      }
    }
  }
}

/// Release tool invocation failure
#[derive(Debug)]
pub struct GatewayError {
  /// What relman was trying to do
  pub context: Option<String>,
  /// Command line that failed
  pub command: String,
  /// Exit status (None when killed by a signal or never spawned)
  pub status: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl GatewayError {
  fn help_message(&self) -> Option<String> {
    let stderr = self.stderr.to_lowercase();
    if stderr.contains("auth") || stderr.contains("401") {
      Some("Run `gh auth login` (or set GH_TOKEN) and retry.".to_string())
    } else if stderr.contains("403") || stderr.contains("permission") {
      Some("The authenticated account lacks write access to this repository.".to_string())
    } else {
      Some("All release operations are idempotent; fix the cause and re-run the command.".to_string())
    }
  }
}

impl fmt::Display for GatewayError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.context {
      Some(ctx) => writeln!(f, "{}", ctx)?,
      None => writeln!(f, "Release tool failed")?,
    }
    write!(f, "  command: {}", self.command)?;
    if let Some(code) = self.status {
      write!(f, "\n  exit status: {}", code)?;
    }
    let stdout = self.stdout.trim_end();
    if !stdout.is_empty() {
      write!(f, "\n{}", stdout)?;
    }
    let stderr = self.stderr.trim_end();
    if !stderr.is_empty() {
      write!(f, "\n{}", stderr)?;
    }
    Ok(())
  }
}

/// Result type alias for relman
pub type RelmanResult<T> = Result<T, RelmanError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> RelmanResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> RelmanResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<RelmanError>,
{
  fn context(self, ctx: impl Into<String>) -> RelmanResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> RelmanResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &RelmanError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

impl From<anyhow::Error> for RelmanError {
  fn from(err: anyhow::Error) -> Self {
    RelmanError::message(format!("{:#}", err))
  }
}
