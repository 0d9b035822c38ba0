mod commands;
mod core;
mod manifest;
mod release;
mod ui;
mod utils;

use clap::{Parser, Subcommand};
use core::context::ReleaseContext;
use core::error::{RelmanError, print_error};
use release::TagStyle;
use std::path::PathBuf;

/// Publish Android/iOS builds to GitHub Releases and keep apps.json in sync
#[derive(Parser)]
#[command(name = "relman")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  /// Path to apps.json (default: `manifest` in relman.toml, else app/config/apps.json)
  #[arg(long, global = true, visible_alias = "config", value_name = "PATH")]
  manifest: Option<PathBuf>,

  /// Print every file rename, remote mutation and manifest write instead of doing it
  #[arg(long, global = true)]
  dry_run: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Rename builds, create or reuse the release, upload, and record the version
  Publish {
    /// App id or name (asked when omitted)
    #[arg(long)]
    app: Option<String>,

    /// Version such as 1.0.0-alpha.2 or 1.0.0.beta (index assigned when omitted)
    #[arg(long)]
    version: Option<String>,

    /// Glob of build files, e.g. 'release/boochat/**/*.apk'
    #[arg(long)]
    files: Option<String>,

    /// Release notes; a literal \n becomes a line break
    #[arg(long)]
    notes: Option<String>,

    /// Release date, YYYY-MM-DD (default: today)
    #[arg(long)]
    date: Option<String>,

    /// Mark the iOS build as submitted to TestFlight
    #[arg(long, overrides_with = "no_ios_testflight")]
    ios_testflight: bool,

    /// Mark the iOS build as not submitted to TestFlight
    #[arg(long, overrides_with = "ios_testflight")]
    no_ios_testflight: bool,

    /// Run cleanup after publishing
    #[arg(long, overrides_with = "no_cleanup")]
    cleanup: bool,

    /// Skip cleanup after publishing
    #[arg(long, overrides_with = "cleanup")]
    no_cleanup: bool,

    /// Do not ask before deleting during cleanup
    #[arg(short, long)]
    yes: bool,

    /// Delete git tags together with releases
    #[arg(long, overrides_with = "no_cleanup_tag")]
    cleanup_tag: bool,

    /// Keep git tags of deleted releases
    #[arg(long, overrides_with = "cleanup_tag")]
    no_cleanup_tag: bool,

    /// Normalize asset names and tags of all apps before saving
    #[arg(long, overrides_with = "no_normalize")]
    normalize: bool,

    /// Leave other entries of apps.json as they are
    #[arg(long, overrides_with = "normalize")]
    no_normalize: bool,

    /// Tag punctuation for a newly created release
    #[arg(long, value_enum)]
    tag_style: Option<TagStyle>,
  },

  /// Delete releases and assets apps.json no longer references
  Cleanup {
    /// App id or name (asked when omitted)
    #[arg(long)]
    app: Option<String>,

    /// Do not ask before deleting
    #[arg(short, long)]
    yes: bool,

    /// Delete git tags together with releases
    #[arg(long, overrides_with = "no_cleanup_tag")]
    cleanup_tag: bool,

    /// Keep git tags of deleted releases
    #[arg(long, overrides_with = "cleanup_tag")]
    no_cleanup_tag: bool,

    /// Delete orphaned managed assets of kept releases
    #[arg(long, overrides_with = "no_cleanup_assets")]
    cleanup_assets: bool,

    /// Only look at releases, not their assets
    #[arg(long, overrides_with = "cleanup_assets")]
    no_cleanup_assets: bool,

    /// Print the cleanup plan as JSON without executing it
    #[arg(long)]
    json: bool,
  },

  /// Rewrite asset names and tags in apps.json to their canonical form
  Normalize,
}

/// Resolve a `--x` / `--no-x` pair against a default
fn toggle(on: bool, off: bool, default: bool) -> bool {
  if on {
    true
  } else if off {
    false
  } else {
    default
  }
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();

  let root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => handle_error(RelmanError::from(e)),
  };

  let ctx = match ReleaseContext::build(&root, cli.manifest, cli.dry_run) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let defaults = &ctx.settings.defaults;
  let result = match cli.command {
    Commands::Publish {
      app,
      version,
      files,
      notes,
      date,
      ios_testflight,
      no_ios_testflight,
      cleanup,
      no_cleanup,
      yes,
      cleanup_tag,
      no_cleanup_tag,
      normalize,
      no_normalize,
      tag_style,
    } => {
      let options = commands::PublishOptions {
        app,
        version,
        files,
        notes,
        date,
        ios_testflight: match (ios_testflight, no_ios_testflight) {
          (true, _) => Some(true),
          (_, true) => Some(false),
          _ => None,
        },
        cleanup: toggle(cleanup, no_cleanup, defaults.cleanup),
        yes,
        cleanup_tag: toggle(cleanup_tag, no_cleanup_tag, defaults.cleanup_tag),
        cleanup_assets: defaults.cleanup_assets,
        normalize: toggle(normalize, no_normalize, defaults.normalize),
        tag_style: tag_style.unwrap_or(ctx.settings.tag_style),
      };
      commands::run_publish(&ctx, options)
    }
    Commands::Cleanup {
      app,
      yes,
      cleanup_tag,
      no_cleanup_tag,
      cleanup_assets,
      no_cleanup_assets,
      json,
    } => {
      let options = commands::CleanupOptions {
        app,
        yes,
        cleanup_tag: toggle(cleanup_tag, no_cleanup_tag, defaults.cleanup_tag),
        cleanup_assets: toggle(cleanup_assets, no_cleanup_assets, defaults.cleanup_assets),
        json,
      };
      commands::run_cleanup(&ctx, options)
    }
    Commands::Normalize => commands::run_normalize(&ctx),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: RelmanError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_status());
}
