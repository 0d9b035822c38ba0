//! Integration tests for `relman normalize`

use crate::helpers::{TestWorkspace, stdout};
use anyhow::Result;

const UNNORMALIZED: &str = r#"{
  "schema": 2,
  "apps": [
    {
      "id": "boochat",
      "name": "BooChat",
      "github": {
        "owner": "acme",
        "repo": "boochat-releases"
      },
      "versions": {
        "beta": [
          {
            "version": "2.0.0-beta.3",
            "date": "2025-02-01",
            "changelog": "修复若干问题",
            "android": {
              "tag": "2.0.0-beta.3",
              "asset": "app-release.apk"
            },
            "ios": {
              "tag": "v2.0.0-beta",
              "asset": "Runner.ipa",
              "testflight": true
            }
          }
        ]
      },
      "icon": "boochat.png"
    }
  ]
}
"#;

#[test]
fn test_normalize_rewrites_names_and_tags() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("apps.json", UNNORMALIZED)?;

  let output = ws.run(&["normalize"])?;
  assert!(stdout(&output).contains("Normalized"));

  let manifest = ws.manifest()?;
  let entry = &manifest["apps"][0]["versions"]["beta"][0];
  assert_eq!(entry["android"]["tag"], "v2.0.0.beta");
  assert_eq!(entry["android"]["asset"], "boochat-beta.3.apk");
  // base tags keep their punctuation
  assert_eq!(entry["ios"]["tag"], "v2.0.0-beta");
  assert_eq!(entry["ios"]["asset"], "boochat-beta.3.ipa");
  assert_eq!(entry["ios"]["testflight"], true);
  assert_eq!(manifest["schema"], 2);
  assert_eq!(manifest["apps"][0]["icon"], "boochat.png");

  let text = ws.read_file("apps.json")?;
  assert!(text.contains("修复若干问题"), "non-ASCII must be written verbatim");
  assert!(text.ends_with("}\n"));
  assert!(ws.gh_calls()?.is_empty());
  Ok(())
}

#[test]
fn test_normalize_leaves_clean_manifest_byte_identical() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let before = ws.read_file("apps.json")?;

  let output = ws.run(&["normalize"])?;
  assert!(stdout(&output).contains("already normalized"));
  assert_eq!(ws.read_file("apps.json")?, before);
  Ok(())
}

#[test]
fn test_normalize_dry_run_writes_nothing() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("apps.json", UNNORMALIZED)?;

  let output = ws.run(&["--dry-run", "normalize"])?;
  assert!(stdout(&output).contains("[dry-run]"));
  assert_eq!(ws.read_file("apps.json")?, UNNORMALIZED);
  Ok(())
}

#[test]
fn test_malformed_manifest_exits_with_user_error() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("apps.json", r#"{"apps": [{"id": "boochat"}]}"#)?;

  let output = ws.run_raw(&["normalize"], &[])?;
  assert_eq!(output.status.code(), Some(1));
  Ok(())
}

#[test]
fn test_manifest_path_from_settings() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("releases/apps.json", UNNORMALIZED)?;
  ws.write_file("relman.toml", "manifest = \"releases/apps.json\"\n")?;

  let output = std::process::Command::new(env!("CARGO_BIN_EXE_relman"))
    .current_dir(&ws.path)
    .arg("normalize")
    .output()?;
  assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
  assert!(ws.read_file("releases/apps.json")?.contains("boochat-beta.3.apk"));
  Ok(())
}
