//! Integration tests for `relman publish`

use crate::helpers::{TestWorkspace, stderr, stdout};
use anyhow::Result;

fn publish_args<'a>(extra: &[&'a str]) -> Vec<&'a str> {
  let mut args = vec![
    "publish",
    "--app",
    "boochat",
    "--files",
    "build/**/*.apk",
    "--notes",
    "Line one\\nLine two",
    "--date",
    "2025-03-14",
  ];
  args.extend_from_slice(extra);
  args
}

#[test]
fn test_publish_creates_release_and_updates_manifest() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("build/outputs/app-release.apk", "apk")?;

  let output = ws.run(&publish_args(&["--version", "1.0.0-alpha", "--no-cleanup"]))?;
  assert!(stdout(&output).contains("v1.0.0.alpha"));

  assert!(ws.file_exists("build/outputs/boochat-alpha.2.apk"));
  assert!(!ws.file_exists("build/outputs/app-release.apk"));
  assert_eq!(ws.releases()?, vec!["v1.0.0.alpha"]);
  assert_eq!(ws.assets("v1.0.0.alpha")?, vec!["boochat-alpha.2.apk"]);

  let calls = ws.gh_calls()?;
  assert!(
    calls
      .iter()
      .any(|c| c.starts_with("release create v1.0.0.alpha --title BooChat v1.0.0.alpha"))
  );
  assert!(calls.iter().all(|c| c.contains("--repo acme/boochat-releases")));

  let manifest = ws.manifest()?;
  let alpha = &manifest["apps"][0]["versions"]["alpha"];
  assert_eq!(alpha[0]["version"], "1.0.0-alpha.2");
  assert_eq!(alpha[0]["date"], "2025-03-14");
  assert_eq!(alpha[0]["changelog"], "Line one\nLine two");
  assert_eq!(alpha[0]["android"]["tag"], "v1.0.0.alpha");
  assert_eq!(alpha[0]["android"]["asset"], "boochat-alpha.2.apk");
  assert_eq!(alpha[1]["version"], "1.0.0-alpha.1");
  Ok(())
}

#[test]
fn test_publish_reuses_dash_release() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_release("v1.0.0-alpha", &["boochat-alpha.1.apk"])?;
  ws.write_file("build/app.apk", "apk")?;

  ws.run(&publish_args(&["--version", "1.0.0.alpha.3", "--no-cleanup"]))?;

  assert_eq!(ws.releases()?, vec!["v1.0.0-alpha"]);
  assert!(!ws.gh_calls()?.iter().any(|c| c.starts_with("release create")));
  assert_eq!(ws.assets("v1.0.0-alpha")?, vec!["boochat-alpha.1.apk", "boochat-alpha.3.apk"]);

  let manifest = ws.manifest()?;
  let head = &manifest["apps"][0]["versions"]["alpha"][0];
  assert_eq!(head["version"], "1.0.0-alpha.3");
  assert_eq!(head["android"]["tag"], "v1.0.0-alpha");
  Ok(())
}

#[test]
fn test_publish_with_dash_style_creates_dash_release() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("build/app.apk", "apk")?;

  ws.run(&publish_args(&["--version", "3.1.0-rc", "--tag-style", "dash", "--no-cleanup"]))?;

  assert_eq!(ws.releases()?, vec!["v3.1.0-rc"]);
  let manifest = ws.manifest()?;
  assert_eq!(manifest["apps"][0]["versions"]["rc"][0]["version"], "3.1.0-rc.1");
  Ok(())
}

#[test]
fn test_publish_then_cleanup_removes_stale_releases() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_release("v1.0.0.alpha", &["boochat-alpha.1.apk", "boochat-alpha.7.apk", "notes.md"])?;
  ws.add_release("v1.0.0-alpha.4", &[])?;
  ws.add_release("v0.9.0.beta", &[])?;
  ws.add_release("nightly", &["boochat-alpha.9.apk"])?;
  ws.write_file("build/app.apk", "apk")?;

  ws.run(&publish_args(&["--version", "1.0.0-alpha", "--yes"]))?;

  assert_eq!(ws.releases()?, vec!["v1.0.0.alpha", "nightly"]);
  assert_eq!(
    ws.assets("v1.0.0.alpha")?,
    vec!["boochat-alpha.1.apk", "notes.md", "boochat-alpha.2.apk"]
  );
  assert_eq!(ws.assets("nightly")?, vec!["boochat-alpha.9.apk"]);

  let deletes: Vec<_> = ws
    .gh_calls()?
    .into_iter()
    .filter(|c| c.starts_with("release delete "))
    .collect();
  assert_eq!(deletes.len(), 2);
  assert!(deletes.iter().all(|c| c.ends_with("--cleanup-tag")));
  Ok(())
}

#[test]
fn test_dry_run_publish_changes_nothing() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_release("v9.9.9.beta", &[])?;
  ws.write_file("build/app-release.apk", "apk")?;
  let before = ws.read_file("apps.json")?;

  let output = ws.run(&[
    "--dry-run",
    "publish",
    "--app",
    "BooChat",
    "--version",
    "1.0.0-alpha",
    "--files",
    "build/*.apk",
    "--notes",
    "n",
    "--yes",
  ])?;

  let out = stdout(&output);
  assert!(out.contains("[dry-run] rename"));
  assert!(out.contains("[dry-run] create release v1.0.0.alpha"));
  assert!(out.contains("[dry-run] upload"));
  assert!(out.contains("[dry-run] write manifest"));
  assert!(out.contains("[dry-run] delete release v9.9.9.beta"));

  assert_eq!(ws.read_file("apps.json")?, before);
  assert!(ws.file_exists("build/app-release.apk"));
  assert_eq!(ws.releases()?, vec!["v9.9.9.beta"]);
  for call in ws.gh_calls()? {
    assert!(
      call.starts_with("release view") || call.starts_with("release list"),
      "unexpected mutation in dry-run: {}",
      call
    );
  }
  Ok(())
}

#[test]
fn test_unknown_app_is_user_error() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("build/app.apk", "apk")?;

  let output = ws.run_raw(
    &["publish", "--app", "nope", "--version", "1.0.0-alpha", "--files", "build/*.apk"],
    &[],
  )?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("App 'nope' not found"));
  assert!(stderr(&output).contains("boochat"));
  assert!(ws.gh_calls()?.is_empty());
  Ok(())
}

#[test]
fn test_invalid_version_is_user_error() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("build/app.apk", "apk")?;

  let output = ws.run_raw(&publish_args(&["--version", "1.0-alpha"]), &[])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Invalid version format"));
  assert!(ws.file_exists("build/app.apk"));
  assert!(ws.gh_calls()?.is_empty());
  Ok(())
}

#[test]
fn test_no_matching_files_is_user_error() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("build/readme.txt", "not a build")?;

  let output = ws.run_raw(&publish_args(&["--version", "1.0.0-alpha"]), &[])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("No .apk or .ipa files matched"));
  assert!(ws.gh_calls()?.is_empty());
  Ok(())
}

#[test]
fn test_occupied_destination_aborts_before_remote() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("build/app.apk", "new")?;
  ws.write_file("build/boochat-alpha.2.apk", "old")?;

  let output = ws.run_raw(&publish_args(&["--version", "1.0.0-alpha"]), &[])?;
  assert_eq!(output.status.code(), Some(1));
  assert_eq!(ws.read_file("build/boochat-alpha.2.apk")?, "old");
  assert!(ws.file_exists("build/app.apk"));
  assert!(ws.gh_calls()?.is_empty());
  Ok(())
}

#[test]
fn test_gateway_failure_propagates_exit_status() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("build/app.apk", "apk")?;
  let before = ws.read_file("apps.json")?;

  let output = ws.run_raw(
    &publish_args(&["--version", "1.0.0-alpha", "--no-cleanup"]),
    &[("FAKE_GH_FAIL", "4")],
  )?;
  assert_eq!(output.status.code(), Some(4));
  assert!(stderr(&output).contains("simulated outage"));
  assert_eq!(ws.read_file("apps.json")?, before);
  Ok(())
}

#[test]
fn test_ios_testflight_flag_is_recorded() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("build/Runner.ipa", "ipa")?;

  ws.run(&[
    "publish",
    "--app",
    "boochat",
    "--version",
    "1.1.0-beta.2",
    "--files",
    "build/*.ipa",
    "--notes",
    "",
    "--no-ios-testflight",
    "--no-cleanup",
  ])?;

  let manifest = ws.manifest()?;
  let ios = &manifest["apps"][0]["versions"]["beta"][0]["ios"];
  assert_eq!(ios["asset"], "boochat-beta.2.ipa");
  assert_eq!(ios["tag"], "v1.1.0.beta");
  assert_eq!(ios["testflight"], false);
  Ok(())
}
