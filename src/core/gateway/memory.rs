//! In-memory gateway for unit tests

use crate::core::error::{GatewayError, RelmanError, RelmanResult};
use crate::core::gateway::{ReleaseGateway, RemoteAsset};
use std::cell::RefCell;
use std::path::PathBuf;

/// Releases in creation order, each with its asset names
pub type RemoteState = Vec<(String, Vec<String>)>;

pub struct MemoryGateway {
  repo: String,
  state: RefCell<RemoteState>,
  mutations: RefCell<Vec<String>>,
  fail_with: Option<i32>,
}

impl MemoryGateway {
  pub fn new(repo: &str) -> Self {
    Self {
      repo: repo.to_string(),
      state: RefCell::new(Vec::new()),
      mutations: RefCell::new(Vec::new()),
      fail_with: None,
    }
  }

  /// Every call fails with this exit status
  pub fn failing(repo: &str, status: i32) -> Self {
    Self {
      fail_with: Some(status),
      ..Self::new(repo)
    }
  }

  pub fn seed(&self, tag: &str, assets: &[&str]) {
    self
      .state
      .borrow_mut()
      .push((tag.to_string(), assets.iter().map(|a| a.to_string()).collect()));
  }

  pub fn state(&self) -> RemoteState {
    self.state.borrow().clone()
  }

  pub fn tags(&self) -> Vec<String> {
    self.state.borrow().iter().map(|(tag, _)| tag.clone()).collect()
  }

  pub fn assets_of(&self, tag: &str) -> Vec<String> {
    self
      .state
      .borrow()
      .iter()
      .find(|(t, _)| t == tag)
      .map(|(_, assets)| assets.clone())
      .unwrap_or_default()
  }

  /// Mutating calls in order, e.g. `create v1.0.0.alpha`
  pub fn mutations(&self) -> Vec<String> {
    self.mutations.borrow().clone()
  }

  fn check(&self, op: &str) -> RelmanResult<()> {
    match self.fail_with {
      Some(status) => Err(RelmanError::Gateway(GatewayError {
        context: None,
        command: format!("memory {}", op),
        status: Some(status),
        stdout: String::new(),
        stderr: "simulated failure".to_string(),
      })),
      None => Ok(()),
    }
  }

  fn record(&self, entry: String) {
    self.mutations.borrow_mut().push(entry);
  }

  fn release_missing(&self, tag: &str) -> RelmanError {
    RelmanError::Gateway(GatewayError {
      context: None,
      command: format!("memory view {}", tag),
      status: Some(1),
      stdout: String::new(),
      stderr: "release not found".to_string(),
    })
  }
}

impl ReleaseGateway for MemoryGateway {
  fn repo(&self) -> &str {
    &self.repo
  }

  fn release_exists(&self, tag: &str) -> RelmanResult<bool> {
    self.check("view")?;
    Ok(self.state.borrow().iter().any(|(t, _)| t == tag))
  }

  fn create_release(&self, tag: &str, _title: &str, _notes: &str) -> RelmanResult<()> {
    self.check("create")?;
    self.record(format!("create {}", tag));
    self.state.borrow_mut().push((tag.to_string(), Vec::new()));
    Ok(())
  }

  fn upload_assets(&self, tag: &str, files: &[PathBuf]) -> RelmanResult<()> {
    self.check("upload")?;
    let mut state = self.state.borrow_mut();
    let Some((_, assets)) = state.iter_mut().find(|(t, _)| t == tag) else {
      return Err(self.release_missing(tag));
    };
    for file in files {
      let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
      self.mutations.borrow_mut().push(format!("upload {} {}", tag, name));
      if !assets.contains(&name) {
        assets.push(name);
      }
    }
    Ok(())
  }

  fn list_releases(&self) -> RelmanResult<Vec<String>> {
    self.check("list")?;
    Ok(self.tags())
  }

  fn list_assets(&self, tag: &str) -> RelmanResult<Vec<RemoteAsset>> {
    self.check("view")?;
    let state = self.state.borrow();
    let Some((_, assets)) = state.iter().find(|(t, _)| t == tag) else {
      return Err(self.release_missing(tag));
    };
    Ok(assets.iter().map(|name| RemoteAsset { name: name.clone() }).collect())
  }

  fn delete_asset(&self, tag: &str, name: &str) -> RelmanResult<()> {
    self.check("delete-asset")?;
    self.record(format!("delete-asset {} {}", tag, name));
    if let Some((_, assets)) = self.state.borrow_mut().iter_mut().find(|(t, _)| t == tag) {
      assets.retain(|a| a != name);
    }
    Ok(())
  }

  fn delete_release(&self, tag: &str, cleanup_tag: bool) -> RelmanResult<()> {
    self.check("delete")?;
    let suffix = if cleanup_tag { " --cleanup-tag" } else { "" };
    self.record(format!("delete {}{}", tag, suffix));
    self.state.borrow_mut().retain(|(t, _)| t != tag);
    Ok(())
  }
}
