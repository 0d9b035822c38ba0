//! Core building blocks shared by all relman commands
//!
//! - **config**: optional settings (relman.toml) parsing and validation
//! - **context**: per-invocation context (settings, manifest path, dry-run)
//! - **error**: error taxonomy with contextual help and exit statuses
//! - **gateway**: release host abstraction (`gh` CLI, dry-run decorator)
//! - **plan**: reviewable cleanup plans with content-hash ids

pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod plan;
