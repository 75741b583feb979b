//! git-housekeep - A personal git-repository housekeeping tool.
//!
//! This library provides the core functionality for git-housekeep, including:
//! - Reconciling untracked/ignored files against persisted decisions
//! - Archiving known untracked files onto per-host, per-year backup branches
//! - A git-config-backed key-value store for repos, ignores, and host identity
//! - Branch cleanup and the per-repository housekeeping pipeline

pub mod engine;
pub mod host;
pub mod housekeep;
pub mod registry;
pub mod shell;
pub mod store;
pub mod ui;
pub mod vcs;
