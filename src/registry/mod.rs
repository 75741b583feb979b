//! Repo registry.
//!
//! Registered repositories are canonical absolute paths persisted as a
//! multi-valued key. Registration is set-like: re-registering a path is an
//! error, and nothing here ever removes an entry.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::store::{KvStore, SECTION};

const KEY: &str = "repo";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("repository already registered: {0}")]
    AlreadyRegistered(PathBuf),
}

/// Canonicalize and persist a repository path.
pub fn register(store: &mut dyn KvStore, path: &Path) -> Result<PathBuf> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("cannot resolve repository path {}", path.display()))?;
    let value = canonical.to_string_lossy().into_owned();

    if store.exists(SECTION, KEY, Some(&value)) {
        return Err(RegistryError::AlreadyRegistered(canonical).into());
    }

    store
        .add(SECTION, KEY, &value)
        .context("failed to persist repository registration")?;
    Ok(canonical)
}

/// All registered repositories, in the order they were registered.
pub fn list_all(store: &dyn KvStore) -> Vec<PathBuf> {
    store
        .get_all(SECTION, KEY)
        .into_iter()
        .map(PathBuf::from)
        .collect()
}
