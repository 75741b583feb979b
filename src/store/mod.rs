//! Key-value store adapter.
//!
//! Persistent operator state (host identity, repo registry, ignore list)
//! lives in the operator's global git config file under one section. The
//! store is modeled as a narrow trait so the registry, host identity, and
//! reconciliation plumbing can be exercised against an in-memory double.

use anyhow::Result;
use std::collections::BTreeMap;

use crate::shell;

/// Section under which all of this tool's keys live.
pub const SECTION: &str = "git-housekeep";

/// Section/key-scoped, multi-valued string store.
pub trait KvStore {
    /// True if the key exists; with `value`, true if that exact value is
    /// present among the key's values.
    fn exists(&self, section: &str, key: &str, value: Option<&str>) -> bool;

    /// First value for the key, if any.
    fn get(&self, section: &str, key: &str) -> Option<String>;

    /// All values for the key, in persisted order.
    fn get_all(&self, section: &str, key: &str) -> Vec<String>;

    /// Append a value to a multi-valued key. Returns false (and leaves the
    /// store untouched) when the value is already present.
    fn add(&mut self, section: &str, key: &str, value: &str) -> Result<bool>;

    /// Remove a key, or with `value`, all occurrences of that value.
    /// Returns false when there was nothing to remove.
    fn unset(&mut self, section: &str, key: &str, value: Option<&str>) -> Result<bool>;
}

/// Store backed by `git config --global`.
///
/// git resolves the global config to a fixed per-operator file and honors
/// `GIT_CONFIG_GLOBAL`, which is how tests redirect it. Values are opaque
/// strings; existence checks hand git an anchored value pattern, so the value
/// is regex-escaped to keep the match literal.
#[derive(Debug, Default)]
pub struct GitConfigStore;

impl GitConfigStore {
    pub fn new() -> Self {
        GitConfigStore
    }

    fn value_pattern(value: &str) -> String {
        format!("^{}$", regex::escape(value))
    }
}

impl KvStore for GitConfigStore {
    fn exists(&self, section: &str, key: &str, value: Option<&str>) -> bool {
        let name = shell::quote(&format!("{}.{}", section, key));
        let cmd = match value {
            Some(v) => format!(
                "git config --global --get-all {} {}",
                name,
                shell::quote(&Self::value_pattern(v))
            ),
            None => format!("git config --global --get-all {}", name),
        };
        shell::run(&cmd).success
    }

    fn get(&self, section: &str, key: &str) -> Option<String> {
        self.get_all(section, key).into_iter().next()
    }

    fn get_all(&self, section: &str, key: &str) -> Vec<String> {
        let name = shell::quote(&format!("{}.{}", section, key));
        let out = shell::run(&format!("git config --global --get-all {}", name));
        if out.success {
            out.lines()
        } else {
            Vec::new()
        }
    }

    fn add(&mut self, section: &str, key: &str, value: &str) -> Result<bool> {
        if self.exists(section, key, Some(value)) {
            return Ok(false);
        }
        let name = shell::quote(&format!("{}.{}", section, key));
        let out = shell::run(&format!(
            "git config --global --add {} {}",
            name,
            shell::quote(value)
        ));
        if !out.success {
            anyhow::bail!("git config --add failed: {}", out.text.trim());
        }
        Ok(true)
    }

    fn unset(&mut self, section: &str, key: &str, value: Option<&str>) -> Result<bool> {
        if !self.exists(section, key, value) {
            return Ok(false);
        }
        let name = shell::quote(&format!("{}.{}", section, key));
        let cmd = match value {
            Some(v) => format!(
                "git config --global --unset-all {} {}",
                name,
                shell::quote(&Self::value_pattern(v))
            ),
            None => format!("git config --global --unset-all {}", name),
        };
        let out = shell::run(&cmd);
        if !out.success {
            anyhow::bail!("git config --unset-all failed: {}", out.text.trim());
        }
        Ok(true)
    }
}

/// In-memory store double for unit tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<(String, String), Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn slot(&self, section: &str, key: &str) -> Option<&Vec<String>> {
        self.entries.get(&(section.to_string(), key.to_string()))
    }
}

impl KvStore for MemoryStore {
    fn exists(&self, section: &str, key: &str, value: Option<&str>) -> bool {
        match (self.slot(section, key), value) {
            (Some(values), Some(v)) => values.iter().any(|x| x == v),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    fn get(&self, section: &str, key: &str) -> Option<String> {
        self.slot(section, key).and_then(|v| v.first().cloned())
    }

    fn get_all(&self, section: &str, key: &str) -> Vec<String> {
        self.slot(section, key).cloned().unwrap_or_default()
    }

    fn add(&mut self, section: &str, key: &str, value: &str) -> Result<bool> {
        let values = self
            .entries
            .entry((section.to_string(), key.to_string()))
            .or_default();
        if values.iter().any(|x| x == value) {
            return Ok(false);
        }
        values.push(value.to_string());
        Ok(true)
    }

    fn unset(&mut self, section: &str, key: &str, value: Option<&str>) -> Result<bool> {
        let slot = (section.to_string(), key.to_string());
        match value {
            None => Ok(self.entries.remove(&slot).is_some()),
            Some(v) => {
                let Some(values) = self.entries.get_mut(&slot) else {
                    return Ok(false);
                };
                let before = values.len();
                values.retain(|x| x != v);
                let changed = values.len() != before;
                if values.is_empty() {
                    self.entries.remove(&slot);
                }
                Ok(changed)
            }
        }
    }
}
