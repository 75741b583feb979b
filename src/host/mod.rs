//! Host identity.
//!
//! A short operator-chosen label that tags every backup commit message so
//! archives from different machines stay distinguishable on a shared remote.
//! Bootstrapped once via an interactive prompt and cached in the store;
//! after that it is only ever changed by editing the store by hand.

use anyhow::{Context, Result};

use crate::store::{KvStore, SECTION};
use crate::ui;

const KEY: &str = "hostname";

/// Read the host label, prompting and persisting it on first use.
///
/// Persistence failure is fatal: without a host label no backup commit can
/// be tagged, so there is nothing sensible to fall back to.
pub fn get_or_create(store: &mut dyn KvStore) -> Result<String> {
    if let Some(host) = store.get(SECTION, KEY) {
        return Ok(host);
    }

    let default = hostname::get()
        .ok()
        .map(|h| h.to_string_lossy().into_owned());
    let answer = ui::prompt_text("Name for this host", default.as_deref());
    let answer = answer.trim().to_string();
    if answer.is_empty() {
        anyhow::bail!("a host name is required to tag backups");
    }

    store
        .add(SECTION, KEY, &answer)
        .context("failed to persist host name")?;
    Ok(answer)
}
