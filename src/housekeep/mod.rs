//! Housekeeping orchestrator.
//!
//! Walks the per-repository pipeline: enter the repo, offer to skip it,
//! reconcile its untracked files, back the save-set up onto the dated
//! branch, persist newly-ignored files, prune branches, and optionally drop
//! into a shell before moving on.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;

use crate::engine::{self, FastSource, PromptSource};
use crate::host;
use crate::store::{KvStore, SECTION};
use crate::ui;
use crate::vcs::{self, Vcs};

const IGNORE_KEY: &str = "ignore";

pub struct Housekeeper<'a> {
    store: &'a mut dyn KvStore,
    vcs: &'a dyn Vcs,
    fast: bool,
    host: Option<String>,
}

impl<'a> Housekeeper<'a> {
    pub fn new(store: &'a mut dyn KvStore, vcs: &'a dyn Vcs, fast: bool) -> Self {
        Housekeeper {
            store,
            vcs,
            fast,
            host: None,
        }
    }

    /// Process the repositories strictly one at a time, in the given order.
    pub fn run(&mut self, repos: &[impl AsRef<Path>]) -> Result<()> {
        for repo in repos {
            self.run_one(repo.as_ref())?;
            ui::separator();
        }
        Ok(())
    }

    fn run_one(&mut self, repo: &Path) -> Result<()> {
        // An inaccessible registered repo is a configuration error and
        // aborts the whole run, not just this repository.
        std::env::set_current_dir(repo)
            .with_context(|| format!("cannot enter repository {}", repo.display()))?;
        ui::info(&format!("Checking {}", repo.display()));

        if !self.fast {
            let skip = ui::confirm("Skip this repository?", false)
                .context("interrupted; aborting the run")?;
            if skip {
                ui::info("skipped");
                return Ok(());
            }
        }

        let branch = vcs::backup_branch(repo);
        let saved = engine::saved_files(self.vcs, &branch);
        let ignored: BTreeSet<String> = self
            .store
            .get_all(SECTION, IGNORE_KEY)
            .into_iter()
            .collect();
        let candidates = engine::candidate_files(self.vcs);

        let result = if self.fast {
            engine::reconcile(&candidates, &saved, &ignored, &mut FastSource)
        } else {
            engine::reconcile(&candidates, &saved, &ignored, &mut PromptSource)
        };
        engine::report(&result.outcomes, self.fast);

        self.backup(&branch, &result.save_set)?;
        self.persist_ignores(&result.ignore_additions);

        // Informational only; a cleanup hiccup never sinks the run.
        self.vcs.cleanup();

        if !self.fast && ui::confirm("Open a shell here before continuing?", false).unwrap_or(false)
        {
            open_shell();
        }

        Ok(())
    }

    /// Archive the save-set. A missing host identity is fatal to the whole
    /// run; a failing squash-commit is logged and the run continues.
    fn backup(&mut self, branch: &str, save_set: &BTreeSet<String>) -> Result<()> {
        if save_set.is_empty() {
            ui::info("nothing to back up");
            return Ok(());
        }
        let host = self.host()?;
        let message = format!("housekeeping backup from {}", host);
        let paths: Vec<String> = save_set.iter().cloned().collect();
        match self.vcs.squash_commit(branch, &message, &paths) {
            Ok(()) => ui::success(&format!("{} file(s) archived on {}", paths.len(), branch)),
            Err(e) => ui::error(&format!("backup failed: {:#}", e)),
        }
        Ok(())
    }

    /// Append this run's newly-ignored files to the global ignore list,
    /// logging only the additions that actually changed the store.
    fn persist_ignores(&mut self, additions: &BTreeSet<String>) {
        for path in additions {
            match self.store.add(SECTION, IGNORE_KEY, path) {
                Ok(true) => ui::info(&format!("ignore list += {}", path)),
                Ok(false) => {}
                Err(e) => ui::warn(&format!("could not persist ignore for {}: {:#}", path, e)),
            }
        }
    }

    /// Host identity, fetched lazily at first backup and cached for the
    /// process. Persistence failure is fatal.
    fn host(&mut self) -> Result<String> {
        if let Some(ref host) = self.host {
            return Ok(host.clone());
        }
        let host = host::get_or_create(self.store)?;
        self.host = Some(host.clone());
        Ok(host)
    }
}

fn open_shell() {
    let shell = std::env::var("SHELL").unwrap_or_else(|_| "sh".to_string());
    ui::hint("exit the shell to continue");
    if let Err(e) = Command::new(&shell).status() {
        ui::warn(&format!("could not start {}: {}", shell, e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use anyhow::Result as AnyResult;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    /// Restores the working directory when dropped. The pipeline chdirs
    /// into each repository, and a test must not leave the process sitting
    /// in a tempdir that gets deleted, or every later shell spawn in this
    /// test binary inherits a dangling cwd.
    struct CwdGuard(std::path::PathBuf);

    impl CwdGuard {
        fn hold() -> Self {
            CwdGuard(std::env::current_dir().unwrap())
        }
    }

    impl Drop for CwdGuard {
        fn drop(&mut self) {
            let _ = std::env::set_current_dir(&self.0);
        }
    }

    #[derive(Default)]
    struct RecordingVcs {
        branches: BTreeMap<String, Vec<String>>,
        status: Vec<String>,
        commits: RefCell<Vec<(String, String, Vec<String>)>>,
        cleanups: RefCell<usize>,
    }

    impl Vcs for RecordingVcs {
        fn branch_files(&self, branch: &str) -> Vec<String> {
            self.branches.get(branch).cloned().unwrap_or_default()
        }
        fn status_files(&self) -> Vec<String> {
            self.status.clone()
        }
        fn squash_commit(&self, branch: &str, message: &str, paths: &[String]) -> AnyResult<()> {
            self.commits
                .borrow_mut()
                .push((branch.to_string(), message.to_string(), paths.to_vec()));
            Ok(())
        }
        fn cleanup(&self) {
            *self.cleanups.borrow_mut() += 1;
        }
    }

    #[test]
    #[serial_test::serial]
    fn fast_run_skips_backup_and_persists_nothing() {
        let _cwd = CwdGuard::hold();
        let dir = tempfile::tempdir().unwrap();
        let mut store = MemoryStore::new();
        let vcs = RecordingVcs {
            status: vec!["scratch.txt".to_string()],
            ..RecordingVcs::default()
        };

        let mut keeper = Housekeeper::new(&mut store, &vcs, true);
        keeper.run(&[dir.path()]).unwrap();

        // Empty save-set: the backup call is skipped entirely.
        assert!(vcs.commits.borrow().is_empty());
        assert_eq!(*vcs.cleanups.borrow(), 1);
        assert!(store.get_all(SECTION, IGNORE_KEY).is_empty());
    }

    #[test]
    #[serial_test::serial]
    fn saved_files_are_backed_up_again_with_host_tag() {
        let _cwd = CwdGuard::hold();
        let dir = tempfile::tempdir().unwrap();
        let branch = vcs::backup_branch(dir.path());

        let mut store = MemoryStore::new();
        store.add(SECTION, "hostname", "laptop").unwrap();

        let mut branches = BTreeMap::new();
        branches.insert(branch.clone(), vec!["notes.txt".to_string()]);
        let vcs = RecordingVcs {
            branches,
            status: vec!["notes.txt".to_string()],
            ..RecordingVcs::default()
        };

        let mut keeper = Housekeeper::new(&mut store, &vcs, true);
        keeper.run(&[dir.path()]).unwrap();

        let commits = vcs.commits.borrow();
        assert_eq!(commits.len(), 1);
        let (got_branch, message, paths) = &commits[0];
        assert_eq!(got_branch, &branch);
        assert!(message.contains("laptop"));
        assert_eq!(paths, &vec!["notes.txt".to_string()]);
    }

    #[test]
    #[serial_test::serial]
    fn pipeline_tests_leave_a_valid_working_directory_behind() {
        let before = std::env::current_dir().unwrap();
        {
            let _cwd = CwdGuard::hold();
            let dir = tempfile::tempdir().unwrap();
            let mut store = MemoryStore::new();
            let vcs = RecordingVcs::default();
            Housekeeper::new(&mut store, &vcs, true)
                .run(&[dir.path()])
                .unwrap();
        }
        // The tempdir is gone; the process must be back where it started,
        // with shell spawns unaffected.
        assert_eq!(std::env::current_dir().unwrap(), before);
        let out = crate::shell::run("pwd");
        assert!(out.success);
        assert!(!out.text.contains("getcwd"));
    }

    #[test]
    #[serial_test::serial]
    fn inaccessible_repo_aborts_the_run() {
        let mut store = MemoryStore::new();
        let vcs = RecordingVcs::default();
        let mut keeper = Housekeeper::new(&mut store, &vcs, true);
        let err = keeper
            .run(&[Path::new("/no/such/repository/anywhere")])
            .unwrap_err();
        assert!(err.to_string().contains("cannot enter repository"));
    }
}
