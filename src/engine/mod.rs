//! File reconciliation engine.
//!
//! Given the untracked/ignored files currently in a repository, reconcile
//! them against the set already archived on the backup branch and the
//! operator's persistent ignore list, resolve the remainder, and hand back
//! the final save-set and the newly-ignored paths. Resolution is separated
//! from I/O: the pure [`reconcile`] function consumes decisions from a
//! [`DecisionSource`], so tests script responses instead of faking a tty.

use std::collections::BTreeSet;

use crate::ui;
use crate::vcs::Vcs;

/// Operator verdict for one unknown file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Save,
    Ignore,
    /// Neither saved nor ignored; the file is re-offered on every future run
    /// until the operator answers y or n.
    Unresolved,
}

/// How a candidate ended up classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    AlreadySaved,
    AlreadyIgnored,
    Saved,
    Ignored,
    Unresolved,
}

pub trait DecisionSource {
    fn decide(&mut self, path: &str) -> Decision;
}

/// Interactive source: `"<f> [y/N]:"`. Only y and n resolve; empty input,
/// stray keys, and an interrupted prompt all leave the file unresolved.
/// (This is deliberately laxer than the skip-repo prompt, where an interrupt
/// aborts the whole run.)
pub struct PromptSource;

impl DecisionSource for PromptSource {
    fn decide(&mut self, path: &str) -> Decision {
        let answer = ui::prompt_line(&format!("{} [y/N]", path));
        match answer.trim() {
            "y" | "Y" => Decision::Save,
            "n" | "N" => Decision::Ignore,
            _ => Decision::Unresolved,
        }
    }
}

/// Fast mode: never prompts, never persists; every unknown file is ignored
/// for this run only.
pub struct FastSource;

impl DecisionSource for FastSource {
    fn decide(&mut self, _path: &str) -> Decision {
        Decision::Unresolved
    }
}

#[derive(Debug, Default)]
pub struct Reconciled {
    /// Everything that should be on the backup branch after this run:
    /// the already-saved set plus files explicitly confirmed this run.
    pub save_set: BTreeSet<String>,
    /// Paths to append to the persistent ignore list.
    pub ignore_additions: BTreeSet<String>,
    /// Per-candidate classification, in lexicographic candidate order.
    pub outcomes: Vec<(String, Outcome)>,
}

/// Classify every candidate against the saved and ignored sets, consulting
/// `source` for the unknowns. Candidates are visited in lexicographic order
/// so prompts repeat stably across runs.
pub fn reconcile(
    candidates: &BTreeSet<String>,
    saved: &BTreeSet<String>,
    ignored: &BTreeSet<String>,
    source: &mut dyn DecisionSource,
) -> Reconciled {
    let mut result = Reconciled {
        save_set: saved.clone(),
        ..Reconciled::default()
    };

    for file in candidates {
        let outcome = if saved.contains(file) {
            Outcome::AlreadySaved
        } else if ignored.contains(file) {
            Outcome::AlreadyIgnored
        } else {
            match source.decide(file) {
                Decision::Save => {
                    result.save_set.insert(file.clone());
                    Outcome::Saved
                }
                Decision::Ignore => {
                    result.ignore_additions.insert(file.clone());
                    Outcome::Ignored
                }
                Decision::Unresolved => Outcome::Unresolved,
            }
        };
        result.outcomes.push((file.clone(), outcome));
    }

    result
}

/// Files recorded on the repository's backup branch. Adapter failure means
/// "nothing saved yet", never an error.
pub fn saved_files(vcs: &dyn Vcs, branch: &str) -> BTreeSet<String> {
    vcs.branch_files(branch).into_iter().collect()
}

/// Current untracked/ignored snapshot, sorted. Adapter failure degrades to
/// an empty candidate set.
pub fn candidate_files(vcs: &dyn Vcs) -> BTreeSet<String> {
    vcs.status_files().into_iter().collect()
}

/// Print one line per classification as the operator would want to audit it.
pub fn report(outcomes: &[(String, Outcome)], fast: bool) {
    for (file, outcome) in outcomes {
        let line = outcome_line(file, *outcome, fast);
        match outcome {
            Outcome::Saved => ui::success(&line),
            Outcome::Unresolved if !fast => ui::hint(&line),
            _ => ui::info(&line),
        }
    }
}

/// Classification lines state what this run will do; whether an ignore
/// actually reached the persistent list is reported separately when it is
/// persisted.
fn outcome_line(file: &str, outcome: Outcome, fast: bool) -> String {
    match outcome {
        Outcome::AlreadySaved => format!("{} (saved)", file),
        Outcome::AlreadyIgnored => format!("{} (ignored)", file),
        Outcome::Saved => format!("{} will be saved", file),
        Outcome::Ignored => format!("{} will be ignored", file),
        Outcome::Unresolved if fast => format!("{} (IGNORED)", file),
        Outcome::Unresolved => format!("{} left undecided", file),
    }
}
