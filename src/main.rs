mod engine;
mod host;
mod housekeep;
mod registry;
mod shell;
mod store;
mod ui;
mod vcs;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;

use crate::housekeep::Housekeeper;
use crate::store::GitConfigStore;
use crate::vcs::GitVcs;

/// git-housekeep - Archive untracked files to dated backup branches and
/// remember your save/ignore decisions across runs
#[derive(Parser)]
#[command(name = "git-housekeep")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
Per-file prompts accept y (save) or n (ignore permanently); any other input, \
including ctrl-C, leaves the file undecided and it is offered again next run. \
Ctrl-C at the \"Skip this repository?\" prompt aborts the entire run.")]
struct Cli {
    /// Register a repository (defaults to the current directory) and exit
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = ".", conflicts_with = "checkall")]
    register: Option<String>,

    /// Run housekeeping over every registered repository, in registry order
    #[arg(long)]
    checkall: bool,

    /// Suppress all prompts; unknown files are ignored for this run only
    #[arg(long)]
    fast: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // Help is not a successful housekeeping run: exit 1, not 0.
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    ui::init();

    if let Err(e) = run(cli) {
        ui::error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    which::which("git").context("git not found on PATH")?;

    let mut store = GitConfigStore::new();

    if let Some(path) = cli.register {
        let expanded = shellexpand::tilde(&path).into_owned();
        let registered = registry::register(&mut store, &PathBuf::from(expanded))?;
        ui::success(&format!("Registered {}", registered.display()));
        return Ok(());
    }

    let repos: Vec<PathBuf> = if cli.checkall {
        let repos = registry::list_all(&store);
        if repos.is_empty() {
            ui::hint("No repositories registered yet. Use --register in a repo first.");
            return Ok(());
        }
        repos
    } else {
        vec![std::env::current_dir().context("cannot determine current directory")?]
    };

    let vcs = GitVcs::new();
    Housekeeper::new(&mut store, &vcs, cli.fast).run(&repos)
}
