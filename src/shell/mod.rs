//! Shell-command adapter.
//!
//! Every query about repository or file state goes through [`run`]. Nonzero
//! exit is a normal outcome (a branch that does not exist yet, a pattern with
//! no matches) and never an error; callers look at `success` when they care.

use std::process::Command;

#[derive(Debug, Clone)]
pub struct ShellOutput {
    /// Captured stdout followed by stderr, lossily decoded.
    pub text: String,
    /// True iff the command exited with status zero.
    pub success: bool,
}

impl ShellOutput {
    /// Non-empty trimmed lines of the captured text.
    pub fn lines(&self) -> Vec<String> {
        self.text
            .lines()
            .map(|l| l.trim_end().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }
}

/// Run `command` through `sh -c`, capturing stdout and stderr merged.
///
/// Infallible by contract: a command that cannot even be spawned degrades to
/// an unsuccessful output carrying the spawn error as its text.
pub fn run(command: &str) -> ShellOutput {
    match Command::new("sh").arg("-c").arg(command).output() {
        Ok(output) => {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            ShellOutput {
                text,
                success: output.status.success(),
            }
        }
        Err(e) => ShellOutput {
            text: format!("failed to spawn shell: {}", e),
            success: false,
        },
    }
}

/// Quote a string for safe interpolation into a `sh -c` command line.
pub fn quote(s: &str) -> String {
    shell_escape::escape(s.into()).into_owned()
}
