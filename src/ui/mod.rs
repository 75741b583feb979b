use colored::*;
use console::style;

pub fn init() {
    // Enable colored output on Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();
}

// All progress output goes to stderr, line by line as it happens, so an
// interactive session stays auditable even when stdout is redirected.

pub fn info(message: &str) {
    eprintln!("{} {}", style("ℹ").blue(), message);
}

pub fn success(message: &str) {
    eprintln!("{} {}", style("✓").green(), message.green());
}

pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red(), message.red());
}

pub fn warn(message: &str) {
    eprintln!("{} {}", style("⚠").yellow(), message.yellow());
}

pub fn hint(message: &str) {
    eprintln!("{} {}", style("💡").cyan(), message.dimmed());
}

/// Visual separator printed between repositories.
pub fn separator() {
    eprintln!("{}", "─".repeat(60).dimmed());
}

/// Yes/no confirmation. Interruption (ctrl-C) surfaces as `Err` so callers
/// that treat it as "abort everything" can do so explicitly.
pub fn confirm(message: &str, default: bool) -> anyhow::Result<bool> {
    let answer = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(default)
        .interact()?;
    Ok(answer)
}

/// Free-form single-line prompt, empty input allowed. Interruption folds into
/// an empty answer: per-file decisions treat anything outside y/n as "ask me
/// again next run", never as an abort.
pub fn prompt_line(message: &str) -> String {
    dialoguer::Input::<String>::new()
        .with_prompt(message)
        .allow_empty(true)
        .interact_text()
        .unwrap_or_default()
}

pub fn prompt_text(message: &str, default: Option<&str>) -> String {
    let mut prompt = dialoguer::Input::new();
    prompt = prompt.with_prompt(message);

    if let Some(default_value) = default {
        prompt = prompt.default(default_value.to_string());
    }

    prompt.interact_text().unwrap_or_default()
}
