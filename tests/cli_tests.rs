use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn bin() -> Command {
    Command::cargo_bin("git-housekeep").unwrap()
}

#[test]
fn help_prints_usage_and_exits_one() {
    bin()
        .arg("--help")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("--register"))
        .stdout(predicate::str::contains("--checkall"))
        .stdout(predicate::str::contains("--fast"));
}

#[test]
fn register_and_checkall_are_mutually_exclusive() {
    bin()
        .args(["--register", "--checkall"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn register_persists_path_to_the_store() {
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    let config = home.path().join("gitconfig");
    fs::write(&config, "").unwrap();

    bin()
        .env("GIT_CONFIG_GLOBAL", &config)
        .arg("--register")
        .arg(repo.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Registered"));

    let stored = fs::read_to_string(&config).unwrap();
    assert!(stored.contains("[git-housekeep]"));
    let canonical = repo.path().canonicalize().unwrap();
    assert!(stored.contains(&*canonical.to_string_lossy()));
}

#[test]
fn registering_the_same_repo_twice_fails() {
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    let config = home.path().join("gitconfig");
    fs::write(&config, "").unwrap();

    bin()
        .env("GIT_CONFIG_GLOBAL", &config)
        .arg("--register")
        .arg(repo.path())
        .assert()
        .success();

    bin()
        .env("GIT_CONFIG_GLOBAL", &config)
        .arg("--register")
        .arg(repo.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already registered"));

    // The entry was not duplicated.
    let stored = fs::read_to_string(&config).unwrap();
    let canonical = repo.path().canonicalize().unwrap();
    let needle = canonical.to_string_lossy();
    assert_eq!(stored.matches(&*needle).count(), 1);
}

#[test]
fn checkall_with_empty_registry_hints_and_succeeds() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("gitconfig");
    fs::write(&config, "").unwrap();

    bin()
        .env("GIT_CONFIG_GLOBAL", &config)
        .arg("--checkall")
        .assert()
        .success()
        .stderr(predicate::str::contains("No repositories registered"));
}

#[test]
fn register_rejects_a_missing_path() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("gitconfig");
    fs::write(&config, "").unwrap();

    bin()
        .env("GIT_CONFIG_GLOBAL", &config)
        .args(["--register", "/no/such/repository/anywhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot resolve"));
}
