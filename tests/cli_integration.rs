//! Integration tests for the three vaultkit binaries.
//!
//! Password prompts need a terminal, so these stick to cases that fail
//! or finish before any prompt is shown: help and version output, path
//! resolution, missing files and config errors.  The file-state checks
//! that follow the prompt are covered in `workflow_tests.rs`.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const TOOLS: [&str; 3] = ["encrypt-vault", "view-vault", "edit-vault"];

/// Helper: a Command for `bin` running inside `dir` with a clean env.
fn tool(bin: &str, dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin(bin).expect("binary should exist");
    cmd.current_dir(dir.path())
        .env_remove("VAULTKIT_FILE")
        .env_remove("VAULTKIT_LOG")
        .env("EDITOR", "true");
    cmd
}

#[test]
fn help_describes_each_tool() {
    let dir = TempDir::new().unwrap();
    let abouts = [
        ("encrypt-vault", "Encrypt a plaintext secrets file"),
        ("view-vault", "print its contents"),
        ("edit-vault", "re-encrypt it on save"),
    ];

    for (bin, about) in abouts {
        tool(bin, &dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(about))
            .stdout(predicate::str::contains("--file"))
            .stdout(predicate::str::contains("--password").not());
    }
}

#[test]
fn version_flag_shows_version() {
    let dir = TempDir::new().unwrap();
    for bin in TOOLS {
        tool(bin, &dir)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }
}

#[test]
fn password_flag_is_rejected() {
    let dir = TempDir::new().unwrap();
    for bin in TOOLS {
        tool(bin, &dir)
            .args(["--password", "hunter2"])
            .assert()
            .failure();
    }
}

#[test]
fn missing_default_file_fails_with_its_path() {
    let dir = TempDir::new().unwrap();
    for bin in TOOLS {
        tool(bin, &dir)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("all.vault.yml not found"));
    }
}

#[test]
fn missing_explicit_file_fails() {
    let dir = TempDir::new().unwrap();
    tool("view-vault", &dir)
        .args(["--file", "secrets/prod.yml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("prod.yml not found"));
}

#[test]
fn file_env_var_selects_the_secret_file() {
    let dir = TempDir::new().unwrap();
    tool("edit-vault", &dir)
        .env("VAULTKIT_FILE", "from-env.yml")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("from-env.yml not found"));
}

#[test]
fn config_file_sets_the_secret_path() {
    let dir = TempDir::new().unwrap();
    dir.child("vaultkit.toml")
        .write_str("vault_file = \"group_vars/secrets.yml\"\n")
        .unwrap();

    tool("view-vault", &dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("secrets.yml not found"));
}

#[test]
fn file_flag_beats_config_file() {
    let dir = TempDir::new().unwrap();
    dir.child("vaultkit.toml")
        .write_str("vault_file = \"group_vars/secrets.yml\"\n")
        .unwrap();

    tool("view-vault", &dir)
        .args(["-f", "override.yml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("override.yml not found"));
}

#[test]
fn unknown_config_key_is_reported() {
    let dir = TempDir::new().unwrap();
    dir.child("vaultkit.toml").write_str("colour = \"red\"\n").unwrap();

    tool("view-vault", &dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Config file error"));
}

#[test]
fn missing_explicit_config_is_reported() {
    let dir = TempDir::new().unwrap();
    tool("encrypt-vault", &dir)
        .args(["--config", "nope.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nope.toml"));
}
