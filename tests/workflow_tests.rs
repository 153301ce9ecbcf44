//! Integration tests for the encrypt, view and edit workflows.
//!
//! Prompts and the editor are replaced by scripted stand-ins so every
//! path, including cancellation and editor failures, runs without a TTY.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vaultkit::cli::commands::edit::{self, EditOutcome};
use vaultkit::cli::commands::{encrypt, view};
use vaultkit::cli::editor::Editor;
use vaultkit::cli::prompt::Prompter;
use vaultkit::config::Settings;
use vaultkit::crypto::kdf::MIN_MEMORY_KIB;
use vaultkit::crypto::CipherFormat;
use vaultkit::errors::{Result, VaultKitError};
use zeroize::Zeroizing;

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Answers prompts from a fixed script and records how many were asked.
struct Script {
    passwords: RefCell<VecDeque<&'static str>>,
    confirmations: RefCell<VecDeque<bool>>,
}

impl Script {
    fn new(passwords: &[&'static str], confirmations: &[bool]) -> Self {
        Self {
            passwords: RefCell::new(passwords.iter().copied().collect()),
            confirmations: RefCell::new(confirmations.iter().copied().collect()),
        }
    }

    fn unused_passwords(&self) -> usize {
        self.passwords.borrow().len()
    }
}

impl Prompter for Script {
    fn password(&self, _prompt: &str) -> Result<Zeroizing<String>> {
        let next = self
            .passwords
            .borrow_mut()
            .pop_front()
            .expect("unexpected password prompt");
        Ok(Zeroizing::new(next.to_string()))
    }

    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(self
            .confirmations
            .borrow_mut()
            .pop_front()
            .expect("unexpected confirmation prompt"))
    }
}

/// What the fake editor does to the file it is handed.
enum Action {
    Replace(&'static str),
    Keep,
    Fail,
}

/// Stands in for the external editor and remembers the path it saw.
struct FakeEditor {
    action: Action,
    seen: RefCell<Option<PathBuf>>,
}

impl FakeEditor {
    fn new(action: Action) -> Self {
        Self {
            action,
            seen: RefCell::new(None),
        }
    }

    fn seen_path(&self) -> PathBuf {
        self.seen.borrow().clone().expect("editor was not invoked")
    }
}

impl Editor for FakeEditor {
    fn edit(&self, path: &Path) -> Result<()> {
        *self.seen.borrow_mut() = Some(path.to_path_buf());
        match self.action {
            Action::Replace(content) => {
                fs::write(path, content)?;
                Ok(())
            }
            Action::Keep => Ok(()),
            Action::Fail => Err(VaultKitError::EditorInvocation(
                "editor exited with code 1".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A temp dir holding `all.vault.yml` with `contents`.
fn secret_file(contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("all.vault.yml");
    fs::write(&path, contents).expect("write secret file");
    (dir, path)
}

/// Encrypt `path` with `password` through the encrypt workflow.
fn encrypt_with(path: &Path, settings: &Settings, password: &'static str) {
    let script = Script::new(&[password, password], &[]);
    encrypt::run(path, settings, &script).expect("encrypt workflow");
}

fn sealed_settings() -> Settings {
    Settings {
        format: CipherFormat::Sealed,
        argon2_memory_kib: MIN_MEMORY_KIB,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..Settings::default()
    }
}

// ---------------------------------------------------------------------------
// Encrypt
// ---------------------------------------------------------------------------

#[test]
fn encrypt_then_view_returns_original_content() {
    let (_dir, path) = secret_file("db_password: secret123\n");
    let settings = Settings::default();

    encrypt_with(&path, &settings, "correct-horse");

    let on_disk = fs::read(&path).unwrap();
    assert!(on_disk.starts_with(b"$ANSIBLE_VAULT;1.1;AES256\n"));
    assert!(!String::from_utf8_lossy(&on_disk).contains("secret123"));

    let plain = view::run(&path, &settings, &Script::new(&["correct-horse"], &[])).unwrap();
    assert_eq!(plain.as_slice(), b"db_password: secret123\n");
}

#[test]
fn encrypt_writes_vault_id_header_when_configured() {
    let (_dir, path) = secret_file("token: abc\n");
    let settings = Settings {
        vault_id: Some("prod".into()),
        ..Settings::default()
    };

    encrypt_with(&path, &settings, "pw");

    assert!(fs::read(&path)
        .unwrap()
        .starts_with(b"$ANSIBLE_VAULT;1.2;AES256;prod\n"));
}

#[test]
fn encrypt_with_sealed_format() {
    let (_dir, path) = secret_file("db_password: secret123\n");
    let settings = sealed_settings();

    encrypt_with(&path, &settings, "correct-horse");
    assert_eq!(
        CipherFormat::detect(&fs::read(&path).unwrap()),
        Some(CipherFormat::Sealed)
    );

    // Viewing does not depend on the configured format.
    let plain = view::run(&path, &Settings::default(), &Script::new(&["correct-horse"], &[]))
        .unwrap();
    assert_eq!(plain.as_slice(), b"db_password: secret123\n");
}

#[test]
fn encrypt_missing_file_fails_before_prompting() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("all.vault.yml");
    let script = Script::new(&["pw", "pw"], &[]);

    let result = encrypt::run(&path, &Settings::default(), &script);
    assert!(matches!(result, Err(VaultKitError::MissingFile(p)) if p == path));
    assert_eq!(script.unused_passwords(), 2);
}

#[test]
fn encrypt_password_mismatch_leaves_file_alone() {
    let (_dir, path) = secret_file("db_password: secret123\n");
    let script = Script::new(&["one", "two"], &[]);

    let result = encrypt::run(&path, &Settings::default(), &script);
    assert!(matches!(result, Err(VaultKitError::PasswordMismatch)));
    assert_eq!(fs::read_to_string(&path).unwrap(), "db_password: secret123\n");
}

#[test]
fn encrypt_empty_password_leaves_file_alone() {
    let (_dir, path) = secret_file("db_password: secret123\n");
    let script = Script::new(&["", ""], &[]);

    let result = encrypt::run(&path, &Settings::default(), &script);
    assert!(matches!(result, Err(VaultKitError::EmptyPassword)));
    assert_eq!(fs::read_to_string(&path).unwrap(), "db_password: secret123\n");
}

#[test]
fn encrypt_refuses_an_encrypted_file() {
    let (_dir, path) = secret_file("db_password: secret123\n");
    encrypt_with(&path, &Settings::default(), "pw");
    let before = fs::read(&path).unwrap();

    let script = Script::new(&["pw", "pw"], &[]);
    let result = encrypt::run(&path, &Settings::default(), &script);

    assert!(matches!(result, Err(VaultKitError::AlreadyEncrypted(_))));
    assert_eq!(fs::read(&path).unwrap(), before);
    assert_eq!(script.unused_passwords(), 0);
}

/// Password errors win over anything reading the file could report.
#[cfg(unix)]
#[test]
fn password_errors_come_before_reading_the_file() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, path) = secret_file("db_password: secret123\n");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

    let encrypt_blank = encrypt::run(&path, &Settings::default(), &Script::new(&[""], &[]));
    assert!(matches!(encrypt_blank, Err(VaultKitError::EmptyPassword)));

    let encrypt_mismatch =
        encrypt::run(&path, &Settings::default(), &Script::new(&["one", "two"], &[]));
    assert!(matches!(encrypt_mismatch, Err(VaultKitError::PasswordMismatch)));

    let view_blank = view::run(&path, &Settings::default(), &Script::new(&[""], &[]));
    assert!(matches!(view_blank, Err(VaultKitError::EmptyPassword)));

    let editor = FakeEditor::new(Action::Keep);
    let edit_blank = edit::run(&path, &Settings::default(), &Script::new(&[""], &[]), &editor);
    assert!(matches!(edit_blank, Err(VaultKitError::EmptyPassword)));

    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "db_password: secret123\n");
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

#[test]
fn view_with_wrong_password_fails_and_leaves_file_unchanged() {
    let (_dir, path) = secret_file("db_password: secret123\n");
    encrypt_with(&path, &Settings::default(), "correct-horse");
    let before = fs::read(&path).unwrap();

    let result = view::run(&path, &Settings::default(), &Script::new(&["wrong-pw"], &[]));

    let err = result.unwrap_err();
    assert!(matches!(err, VaultKitError::Authentication));
    assert!(err.is_decryption_failure());
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn view_rejects_empty_password() {
    let (_dir, path) = secret_file("db_password: secret123\n");
    encrypt_with(&path, &Settings::default(), "pw");

    let result = view::run(&path, &Settings::default(), &Script::new(&[""], &[]));
    assert!(matches!(result, Err(VaultKitError::EmptyPassword)));
}

#[test]
fn view_plaintext_file_is_format_error() {
    let (_dir, path) = secret_file("db_password: secret123\n");
    let script = Script::new(&["pw"], &[]);

    let result = view::run(&path, &Settings::default(), &script);
    assert!(matches!(result, Err(VaultKitError::Format(_))));
    assert_eq!(script.unused_passwords(), 0);
}

#[test]
fn view_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = view::run(
        &dir.path().join("nope.yml"),
        &Settings::default(),
        &Script::new(&["pw"], &[]),
    );
    assert!(matches!(result, Err(VaultKitError::MissingFile(_))));
}

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

#[test]
fn edit_confirmed_saves_new_content() {
    let (_dir, path) = secret_file("db_password: secret123\n");
    let settings = Settings::default();
    encrypt_with(&path, &settings, "correct-horse");

    let editor = FakeEditor::new(Action::Replace("db_password: newsecret\n"));
    let outcome = edit::run(
        &path,
        &settings,
        &Script::new(&["correct-horse"], &[true]),
        &editor,
    )
    .unwrap();

    assert_eq!(outcome, EditOutcome::Saved);
    assert!(!editor.seen_path().exists(), "scratch file must be removed");

    let plain = view::run(&path, &settings, &Script::new(&["correct-horse"], &[])).unwrap();
    assert_eq!(plain.as_slice(), b"db_password: newsecret\n");
}

#[test]
fn edit_declined_leaves_file_byte_identical() {
    let (_dir, path) = secret_file("db_password: secret123\n");
    encrypt_with(&path, &Settings::default(), "correct-horse");
    let before = fs::read(&path).unwrap();

    let editor = FakeEditor::new(Action::Replace("db_password: newsecret\n"));
    let outcome = edit::run(
        &path,
        &Settings::default(),
        &Script::new(&["correct-horse"], &[false]),
        &editor,
    )
    .unwrap();

    assert_eq!(outcome, EditOutcome::Discarded);
    assert_eq!(fs::read(&path).unwrap(), before);
    assert!(!editor.seen_path().exists());
}

#[test]
fn edit_without_changes_still_reencrypts_with_fresh_salt() {
    let (_dir, path) = secret_file("db_password: secret123\n");
    encrypt_with(&path, &Settings::default(), "pw");
    let before = fs::read(&path).unwrap();

    let editor = FakeEditor::new(Action::Keep);
    let outcome = edit::run(
        &path,
        &Settings::default(),
        &Script::new(&["pw"], &[true]),
        &editor,
    )
    .unwrap();

    assert_eq!(outcome, EditOutcome::Saved);
    let after = fs::read(&path).unwrap();
    assert_ne!(after, before);

    let plain = view::run(&path, &Settings::default(), &Script::new(&["pw"], &[])).unwrap();
    assert_eq!(plain.as_slice(), b"db_password: secret123\n");
}

#[test]
fn edit_editor_failure_cleans_up_and_keeps_file() {
    let (_dir, path) = secret_file("db_password: secret123\n");
    encrypt_with(&path, &Settings::default(), "pw");
    let before = fs::read(&path).unwrap();

    let editor = FakeEditor::new(Action::Fail);
    let result = edit::run(&path, &Settings::default(), &Script::new(&["pw"], &[]), &editor);

    assert!(matches!(result, Err(VaultKitError::EditorInvocation(_))));
    assert!(!editor.seen_path().exists(), "scratch file leaked after editor failure");
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn edit_wrong_password_never_starts_editor() {
    let (_dir, path) = secret_file("db_password: secret123\n");
    encrypt_with(&path, &Settings::default(), "pw");
    let before = fs::read(&path).unwrap();

    let editor = FakeEditor::new(Action::Keep);
    let result = edit::run(
        &path,
        &Settings::default(),
        &Script::new(&["nope"], &[]),
        &editor,
    );

    assert!(matches!(result, Err(VaultKitError::Authentication)));
    assert!(editor.seen.borrow().is_none());
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn edit_save_failure_still_removes_scratch_file() {
    let (dir, path) = secret_file("db_password: secret123\n");
    encrypt_with(&path, &Settings::default(), "pw");

    // The editor deletes the whole directory, so writing the new vault
    // back fails after the scratch file has been handled.
    struct Vandal<'a>(&'a Path, RefCell<Option<PathBuf>>);
    impl Editor for Vandal<'_> {
        fn edit(&self, path: &Path) -> Result<()> {
            *self.1.borrow_mut() = Some(path.to_path_buf());
            fs::remove_dir_all(self.0)?;
            Ok(())
        }
    }

    let editor = Vandal(dir.path(), RefCell::new(None));
    let result = edit::run(&path, &Settings::default(), &Script::new(&["pw"], &[true]), &editor);

    assert!(result.is_err());
    let scratch = editor.1.borrow().clone().unwrap();
    assert!(!scratch.exists());
}

#[test]
fn edit_preserves_sealed_format_and_vault_id() {
    // Sealed stays sealed even when the settings say ansible.
    let (_dir, path) = secret_file("a: 1\n");
    encrypt_with(&path, &sealed_settings(), "pw");
    edit::run(
        &path,
        &sealed_settings(),
        &Script::new(&["pw"], &[true]),
        &FakeEditor::new(Action::Replace("a: 2\n")),
    )
    .unwrap();
    assert_eq!(
        CipherFormat::detect(&fs::read(&path).unwrap()),
        Some(CipherFormat::Sealed)
    );

    // A labelled Ansible vault keeps its label.
    let (_dir2, labelled) = secret_file("b: 1\n");
    let prod = Settings {
        vault_id: Some("prod".into()),
        ..Settings::default()
    };
    encrypt_with(&labelled, &prod, "pw");
    edit::run(
        &labelled,
        &Settings::default(),
        &Script::new(&["pw"], &[true]),
        &FakeEditor::new(Action::Replace("b: 2\n")),
    )
    .unwrap();
    assert!(fs::read(&labelled)
        .unwrap()
        .starts_with(b"$ANSIBLE_VAULT;1.2;AES256;prod\n"));
}

#[test]
fn edit_empty_password_is_rejected() {
    let (_dir, path) = secret_file("db_password: secret123\n");
    encrypt_with(&path, &Settings::default(), "pw");

    let editor = FakeEditor::new(Action::Keep);
    let result = edit::run(&path, &Settings::default(), &Script::new(&[""], &[]), &editor);
    assert!(matches!(result, Err(VaultKitError::EmptyPassword)));
    assert!(editor.seen.borrow().is_none());
}
