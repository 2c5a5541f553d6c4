//! Shared test utilities for marginalia.
//!
//! This module provides common helpers used across multiple test modules.
//! It is only compiled when running tests.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::config::Settings;
use crate::vault::Vault;

/// Creates a temporary vault directory for testing.
///
/// Returns a tuple of (TempDir, PathBuf) where:
/// - TempDir: The temp directory handle (must be kept alive for the test duration)
/// - PathBuf: The path to the vault subdirectory
///
/// On some systems temp directories live under paths like `/tmp/.tmpXXXXX`,
/// so the vault itself is a plain `vault` subdirectory.
///
/// # Example
///
/// ```ignore
/// use crate::test_utils::create_test_vault_dir;
///
/// let (_temp_dir, vault_dir) = create_test_vault_dir();
/// std::fs::write(vault_dir.join("test.md"), "# Test").unwrap();
/// ```
pub fn create_test_vault_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let vault_dir = temp_dir.path().join("vault");
    fs::create_dir(&vault_dir).expect("Failed to create vault subdirectory");
    (temp_dir, vault_dir)
}

/// Creates a test vault from a temporary directory.
///
/// `setup_fn` receives the vault directory and can create files before the
/// vault is constructed with default settings.
///
/// ```ignore
/// use crate::test_utils::create_test_vault;
///
/// let (_temp_dir, vault_dir, vault) = create_test_vault(|dir| {
///     std::fs::write(dir.join("test.md"), "# Test").unwrap();
/// });
/// ```
pub fn create_test_vault<F>(setup_fn: F) -> (TempDir, PathBuf, Vault)
where
    F: FnOnce(&PathBuf),
{
    let (temp_dir, vault_dir) = create_test_vault_dir();
    setup_fn(&vault_dir);
    let settings = Settings::default();
    let vault =
        Vault::construct_vault(&settings, &vault_dir).expect("Failed to construct test vault");
    (temp_dir, vault_dir, vault)
}
