//! Read-patch-write helpers over a [`RemoteShell`].

use anyhow::{Context, Result};

use crate::application::ports::{RemoteShell, Visibility, run_checked};

/// Content of a remote file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub async fn read(shell: &impl RemoteShell, path: &str) -> Result<String> {
    run_checked(shell, &format!("cat {path}"), Visibility::Hidden)
        .await
        .with_context(|| format!("reading {path} on {}", shell.host()))
}

/// Prints the file when it exists; exits 0 with no output when it does not.
/// Any other failure (unreadable file, dropped connection) exits non-zero.
#[must_use]
pub fn cat_if_present_command(path: &str) -> String {
    format!("if [ -e {path} ]; then cat {path}; fi")
}

/// Prints `present` when a regular file exists at `path`.
#[must_use]
pub fn file_present_command(path: &str) -> String {
    format!("if [ -f {path} ]; then echo present; fi")
}

/// Content of a remote file, or an empty string when it does not exist yet.
///
/// # Errors
///
/// Returns an error if the transport fails or the file exists but cannot be
/// read.
pub async fn read_or_empty(shell: &impl RemoteShell, path: &str) -> Result<String> {
    run_checked(shell, &cat_if_present_command(path), Visibility::Hidden)
        .await
        .with_context(|| format!("reading {path} on {}", shell.host()))
}

/// Whether a regular file exists on the remote host.
///
/// # Errors
///
/// Returns an error if the check itself fails.
pub async fn exists(shell: &impl RemoteShell, path: &str) -> Result<bool> {
    let stdout = run_checked(shell, &file_present_command(path), Visibility::Hidden)
        .await
        .with_context(|| format!("checking {path} on {}", shell.host()))?;
    Ok(stdout.trim() == "present")
}

/// Apply `edit` to a remote file and write the result back when it changed.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written.
pub async fn patch(
    shell: &impl RemoteShell,
    path: &str,
    privileged: bool,
    edit: impl FnOnce(&str) -> String,
) -> Result<()> {
    let existing = read_or_empty(shell, path).await?;
    let updated = edit(&existing);
    if updated == existing {
        tracing::debug!(host = shell.host(), path, "unchanged");
        return Ok(());
    }
    shell
        .write_file(path, &updated, privileged)
        .await
        .with_context(|| format!("writing {path} on {}", shell.host()))
}
