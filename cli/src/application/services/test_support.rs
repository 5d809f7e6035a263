//! Shared test doubles for application service tests.
//!
//! `FakeShell` keeps an in-memory file table so read-patch-write sequences
//! can be asserted on the resulting file content.

use std::cell::RefCell;
use std::collections::HashMap;
use std::process::Output;

use anyhow::Result;

use crate::application::ports::{ProgressReporter, RemoteShell, Visibility};

/// Build an `ExitStatus` from a logical exit code.
#[cfg(unix)]
pub fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    std::process::ExitStatus::from_raw(code as u32)
}

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn fail_output(stderr: &[u8]) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

pub const FAKE_CLUSTER_KEY: &str = "ssh-rsa AAAAB3NzaFAKE ubuntu@master";

/// A remote shell over an in-memory file table.
///
/// - `cat <path>` returns the file or fails when absent
/// - `if [ -e <path> ]` guards print the file or nothing
/// - `if [ -f <path> ]` guards print `present` when the file exists
/// - any command mentioning `ssh-keygen` creates the cluster key pair
/// - commands starting with a registered prefix return canned stdout
/// - commands starting with a failing prefix exit 1
/// - everything else succeeds silently
#[derive(Default)]
pub struct FakeShell {
    pub host: String,
    pub files: RefCell<HashMap<String, String>>,
    /// `(privileged, command)` in call order.
    pub log: RefCell<Vec<(bool, String)>>,
    pub responses: Vec<(String, String)>,
    pub failing: Vec<String>,
}

impl FakeShell {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            ..Self::default()
        }
    }

    pub fn with_file(self, path: &str, contents: &str) -> Self {
        self.files
            .borrow_mut()
            .insert(path.to_string(), contents.to_string());
        self
    }

    pub fn respond(mut self, prefix: &str, stdout: &str) -> Self {
        self.responses.push((prefix.to_string(), stdout.to_string()));
        self
    }

    pub fn fail_on(mut self, prefix: &str) -> Self {
        self.failing.push(prefix.to_string());
        self
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }

    pub fn commands(&self) -> Vec<String> {
        self.log.borrow().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.log.borrow().iter().any(|(_, c)| c.contains(needle))
    }

    fn execute(&self, command: &str, privileged: bool) -> Output {
        self.log
            .borrow_mut()
            .push((privileged, command.to_string()));
        if self.failing.iter().any(|p| command.starts_with(p.as_str())) {
            return fail_output(b"simulated failure");
        }
        if let Some(path) = command.strip_prefix("cat ") {
            return match self.files.borrow().get(path.trim()) {
                Some(content) => ok_output(content.as_bytes()),
                None => fail_output(b"No such file or directory"),
            };
        }
        if let Some((path, _)) = command
            .strip_prefix("if [ -e ")
            .and_then(|rest| rest.split_once(" ]"))
        {
            let content = self.files.borrow().get(path).cloned().unwrap_or_default();
            return ok_output(content.as_bytes());
        }
        if let Some((path, _)) = command
            .strip_prefix("if [ -f ")
            .and_then(|rest| rest.split_once(" ]"))
        {
            return if self.files.borrow().contains_key(path) {
                ok_output(b"present\n")
            } else {
                ok_output(b"")
            };
        }
        if command.contains("ssh-keygen") {
            let mut files = self.files.borrow_mut();
            files.insert("~/.ssh/cluster-key".to_string(), "PRIVATE".to_string());
            files.insert(
                "~/.ssh/cluster-key.pub".to_string(),
                format!("{FAKE_CLUSTER_KEY}\n"),
            );
        }
        for (prefix, stdout) in &self.responses {
            if command.starts_with(prefix.as_str()) {
                return ok_output(stdout.as_bytes());
            }
        }
        ok_output(b"")
    }
}

impl RemoteShell for FakeShell {
    fn host(&self) -> &str {
        &self.host
    }

    async fn run(&self, command: &str, _: Visibility) -> Result<Output> {
        Ok(self.execute(command, false))
    }

    async fn sudo(&self, command: &str, _: Visibility) -> Result<Output> {
        Ok(self.execute(command, true))
    }

    async fn write_file(&self, path: &str, contents: &str, _: bool) -> Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_string(), contents.to_string());
        Ok(())
    }

    async fn close(self) -> Result<()> {
        Ok(())
    }
}

/// Reporter that records warnings and drops everything else.
#[derive(Default)]
pub struct ReporterStub {
    pub warnings: RefCell<Vec<String>>,
}

impl ProgressReporter for ReporterStub {
    fn step(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, message: &str) {
        self.warnings.borrow_mut().push(message.to_string());
    }
}
