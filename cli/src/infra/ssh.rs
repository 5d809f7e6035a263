//! Infrastructure implementation of the remote shell ports over OpenSSH.
//!
//! Each session is an OpenSSH control master bound to one host; commands are
//! multiplexed over its control socket, which lives in a private temporary
//! directory removed when the session closes.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::application::ports::{CommandRunner, RemoteShell, SessionOpener, Visibility};
use crate::domain::CommandError;
use crate::domain::text::shell_quote;

/// Opens control-master sessions authenticated with the provider key.
pub struct OpenSshOpener<R: CommandRunner + Clone> {
    runner: R,
    key_path: PathBuf,
    user: String,
    /// Echo captured stdout of `Visibility::Shown` commands.
    echo: bool,
}

impl<R: CommandRunner + Clone> OpenSshOpener<R> {
    pub fn new(runner: R, key_path: PathBuf, user: &str, echo: bool) -> Self {
        Self {
            runner,
            key_path,
            user: user.to_string(),
            echo,
        }
    }
}

/// Options shared by every invocation of one session.
fn common_options(socket: &Path, known_hosts: &Path) -> Vec<String> {
    vec![
        "-S".to_string(),
        socket.display().to_string(),
        "-o".to_string(),
        "BatchMode=yes".to_string(),
        "-o".to_string(),
        "StrictHostKeyChecking=accept-new".to_string(),
        "-o".to_string(),
        format!("UserKnownHostsFile={}", known_hosts.display()),
    ]
}

impl<R: CommandRunner + Clone> SessionOpener for OpenSshOpener<R> {
    type Session = OpenSshSession<R>;

    async fn open(&self, host: &str) -> Result<Self::Session> {
        let dir = tempfile::Builder::new()
            .prefix("sparkctl-ssh-")
            .tempdir()
            .context("creating control socket directory")?;
        let socket = dir.path().join("control");
        let known_hosts = dir.path().join("known_hosts");
        let target = format!("{}@{host}", self.user);
        let key = self.key_path.display().to_string();

        let mut args = common_options(&socket, &known_hosts);
        args.extend(
            [
                "-M",
                "-f",
                "-N",
                "-o",
                "ControlPersist=10m",
                "-o",
                "ConnectTimeout=30",
                "-i",
                key.as_str(),
                target.as_str(),
            ]
            .map(String::from),
        );
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        tracing::debug!(%target, "opening ssh session");
        let output = self
            .runner
            .run("ssh", &arg_refs)
            .await
            .with_context(|| format!("connecting to {target}"))?;
        anyhow::ensure!(
            output.status.success(),
            "cannot connect to {target}: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );

        Ok(OpenSshSession {
            runner: self.runner.clone(),
            host: host.to_string(),
            target,
            socket,
            known_hosts,
            echo: self.echo,
            _dir: dir,
        })
    }
}

/// A live control-master session with one host.
pub struct OpenSshSession<R: CommandRunner> {
    runner: R,
    host: String,
    target: String,
    socket: PathBuf,
    known_hosts: PathBuf,
    echo: bool,
    _dir: TempDir,
}

impl<R: CommandRunner> OpenSshSession<R> {
    fn args(&self, command: &str) -> Vec<String> {
        let mut args = common_options(&self.socket, &self.known_hosts);
        args.extend([self.target.clone(), "--".to_string(), command.to_string()]);
        args
    }

    async fn execute(&self, command: &str, visibility: Visibility) -> Result<Output> {
        tracing::debug!(host = %self.host, command, "remote");
        let args = self.args(command);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self
            .runner
            .run("ssh", &arg_refs)
            .await
            .with_context(|| format!("running `{command}` on {}", self.host))?;
        if visibility == Visibility::Shown && self.echo && !output.stdout.is_empty() {
            let mut stdout = std::io::stdout().lock();
            let _ = stdout.write_all(&output.stdout);
            let _ = stdout.flush();
        }
        Ok(output)
    }
}

/// Wrap `command` so it runs as root with root's environment.
fn privileged(command: &str) -> String {
    format!("sudo -H bash -c {}", shell_quote(command))
}

fn write_command(path: &str, privileged: bool) -> String {
    if privileged {
        format!("sudo tee {path} >/dev/null")
    } else {
        format!("cat > {path}")
    }
}

impl<R: CommandRunner> RemoteShell for OpenSshSession<R> {
    fn host(&self) -> &str {
        &self.host
    }

    async fn run(&self, command: &str, visibility: Visibility) -> Result<Output> {
        self.execute(command, visibility).await
    }

    async fn sudo(&self, command: &str, visibility: Visibility) -> Result<Output> {
        self.execute(&privileged(command), visibility).await
    }

    async fn write_file(&self, path: &str, contents: &str, privileged: bool) -> Result<()> {
        let command = write_command(path, privileged);
        tracing::debug!(host = %self.host, path, bytes = contents.len(), "writing file");
        let args = self.args(&command);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self
            .runner
            .run_with_stdin("ssh", &arg_refs, contents.as_bytes())
            .await
            .with_context(|| format!("writing {path} on {}", self.host))?;
        if output.status.success() {
            return Ok(());
        }
        Err(CommandError {
            host: self.host.clone(),
            command,
            code: output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string()),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
        .into())
    }

    async fn close(self) -> Result<()> {
        let mut args = common_options(&self.socket, &self.known_hosts);
        args.extend(["-O".to_string(), "exit".to_string(), self.target.clone()]);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        match self.runner.run("ssh", &arg_refs).await {
            Ok(output) if output.status.success() => {}
            Ok(output) => tracing::warn!(
                host = %self.host,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "control master did not exit cleanly"
            ),
            Err(e) => tracing::warn!(host = %self.host, error = %e, "closing ssh session"),
        }
        Ok(())
    }
}
