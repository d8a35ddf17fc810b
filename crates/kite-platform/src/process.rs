//! Subprocess helpers.
//!
//! Every external tool the adapters call (`mdfind`, `hdiutil`, `ps`,
//! `tasklist`, `apt`, ...) goes through [`run_command`], which turns a spawn
//! failure or a non-zero exit into a [`KiteError::Process`] carrying the
//! command line and its captured output.

use kite_core::{KiteError, ProcessFailure, Result};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, trace};

/// A command line with its environment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandSpec {
    /// Program to execute.
    pub program: String,
    /// Arguments.
    pub args: Vec<String>,
    /// Variables added to the inherited environment.
    pub env: Vec<(String, String)>,
    /// Variables removed from the inherited environment.
    pub env_remove: Vec<String>,
    /// Working directory.
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    /// Creates a command for `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets an environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Removes an inherited environment variable.
    #[must_use]
    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        self.env_remove.push(key.into());
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Returns the command line as a single string.
    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for key in &self.env_remove {
            cmd.env_remove(key);
        }
        cmd.envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Runs `spec` to completion and returns its standard output.
///
/// `kind` and `message` label the failure, e.g. `("mount_error", "Unable
/// to mount Kite.dmg")`.
///
/// # Errors
/// Returns a process error if the command cannot be spawned or exits with
/// a non-zero status.
pub async fn run_command(spec: &CommandSpec, kind: &str, message: &str) -> Result<String> {
    let cmd_line = spec.display();
    trace!(cmd = %cmd_line, "running command");

    let output = spec
        .command()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            debug!(cmd = %cmd_line, error = %e, "command could not be spawned");
            KiteError::Process(
                ProcessFailure::new(kind, message, &cmd_line).with_output("", e.to_string()),
            )
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if output.status.success() {
        return Ok(stdout);
    }

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    debug!(cmd = %cmd_line, status = %output.status, stderr = %stderr.trim(), "command failed");
    Err(KiteError::Process(
        ProcessFailure::new(kind, message, cmd_line).with_output(stdout, stderr),
    ))
}

/// Starts `spec` without waiting for it, detached from this process.
///
/// # Errors
/// Returns a process error if the command cannot be spawned.
pub fn spawn_detached(spec: &CommandSpec, kind: &str, message: &str) -> Result<u32> {
    let cmd_line = spec.display();
    let mut cmd = spec.command();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    cmd.process_group(0);

    #[cfg(windows)]
    {
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        cmd.creation_flags(DETACHED_PROCESS);
    }

    let child = cmd.spawn().map_err(|e| {
        KiteError::Process(ProcessFailure::new(kind, message, &cmd_line).with_output("", e.to_string()))
    })?;
    let pid = child.id().unwrap_or(0);
    debug!(cmd = %cmd_line, pid, "spawned detached process");
    Ok(pid)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use kite_core::ErrorKind;

    #[test]
    fn test_display() {
        let spec = CommandSpec::new("hdiutil").args(["attach", "-nobrowse", "/tmp/Kite.dmg"]);
        assert_eq!(spec.display(), "hdiutil attach -nobrowse /tmp/Kite.dmg");
    }

    #[tokio::test]
    async fn test_run_command_captures_stdout() {
        let spec = CommandSpec::new("sh").args(["-c", "echo kited"]);
        let stdout = run_command(&spec, "sh_error", "sh failed").await.unwrap();
        assert_eq!(stdout.trim(), "kited");
    }

    #[tokio::test]
    async fn test_run_command_passes_env() {
        let spec = CommandSpec::new("sh")
            .args(["-c", "echo $KITE_TEST_VALUE"])
            .env("KITE_TEST_VALUE", "42");
        let stdout = run_command(&spec, "sh_error", "sh failed").await.unwrap();
        assert_eq!(stdout.trim(), "42");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_process_error() {
        let spec = CommandSpec::new("sh").args(["-c", "echo out; echo oops >&2; exit 3"]);
        let err = run_command(&spec, "sh_error", "sh failed").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProcessError);
        match err {
            KiteError::Process(failure) => {
                assert_eq!(failure.kind, "sh_error");
                assert_eq!(failure.message, "sh failed");
                assert_eq!(failure.stdout.trim(), "out");
                assert_eq!(failure.stderr.trim(), "oops");
                assert!(failure.cmd.starts_with("sh -c"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_process_error() {
        let spec = CommandSpec::new("/nonexistent/kite-tool");
        let err = run_command(&spec, "missing_error", "no such tool").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProcessError);
    }

    #[tokio::test]
    async fn test_spawn_detached() {
        let spec = CommandSpec::new("sh").args(["-c", "exit 0"]);
        assert!(spawn_detached(&spec, "sh_error", "sh failed").unwrap() > 0);
        assert!(spawn_detached(&CommandSpec::new("/nonexistent/kited"), "run_error", "x").is_err());
    }
}
