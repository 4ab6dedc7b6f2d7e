//! Host command execution.
//!
//! Neighbor tables come from host tools rather than the databases. The
//! [`HostCommand`] seam returns raw stdout; parsing belongs to the handler
//! that issued the command.

use crate::error::{ShowError, ShowResult};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Path to the `arp` command.
pub const ARP_CMD: &str = "/usr/sbin/arp";

/// Path to the `ip` command.
pub const IP_CMD: &str = "/bin/ip";

/// Path to the shell used to run command lines.
pub const SH_CMD: &str = "/bin/sh";

/// Characters that need escaping inside shell double quotes.
static SHELL_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([$`"\\\n])"#).expect("Invalid regex pattern"));

/// Quotes a caller-supplied word for a shell command line.
pub fn shellquote(s: &str) -> String {
    let escaped = SHELL_ESCAPE_RE.replace_all(s, r"\$1");
    format!("\"{}\"", escaped)
}

/// Runs a command line on the host and returns its stdout.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HostCommand: Send + Sync {
    async fn run(&self, command: &str) -> ShowResult<String>;
}

/// [`HostCommand`] backed by `/bin/sh -c`.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    timeout: Duration,
}

impl ShellRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl HostCommand for ShellRunner {
    #[instrument(skip(self))]
    async fn run(&self, command: &str) -> ShowResult<String> {
        debug!(command, "Executing host command");

        let child = Command::new(SH_CMD)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| {
                ShowError::host_command(
                    command,
                    format!("timed out after {}s", self.timeout.as_secs()),
                )
            })?
            .map_err(|e| ShowError::host_command(command, e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ShowError::host_command(
                command,
                format!("{}: {}", output.status, stderr.trim()),
            ));
        }

        debug!(command, bytes = stdout.len(), "Host command completed");
        Ok(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shellquote() {
        assert_eq!(shellquote("Ethernet0"), "\"Ethernet0\"");
        assert_eq!(shellquote("a$b"), "\"a\\$b\"");
        assert_eq!(shellquote("`id`"), "\"\\`id\\`\"");
    }

    #[tokio::test]
    async fn test_shell_runner_stdout() {
        let runner = ShellRunner::new(Duration::from_secs(5));
        let out = runner.run("echo 10.0.0.1 ether").await.unwrap();
        assert_eq!(out, "10.0.0.1 ether\n");
    }

    #[tokio::test]
    async fn test_shell_runner_nonzero_exit() {
        let runner = ShellRunner::new(Duration::from_secs(5));
        let err = runner.run("echo oops >&2; exit 3").await.unwrap_err();
        match err {
            ShowError::HostCommand { message, .. } => assert!(message.contains("oops")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_mock_host_command() {
        let mut mock = MockHostCommand::new();
        mock.expect_run()
            .withf(|cmd| cmd.to_string() == "/usr/sbin/arp -n")
            .times(1)
            .returning(|_| Ok(String::new()));
        assert_eq!(mock.run("/usr/sbin/arp -n").await.unwrap(), "");
    }
}
