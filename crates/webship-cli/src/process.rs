//! External process runner
//!
//! Runs build and git commands with inherited stdio, judging success
//! solely by the exit code. Cancellation kills the child and surfaces as
//! the cancellation error kind, not a generic failure.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use webship_core::domain::DeployError;

/// Splits a configured command line on whitespace into program and
/// arguments. Returns `None` for a blank command.
pub fn split_command(command: &str) -> Option<(String, Vec<String>)> {
    let mut parts = command.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

/// Spawns child processes and waits for them, one at a time
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Runs `program` with `args` in `cwd`, streaming output to the
    /// console. Non-zero exit is an error naming the command; a fired
    /// cancellation token kills the child and returns
    /// [`DeployError::Cancelled`].
    pub async fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let command_line = if args.is_empty() {
            program.to_string()
        } else {
            format!("{} {}", program, args.join(" "))
        };
        debug!(command = %command_line, cwd = %cwd.display(), "Running process");

        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(std::process::Stdio::null())
            .spawn()
            .with_context(|| format!("failed to start '{command_line}'"))?;

        tokio::select! {
            status = child.wait() => {
                let status = status.with_context(|| format!("waiting for '{command_line}'"))?;
                if !status.success() {
                    match status.code() {
                        Some(code) => bail!("'{command_line}' exited with code {code}"),
                        None => bail!("'{command_line}' was terminated by a signal"),
                    }
                }
                Ok(())
            }
            _ = cancel.cancelled() => {
                let _ = child.kill().await;
                Err(DeployError::Cancelled.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_command_separates_program_and_args() {
        assert_eq!(
            split_command("npx quasar build"),
            Some(("npx".to_string(), vec!["quasar".to_string(), "build".to_string()]))
        );
        assert_eq!(split_command("make"), Some(("make".to_string(), vec![])));
        assert_eq!(split_command("   "), None);
    }

    #[tokio::test]
    async fn run_succeeds_on_zero_exit() {
        let runner = ProcessRunner::new();
        let cancel = CancellationToken::new();
        runner
            .run("sh", &["-c", "exit 0"], Path::new("."), &cancel)
            .await
            .expect("zero exit should succeed");
    }

    #[tokio::test]
    async fn run_fails_on_nonzero_exit_naming_the_command() {
        let runner = ProcessRunner::new();
        let cancel = CancellationToken::new();
        let err = runner
            .run("sh", &["-c", "exit 3"], Path::new("."), &cancel)
            .await
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("exit 3"));
        assert!(text.contains("code 3"));
    }

    #[tokio::test]
    async fn run_maps_cancellation_to_its_own_kind() {
        let runner = ProcessRunner::new();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = runner
            .run("sh", &["-c", "sleep 30"], Path::new("."), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeployError>(),
            Some(DeployError::Cancelled)
        ));
    }
}
