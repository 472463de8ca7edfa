// ABOUTME: Thin async wrapper around the `az` executable.
// ABOUTME: Captures stdout/stderr and decodes JSON output.

use serde::de::DeserializeOwned;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Errors from invoking `az`.
#[derive(Debug, thiserror::Error)]
pub enum AzError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("`az {command}` failed: {message}")]
    Failed { command: String, message: String },

    #[error("unexpected output from `az {command}`: {source}")]
    Parse {
        command: String,
        source: serde_json::Error,
    },
}

/// Captured result of one `az` invocation.
#[derive(Debug, Clone)]
pub struct AzOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl AzOutput {
    /// Text describing a failure: stderr when present, else stdout.
    pub fn error_text(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// Runs `az` subcommands, optionally pinned to a subscription.
#[derive(Debug, Clone)]
pub struct AzCli {
    program: PathBuf,
    subscription: Option<String>,
}

impl AzCli {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("az"),
            subscription: None,
        }
    }

    /// Use a different executable (tests point this at a stub script).
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_subscription(mut self, subscription: Option<String>) -> Self {
        self.subscription = subscription;
        self
    }

    /// Run `az <args>` without adding `--subscription`.
    pub async fn run<I, S>(&self, args: I) -> Result<AzOutput, AzError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args
            .into_iter()
            .map(|a| a.as_ref().to_os_string())
            .collect();
        let command = display_args(&args);
        tracing::debug!(%command, "running az");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| AzError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let result = AzOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !result.success {
            tracing::debug!(%command, exit_code = ?result.exit_code, "az command failed");
        }
        Ok(result)
    }

    /// Run `az <args> [--subscription S]` for commands scoped to a subscription.
    pub async fn run_scoped<I, S>(&self, args: I) -> Result<AzOutput, AzError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut args: Vec<_> = args
            .into_iter()
            .map(|a| a.as_ref().to_os_string())
            .collect();
        if let Some(subscription) = &self.subscription {
            args.push("--subscription".into());
            args.push(subscription.into());
        }
        self.run(args).await
    }

    /// Run a scoped command with `--output json` and decode stdout.
    pub async fn json<T, I, S>(&self, args: I) -> Result<T, AzError>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut args: Vec<_> = args
            .into_iter()
            .map(|a| a.as_ref().to_os_string())
            .collect();
        args.push("--output".into());
        args.push("json".into());
        let command = display_args(&args);

        let output = self.run_scoped(args).await?;
        if !output.success {
            return Err(AzError::Failed {
                command,
                message: output.error_text().to_string(),
            });
        }
        serde_json::from_str(&output.stdout).map_err(|source| AzError::Parse { command, source })
    }
}

impl Default for AzCli {
    fn default() -> Self {
        Self::new()
    }
}

fn display_args(args: &[std::ffi::OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
