// ABOUTME: Build log retrieval by running an external logs command for a deployment.
// ABOUTME: Appends `<deployment-id> --token=<token>` to the configured argv and captures output.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("logs command is empty")]
    EmptyCommand,

    #[error("failed to run logs command `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("logs command exited with {}: {}", exit_status(.exit_code), .stderr.trim())]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}

/// Captured output of a successful logs command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLogs {
    pub stdout: String,
    pub stderr: String,
}

/// Runs the logs command in the application directory.
#[derive(Clone)]
pub struct LogFetcher {
    command: Vec<String>,
    working_dir: PathBuf,
    token: String,
}

impl LogFetcher {
    pub fn new(command: Vec<String>, working_dir: impl Into<PathBuf>, token: impl Into<String>) -> Self {
        Self {
            command,
            working_dir: working_dir.into(),
            token: token.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.logs_command.clone(),
            &config.app_path,
            config.provider_token.clone(),
        )
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub async fn fetch(&self, deployment_id: &str) -> Result<BuildLogs, LogError> {
        let (program, args) = self.command.split_first().ok_or(LogError::EmptyCommand)?;

        tracing::debug!(program, deployment_id, "fetching build logs");

        let output = Command::new(program)
            .args(args)
            .arg(deployment_id)
            .arg(format!("--token={}", self.token))
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| LogError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(LogError::Failed {
                exit_code: output.status.code(),
                stderr,
            });
        }

        tracing::debug!(bytes = stdout.len(), "build logs retrieved");
        Ok(BuildLogs { stdout, stderr })
    }
}

impl std::fmt::Debug for LogFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogFetcher")
            .field("command", &self.command)
            .field("working_dir", &self.working_dir)
            .finish_non_exhaustive()
    }
}
