// ABOUTME: Pipeline outputs published at the end of a run (environment URL, log URL, deployment id).
// ABOUTME: OutputSink abstracts where they go: $GITHUB_OUTPUT, workflow commands, or memory.

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Inputs;
use crate::provider::DeploymentPayload;
use crate::types::ProviderDeploymentId;

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("failed to write output `{key}` to {}: {source}", .path.display())]
    Write {
        key: OutputKey,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output `{key}`: {source}")]
    Stdout {
        key: OutputKey,
        #[source]
        source: std::io::Error,
    },
}

/// Names of the outputs, stable across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputKey {
    EnvironmentUrl,
    LogUrl,
    DeploymentId,
}

impl OutputKey {
    pub const ALL: [OutputKey; 3] = [
        OutputKey::EnvironmentUrl,
        OutputKey::LogUrl,
        OutputKey::DeploymentId,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKey::EnvironmentUrl => "environment-url",
            OutputKey::LogUrl => "log-url",
            OutputKey::DeploymentId => "deployment-id",
        }
    }
}

impl fmt::Display for OutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three values handed back to the calling pipeline. Missing values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PipelineOutputs {
    pub environment_url: String,
    pub log_url: String,
    pub deployment_id: String,
}

impl PipelineOutputs {
    /// Extract outputs from a terminal event payload.
    ///
    /// `fallback_id` is the id seen on `created`, used when the terminal
    /// payload does not repeat it.
    pub fn from_terminal(
        payload: &DeploymentPayload,
        fallback_id: Option<&ProviderDeploymentId>,
    ) -> Self {
        let deployment_id = payload
            .deployment_id()
            .or_else(|| fallback_id.cloned())
            .map(ProviderDeploymentId::into_inner)
            .unwrap_or_default();

        Self {
            environment_url: payload.preview_url().unwrap_or_default(),
            log_url: payload.log_url().unwrap_or_default(),
            deployment_id,
        }
    }

    pub fn get(&self, key: OutputKey) -> &str {
        match key {
            OutputKey::EnvironmentUrl => &self.environment_url,
            OutputKey::LogUrl => &self.log_url,
            OutputKey::DeploymentId => &self.deployment_id,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (OutputKey, &str)> {
        OutputKey::ALL.into_iter().map(|key| (key, self.get(key)))
    }
}

/// Destination for pipeline outputs.
pub trait OutputSink: Send + Sync {
    fn set(&self, key: OutputKey, value: &str) -> Result<(), OutputError>;
}

/// Write every output to `sink`. Stops at the first failure.
pub fn publish<S: OutputSink + ?Sized>(
    sink: &S,
    outputs: &PipelineOutputs,
) -> Result<(), OutputError> {
    for (key, value) in outputs.entries() {
        sink.set(key, value)?;
        tracing::debug!(output = %key, value, "published output");
    }
    Ok(())
}

/// Appends `name=value` lines to the file named by `GITHUB_OUTPUT`.
#[derive(Debug, Clone)]
pub struct GithubOutputFile {
    path: PathBuf,
}

const HEREDOC_DELIMITER: &str = "DEPLOY_NOW_EOF";

impl GithubOutputFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for GithubOutputFile {
    fn set(&self, key: OutputKey, value: &str) -> Result<(), OutputError> {
        let line = if value.contains('\n') {
            let mut delimiter = HEREDOC_DELIMITER.to_string();
            while value.contains(&delimiter) {
                delimiter.push('_');
            }
            format!("{key}<<{delimiter}\n{value}\n{delimiter}\n")
        } else {
            format!("{key}={value}\n")
        };

        let write_err = |source| OutputError::Write {
            key,
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_err)?;
        file.write_all(line.as_bytes()).map_err(write_err)
    }
}

/// Legacy `::set-output` workflow command on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn set(&self, key: OutputKey, value: &str) -> Result<(), OutputError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "::set-output name={key}::{}", escape_command_value(value))
            .map_err(|source| OutputError::Stdout { key, source })
    }
}

fn escape_command_value(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Keeps outputs in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    values: Mutex<Vec<(OutputKey, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `set` call in order.
    pub fn entries(&self) -> Vec<(OutputKey, String)> {
        self.values.lock().clone()
    }

    /// The latest value for `key`.
    pub fn get(&self, key: OutputKey) -> Option<String> {
        self.values
            .lock()
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl OutputSink for MemorySink {
    fn set(&self, key: OutputKey, value: &str) -> Result<(), OutputError> {
        self.values.lock().push((key, value.to_string()));
        Ok(())
    }
}

/// `GITHUB_OUTPUT` when the runner provides it, otherwise workflow commands.
pub fn sink_from_env(inputs: &Inputs) -> Box<dyn OutputSink> {
    match inputs.var("GITHUB_OUTPUT") {
        Some(path) => Box::new(GithubOutputFile::new(path)),
        None => Box::new(StdoutSink),
    }
}
