// ABOUTME: Resolved run configuration from CLI flags, action inputs and deploy-now.json.
// ABOUTME: Flag beats INPUT_<NAME> beats plain env var beats override file beats default.

mod context;
mod env_value;
mod inputs;
mod overrides;

pub use context::GithubContext;
pub use env_value::EnvValue;
pub use inputs::{Inputs, env_key, parse_bool, parse_list};
pub use overrides::{OVERRIDE_FILENAME, OverrideFile, merge_json};

use crate::error::{Error, Result};
use crate::types::Target;
use nonempty::NonEmpty;
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.vercel.com";
pub const DEFAULT_REGION: &str = "bru1";

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_logs_command() -> Vec<String> {
    vec!["npm".to_string(), "run".to_string(), "logs".to_string()]
}

/// Values given on the command line. `None` / `false` defer to lower layers.
#[derive(Debug, Clone, Default)]
pub struct Flags {
    pub package: Option<PathBuf>,
    pub app: Option<String>,
    pub prod: bool,
    pub alias: Option<String>,
    pub scope: Option<String>,
    pub team_id: Option<String>,
    pub now_token: Option<String>,
    pub github_token: Option<String>,
    pub config: Option<PathBuf>,
}

#[derive(Clone)]
pub struct Config {
    /// Absolute path of the application directory.
    pub app_path: PathBuf,
    pub app_name: String,
    pub target: Target,
    pub aliases: Vec<String>,
    pub regions: NonEmpty<String>,
    pub scope: Option<String>,
    pub team_id: Option<String>,
    pub provider_token: String,
    pub tracking_token: Option<String>,
    pub api_url: String,
    pub poll_interval: Duration,
    pub logs_command: Vec<String>,
    pub fetch_logs_on_error: bool,
    /// Merged into the provider request body.
    pub deployment_overrides: Map<String, Value>,
    /// Override file that was applied, if any.
    pub override_file: Option<PathBuf>,
}

impl Config {
    pub fn resolve(flags: &Flags, inputs: &Inputs) -> Result<Self> {
        let requested = flags
            .package
            .clone()
            .or_else(|| inputs.get("package").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));
        let app_path = resolve_app_path(&requested)?;

        let explicit_file = flags
            .config
            .clone()
            .or_else(|| inputs.get("config").map(PathBuf::from));
        let (override_file, file) = match explicit_file {
            Some(path) => {
                let file = OverrideFile::load(&path)?;
                (Some(path), file)
            }
            None => match OverrideFile::discover(&app_path)? {
                Some((path, file)) => (Some(path), file),
                None => (None, OverrideFile::default()),
            },
        };

        let app_name = flags
            .app
            .clone()
            .or_else(|| inputs.get("app"))
            .or_else(|| file.name.clone())
            .or_else(|| dir_name(&app_path))
            .unwrap_or_else(|| "app".to_string());

        let prod = flags.prod || inputs.flag("prod").unwrap_or(false);

        let aliases = flags
            .alias
            .as_deref()
            .map(parse_list)
            .or_else(|| inputs.get("alias").map(|a| parse_list(&a)))
            .or_else(|| file.alias.clone())
            .unwrap_or_default();

        let provider_token = match flags.now_token.clone().or_else(|| inputs.get("nowToken")) {
            Some(token) => token,
            None => match &file.now_token {
                Some(value) => value.resolve(inputs)?,
                None => return Err(Error::MissingInput("nowToken".to_string())),
            },
        };

        let tracking_token = match flags
            .github_token
            .clone()
            .or_else(|| inputs.get("githubToken"))
        {
            Some(token) => Some(token),
            None => file
                .github_token
                .as_ref()
                .map(|value| value.resolve(inputs))
                .transpose()?,
        };

        let logs_command = file.logs_command.clone().unwrap_or_else(default_logs_command);
        if logs_command.is_empty() {
            return Err(Error::InvalidConfig("logsCommand cannot be empty".to_string()));
        }

        let poll_interval = file.poll_interval.unwrap_or_else(default_poll_interval);
        if poll_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "pollInterval must be greater than zero".to_string(),
            ));
        }

        let config = Config {
            app_path,
            app_name,
            target: Target::from_prod_flag(prod),
            aliases,
            regions: file
                .regions
                .clone()
                .unwrap_or_else(|| NonEmpty::new(DEFAULT_REGION.to_string())),
            scope: flags
                .scope
                .clone()
                .or_else(|| inputs.get("scope"))
                .or_else(|| file.scope.clone()),
            team_id: flags
                .team_id
                .clone()
                .or_else(|| inputs.get("teamId"))
                .or_else(|| file.team_id.clone()),
            provider_token,
            tracking_token,
            api_url: file
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            poll_interval,
            logs_command,
            fetch_logs_on_error: file.fetch_logs_on_error.unwrap_or(true),
            deployment_overrides: file.deployment,
            override_file,
        };

        tracing::debug!(config = ?config, "resolved configuration");
        Ok(config)
    }

    /// Token for the tracking system; only the deploy command needs it.
    pub fn tracking_token(&self) -> Result<&str> {
        self.tracking_token
            .as_deref()
            .ok_or_else(|| Error::MissingInput("githubToken".to_string()))
    }
}

fn resolve_app_path(requested: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(requested).unwrap_or_else(|_| requested.to_path_buf());
    match absolute.canonicalize() {
        Ok(path) if path.is_dir() => Ok(path),
        _ => Err(Error::InvalidAppPath(absolute)),
    }
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

// Tokens never reach logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_path", &self.app_path)
            .field("app_name", &self.app_name)
            .field("target", &self.target)
            .field("aliases", &self.aliases)
            .field("regions", &self.regions)
            .field("scope", &self.scope)
            .field("team_id", &self.team_id)
            .field("provider_token", &"<redacted>")
            .field(
                "tracking_token",
                &self.tracking_token.as_ref().map(|_| "<redacted>"),
            )
            .field("api_url", &self.api_url)
            .field("poll_interval", &self.poll_interval)
            .field("logs_command", &self.logs_command)
            .field("fetch_logs_on_error", &self.fetch_logs_on_error)
            .field("deployment_overrides", &self.deployment_overrides)
            .field("override_file", &self.override_file)
            .finish()
    }
}
