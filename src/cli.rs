// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Flags left unset fall through to action inputs and deploy-now.json.

use clap::{Args, Parser, Subcommand};
use deploy_now::config::Flags;
use deploy_now::output::OutputMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "deploy-now")]
#[command(about = "Deploy an app to Vercel and mirror its progress into GitHub deployments")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy the app and track it as a GitHub deployment
    Deploy(DeployArgs),

    /// Print the build logs of a deployment
    Logs {
        /// Provider deployment id
        deployment_id: String,

        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Where the app lives and how to reach the provider.
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Application directory [default: .]
    #[arg(long)]
    pub package: Option<PathBuf>,

    /// Provider access token
    #[arg(long)]
    pub now_token: Option<String>,

    /// Override file [default: <package>/deploy-now.json]
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl SourceArgs {
    pub fn flags(&self) -> Flags {
        Flags {
            package: self.package.clone(),
            now_token: self.now_token.clone(),
            config: self.config.clone(),
            ..Flags::default()
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct DeployArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Deployment name [default: directory name]
    #[arg(long)]
    pub app: Option<String>,

    /// Deploy to production instead of staging
    #[arg(long)]
    pub prod: bool,

    /// Comma-separated aliases
    #[arg(long)]
    pub alias: Option<String>,

    /// Provider team slug
    #[arg(long)]
    pub scope: Option<String>,

    /// Provider team id
    #[arg(long)]
    pub team_id: Option<String>,

    /// GitHub token used to record deployments
    #[arg(long)]
    pub github_token: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl DeployArgs {
    pub fn flags(&self) -> Flags {
        Flags {
            app: self.app.clone(),
            prod: self.prod,
            alias: self.alias.clone(),
            scope: self.scope.clone(),
            team_id: self.team_id.clone(),
            github_token: self.github_token.clone(),
            ..self.source.flags()
        }
    }
}
