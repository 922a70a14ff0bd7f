// ABOUTME: Application-wide error types for deploy-now.
// ABOUTME: Uses thiserror; module errors convert in with #[from].

use std::path::PathBuf;
use thiserror::Error;

use crate::logs::LogError;
use crate::outputs::OutputError;
use crate::provider::ProviderError;
use crate::reconcile::ReconcileError;
use crate::tracking::TrackingError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("app path is invalid: {}", .0.display())]
    InvalidAppPath(PathBuf),

    #[error("missing required input: {0}")]
    MissingInput(String),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot determine the branch or pull request to track; set GITHUB_REF or run on a pull_request event")]
    NoCorrelatedRef,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error(transparent)]
    Logs(#[from] LogError),
}

pub type Result<T> = std::result::Result<T, Error>;
