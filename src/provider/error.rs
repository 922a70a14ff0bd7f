// ABOUTME: Provider error types with SNAFU pattern.
// ABOUTME: Covers file hashing, uploads, and deployment API failures.

use snafu::Snafu;
use std::path::PathBuf;

/// Errors raised while talking to the hosting provider.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    #[snafu(display("failed to walk application files under {}: {source}", path.display()))]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("file hashing task failed: {source}"))]
    Task { source: tokio::task::JoinError },

    #[snafu(display("failed to build HTTP client: {source}"))]
    Client { source: reqwest::Error },

    #[snafu(display("provider request failed: {source}"))]
    Request { source: reqwest::Error },

    #[snafu(display("provider API returned {status}: {message}"))]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[snafu(display("failed to encode deployment request: {source}"))]
    Encode { source: serde_json::Error },

    #[snafu(display("unexpected provider response: {reason}"))]
    UnexpectedResponse { reason: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Local application files could not be read.
    Files,
    /// The HTTP exchange itself failed.
    Transport,
    /// The provider answered with an error.
    Api,
    /// The provider answered with something we could not interpret.
    Protocol,
}

impl ProviderError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::Walk { .. } | ProviderError::ReadFile { .. } | ProviderError::Task { .. } => {
                ProviderErrorKind::Files
            }
            ProviderError::Client { .. } | ProviderError::Request { .. } => {
                ProviderErrorKind::Transport
            }
            ProviderError::Api { .. } => ProviderErrorKind::Api,
            ProviderError::Encode { .. } | ProviderError::UnexpectedResponse { .. } => {
                ProviderErrorKind::Protocol
            }
        }
    }

    /// Returns the provider's error code if the API reported one.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            ProviderError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
