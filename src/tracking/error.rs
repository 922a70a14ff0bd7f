// ABOUTME: Error types for tracking-system operations.
// ABOUTME: Covers ref resolution, transport, API, and GraphQL-level failures.

/// Errors from registering deployments or appending statuses.
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    /// The branch or pull request could not be found.
    #[error("could not resolve {0} in the repository")]
    RefNotFound(String),

    /// Registration was rejected.
    #[error("deployment registration failed: {0}")]
    Registration(String),

    /// Status update was rejected.
    #[error("status update failed: {0}")]
    StatusUpdate(String),

    /// The HTTP exchange failed.
    #[error("tracking request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("tracking API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// GraphQL `errors[]` in an otherwise successful response.
    #[error("tracking API rejected the request: {0}")]
    GraphQl(String),
}
