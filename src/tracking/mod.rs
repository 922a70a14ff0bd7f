// ABOUTME: Tracking client: registers deployment records and appends status transitions.
// ABOUTME: DeploymentTracker is the seam the reconciler drives; GithubTracker implements it.

mod error;
mod github;
mod graphql;

pub use error::TrackingError;
pub use github::{GRAPHQL_ENDPOINT, GithubTracker};

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::status::CanonicalStatus;
use crate::types::TrackingId;

/// Repository coordinates (`owner/name`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    /// Parse `owner/name`.
    pub fn parse(value: &str) -> Option<Self> {
        let (owner, name) = value.trim().split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The source-control reference a deployment is associated with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelatedRef {
    PullRequest(u64),
    Branch(String),
}

impl fmt::Display for CorrelatedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelatedRef::PullRequest(number) => write!(f, "pull request #{number}"),
            CorrelatedRef::Branch(name) => write!(f, "branch {name}"),
        }
    }
}

/// Everything needed to register a deployment record.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterRequest {
    pub description: String,
    pub environment: String,
    pub correlated_ref: CorrelatedRef,
    /// Provider payload stored alongside the record.
    pub payload: Value,
}

/// A registered deployment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedDeployment {
    pub id: TrackingId,
    pub environment: String,
    pub initial_status_url: Option<String>,
}

/// One status transition for a registered record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub deployment_id: TrackingId,
    pub status: CanonicalStatus,
    pub environment: String,
    pub log_url: Option<String>,
    pub environment_url: Option<String>,
}

/// The status as the tracking system recorded it.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedStatus {
    pub state: String,
    pub log_url: Option<String>,
    pub environment: Option<String>,
    pub environment_url: Option<String>,
}

/// Remote store of deployment records and their status history.
///
/// Neither operation is retried by callers: a repeated `append_status` would
/// add a duplicate history entry.
#[async_trait]
pub trait DeploymentTracker: Send + Sync {
    /// Create a deployment record.
    async fn register(&self, request: &RegisterRequest) -> Result<TrackedDeployment, TrackingError>;

    /// Append a status transition to an existing record.
    async fn append_status(&self, update: &StatusUpdate) -> Result<RecordedStatus, TrackingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repository() {
        let repo = Repository::parse("vitalratel/site").unwrap();
        assert_eq!(repo.owner, "vitalratel");
        assert_eq!(repo.name, "site");
        assert_eq!(repo.to_string(), "vitalratel/site");
    }

    #[test]
    fn rejects_malformed_repository() {
        assert!(Repository::parse("no-slash").is_none());
        assert!(Repository::parse("/name").is_none());
        assert!(Repository::parse("owner/").is_none());
        assert!(Repository::parse("a/b/c").is_none());
    }

    #[test]
    fn correlated_ref_display() {
        assert_eq!(CorrelatedRef::PullRequest(42).to_string(), "pull request #42");
        assert_eq!(
            CorrelatedRef::Branch("main".to_string()).to_string(),
            "branch main"
        );
    }
}
