// ABOUTME: GitHub GraphQL implementation of DeploymentTracker.
// ABOUTME: Resolves the correlated ref to node ids, then creates deployments and statuses.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::error::TrackingError;
use super::graphql::{
    self, BRANCH_QUERY, BranchData, BranchVariables, CREATE_DEPLOYMENT, CREATE_DEPLOYMENT_STATUS,
    CreateDeploymentData, CreateDeploymentInput, CreateDeploymentStatusData,
    CreateDeploymentStatusInput, InputVariables, PULL_REQUEST_QUERY, PullRequestData,
    PullRequestVariables,
};
use super::{
    CorrelatedRef, DeploymentTracker, RecordedStatus, RegisterRequest, Repository, StatusUpdate,
    TrackedDeployment,
};
use crate::types::{NodeId, TrackingId};

pub const GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";

/// Deployments and deployment statuses were preview features of the API.
const PREVIEW_ACCEPT: &str =
    "application/vnd.github.flash-preview+json, application/vnd.github.ant-man-preview+json";

const USER_AGENT: &str = concat!("deploy-now/", env!("CARGO_PKG_VERSION"));

/// Node ids a deployment is created against.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedRef {
    repository_id: NodeId,
    ref_id: NodeId,
}

/// Tracks deployments in a GitHub repository.
#[derive(Clone)]
pub struct GithubTracker {
    http: reqwest::Client,
    endpoint: String,
    token: String,
    repository: Repository,
}

impl GithubTracker {
    /// Create a tracker for `repository`, authenticated with `token`.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Transport` if the HTTP client cannot be built.
    pub fn new(token: impl Into<String>, repository: Repository) -> Result<Self, TrackingError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            endpoint: GRAPHQL_ENDPOINT.to_string(),
            token: token.into(),
            repository,
        })
    }

    /// Point the tracker at a different GraphQL endpoint (GitHub Enterprise).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    async fn execute<V, T>(&self, query: &str, variables: V) -> Result<T, TrackingError>
    where
        V: Serialize + Send,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, PREVIEW_ACCEPT)
            .json(&graphql::Request { query, variables })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TrackingError::Api {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        graphql::parse(&body)
    }

    async fn resolve_ref(&self, correlated: &CorrelatedRef) -> Result<ResolvedRef, TrackingError> {
        let owner = self.repository.owner.as_str();
        let name = self.repository.name.as_str();

        let resolved = match correlated {
            CorrelatedRef::PullRequest(number) => {
                let data: PullRequestData = self
                    .execute(
                        PULL_REQUEST_QUERY,
                        PullRequestVariables {
                            owner,
                            name,
                            pr: *number,
                        },
                    )
                    .await?;
                resolved_pull_request(data)
            }
            CorrelatedRef::Branch(branch) => {
                let data: BranchData = self
                    .execute(
                        BRANCH_QUERY,
                        BranchVariables {
                            owner,
                            name,
                            qualified_name: qualified_branch(branch),
                        },
                    )
                    .await?;
                resolved_branch(data)
            }
        };

        resolved.ok_or_else(|| {
            TrackingError::RefNotFound(format!("{correlated} in {}", self.repository))
        })
    }
}

impl std::fmt::Debug for GithubTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubTracker")
            .field("endpoint", &self.endpoint)
            .field("repository", &self.repository)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DeploymentTracker for GithubTracker {
    async fn register(&self, request: &RegisterRequest) -> Result<TrackedDeployment, TrackingError> {
        let resolved = self.resolve_ref(&request.correlated_ref).await?;
        tracing::debug!(
            repository = %self.repository,
            correlated_ref = %request.correlated_ref,
            "resolved deployment ref"
        );

        let input = deployment_input(resolved, request);
        let data: CreateDeploymentData = self
            .execute(CREATE_DEPLOYMENT, InputVariables { input })
            .await?;

        let deployment = data
            .create_deployment
            .and_then(|payload| payload.deployment)
            .ok_or_else(|| {
                TrackingError::Registration("no deployment returned".to_string())
            })?;

        Ok(TrackedDeployment {
            id: TrackingId::new(deployment.id),
            environment: request.environment.clone(),
            initial_status_url: deployment
                .latest_status
                .and_then(|status| status.environment_url),
        })
    }

    async fn append_status(&self, update: &StatusUpdate) -> Result<RecordedStatus, TrackingError> {
        let input = status_input(update);
        let data: CreateDeploymentStatusData = self
            .execute(CREATE_DEPLOYMENT_STATUS, InputVariables { input })
            .await?;

        data.create_deployment_status
            .and_then(|payload| payload.deployment_status)
            .ok_or_else(|| TrackingError::StatusUpdate("no status returned".to_string()))
    }
}

fn qualified_branch(branch: &str) -> String {
    if branch.starts_with("refs/") {
        branch.to_string()
    } else {
        format!("refs/heads/{branch}")
    }
}

fn resolved_pull_request(data: PullRequestData) -> Option<ResolvedRef> {
    let repository = data.repository?;
    let head = repository.pull_request?.head_ref?;
    Some(ResolvedRef {
        repository_id: NodeId::new(repository.id),
        ref_id: NodeId::new(head.id),
    })
}

fn resolved_branch(data: BranchData) -> Option<ResolvedRef> {
    let repository = data.repository?;
    let git_ref = repository.git_ref?;
    Some(ResolvedRef {
        repository_id: NodeId::new(repository.id),
        ref_id: NodeId::new(git_ref.id),
    })
}

fn deployment_input(resolved: ResolvedRef, request: &RegisterRequest) -> CreateDeploymentInput {
    CreateDeploymentInput {
        repository_id: resolved.repository_id.into_inner(),
        ref_id: resolved.ref_id.into_inner(),
        auto_merge: false,
        required_contexts: Vec::new(),
        description: request.description.clone(),
        environment: request.environment.clone(),
        task: "deploy".to_string(),
        payload: request.payload.to_string(),
    }
}

fn status_input(update: &StatusUpdate) -> CreateDeploymentStatusInput {
    CreateDeploymentStatusInput {
        deployment_id: update.deployment_id.as_str().to_string(),
        state: update.status.as_wire(),
        environment: update.environment.clone(),
        log_url: update.log_url.clone(),
        environment_url: update.environment_url.clone(),
    }
}
