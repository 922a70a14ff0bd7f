// ABOUTME: GraphQL documents and wire types for GitHub deployments.
// ABOUTME: Inputs serialize camelCase; responses unwrap data or surface errors[].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::TrackingError;
use super::RecordedStatus;

pub(super) const PULL_REQUEST_QUERY: &str = r#"
query($owner: String!, $name: String!, $pr: Int!) {
  repository(owner: $owner, name: $name) {
    id
    pullRequest(number: $pr) {
      headRef {
        id
      }
    }
  }
}
"#;

pub(super) const BRANCH_QUERY: &str = r#"
query($owner: String!, $name: String!, $qualifiedName: String!) {
  repository(owner: $owner, name: $name) {
    id
    ref(qualifiedName: $qualifiedName) {
      id
    }
  }
}
"#;

pub(super) const CREATE_DEPLOYMENT: &str = r#"
mutation($input: CreateDeploymentInput!) {
  createDeployment(input: $input) {
    deployment {
      id
      latestStatus {
        environmentUrl
      }
    }
  }
}
"#;

pub(super) const CREATE_DEPLOYMENT_STATUS: &str = r#"
mutation($input: CreateDeploymentStatusInput!) {
  createDeploymentStatus(input: $input) {
    deploymentStatus {
      state
      logUrl
      environment
      environmentUrl
    }
  }
}
"#;

#[derive(Debug, Serialize)]
pub(super) struct Request<'a, V> {
    pub query: &'a str,
    pub variables: V,
}

#[derive(Debug, Serialize)]
pub(super) struct InputVariables<T> {
    pub input: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PullRequestVariables<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub pr: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BranchVariables<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub qualified_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateDeploymentInput {
    pub repository_id: String,
    pub ref_id: String,
    pub auto_merge: bool,
    pub required_contexts: Vec<String>,
    pub description: String,
    pub environment: String,
    pub task: String,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateDeploymentStatusInput {
    pub deployment_id: String,
    pub state: &'static str,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Response<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorMessage {
    pub message: String,
}

impl<T> Response<T> {
    pub fn into_data(self) -> Result<T, TrackingError> {
        if !self.errors.is_empty() {
            let messages: Vec<_> = self.errors.into_iter().map(|e| e.message).collect();
            return Err(TrackingError::GraphQl(messages.join("; ")));
        }
        self.data
            .ok_or_else(|| TrackingError::GraphQl("response contained no data".to_string()))
    }
}

pub(super) fn parse<T: DeserializeOwned>(body: &str) -> Result<T, TrackingError> {
    let response: Response<T> = serde_json::from_str(body)
        .map_err(|e| TrackingError::GraphQl(format!("unreadable response: {e}")))?;
    response.into_data()
}

#[derive(Debug, Deserialize)]
pub(super) struct NodeRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct PullRequestData {
    pub repository: Option<PullRequestRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PullRequestRepository {
    pub id: String,
    pub pull_request: Option<PullRequestNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PullRequestNode {
    pub head_ref: Option<NodeRef>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BranchData {
    pub repository: Option<BranchRepository>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BranchRepository {
    pub id: String,
    #[serde(rename = "ref")]
    pub git_ref: Option<NodeRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateDeploymentData {
    pub create_deployment: Option<CreateDeploymentPayload>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateDeploymentPayload {
    pub deployment: Option<DeploymentNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DeploymentNode {
    pub id: String,
    pub latest_status: Option<LatestStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LatestStatus {
    pub environment_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateDeploymentStatusData {
    pub create_deployment_status: Option<CreateDeploymentStatusPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateDeploymentStatusPayload {
    pub deployment_status: Option<RecordedStatus>,
}
