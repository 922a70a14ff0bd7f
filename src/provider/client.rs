// ABOUTME: HTTP client for the hosting provider and the deployment event stream it drives.
// ABOUTME: Hash, upload, create, then poll readiness, yielding one event per lifecycle step.

use futures::{Stream, stream};
use reqwest::{Method, RequestBuilder, Response};
use serde_json::{Value, json};
use snafu::{OptionExt, ResultExt};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use super::error::{
    ApiSnafu, ClientSnafu, EncodeSnafu, ProviderError, ReadFileSnafu, RequestSnafu, TaskSnafu,
    UnexpectedResponseSnafu,
};
use super::event::{RawEvent, kinds};
use super::manifest::{FileEntry, FileManifest};
use crate::config::Config;

/// Ordered provider events; a transport failure is the last item.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<RawEvent, ProviderError>> + Send>>;

const USER_AGENT: &str = concat!("deploy-now/", env!("CARGO_PKG_VERSION"));

/// Client for the provider's deployment API.
#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    team_id: Option<String>,
    scope: Option<String>,
    poll_interval: Duration,
}

impl ProviderClient {
    /// Create a client from resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Client` if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .context(ClientSnafu)?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.provider_token.clone(),
            team_id: config.team_id.clone(),
            scope: config.scope.clone(),
            poll_interval: config.poll_interval,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self
            .http
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.token);
        if let Some(team_id) = &self.team_id {
            req = req.query(&[("teamId", team_id)]);
        } else if let Some(scope) = &self.scope {
            req = req.query(&[("slug", scope)]);
        }
        req
    }

    /// Upload one file's contents, keyed by its digest.
    pub async fn upload_file(&self, entry: &FileEntry) -> Result<(), ProviderError> {
        let content = tokio::fs::read(&entry.path)
            .await
            .context(ReadFileSnafu { path: &entry.path })?;

        let response = self
            .request(Method::POST, "/v2/files")
            .header("Content-Type", "application/octet-stream")
            .header("x-vercel-digest", &entry.sha)
            .body(content)
            .send()
            .await
            .context(RequestSnafu)?;

        read_json(response).await.map(|_| ())
    }

    /// Create a deployment from a complete request body.
    pub async fn create_deployment(&self, body: &Value) -> Result<Value, ProviderError> {
        let response = self
            .request(Method::POST, "/v13/deployments")
            .json(body)
            .send()
            .await
            .context(RequestSnafu)?;

        read_json(response).await
    }

    /// Fetch the current state of a deployment.
    pub async fn get_deployment(&self, id: &str) -> Result<Value, ProviderError> {
        let response = self
            .request(Method::GET, &format!("/v13/deployments/{id}"))
            .send()
            .await
            .context(RequestSnafu)?;

        read_json(response).await
    }

    /// Deploy `app_path` and stream the deployment's lifecycle events.
    ///
    /// Nothing happens until the stream is polled. The stream ends after a
    /// `ready` or `error` event, or after yielding a single `Err`.
    pub fn deploy(&self, app_path: PathBuf, body: Value) -> EventStream {
        let run = DeploymentRun {
            client: self.clone(),
            app_path,
            body,
            phase: Phase::Hashing,
            pending: VecDeque::new(),
        };

        Box::pin(stream::unfold(Some(run), |state| async move {
            let Some(mut run) = state else {
                return None;
            };
            match run.next_event().await {
                Ok(Some(event)) => Some((Ok(event), Some(run))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        }))
    }
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("base_url", &self.base_url)
            .field("team_id", &self.team_id)
            .field("scope", &self.scope)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

async fn read_json(response: Response) -> Result<Value, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.context(RequestSnafu);
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = parse_api_error(&body);
    ApiSnafu {
        status: status.as_u16(),
        code,
        message,
    }
    .fail()
}

/// Extract `error.code` / `error.message` from a provider error body.
fn parse_api_error(body: &str) -> (Option<String>, String) {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    let code = error
        .and_then(|e| e.get("code"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string());
    (code, message)
}

enum Phase {
    Hashing,
    Counting(FileManifest),
    Uploading(FileManifest),
    Creating(FileManifest),
    Polling {
        id: String,
        ready_state: Option<String>,
    },
    Done,
}

struct DeploymentRun {
    client: ProviderClient,
    app_path: PathBuf,
    body: Value,
    phase: Phase,
    pending: VecDeque<RawEvent>,
}

impl DeploymentRun {
    async fn next_event(&mut self) -> Result<Option<RawEvent>, ProviderError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }

            match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::Hashing => {
                    let root = self.app_path.clone();
                    let manifest = tokio::task::spawn_blocking(move || FileManifest::build(&root))
                        .await
                        .context(TaskSnafu)??;
                    self.pending.push_back(RawEvent::new(
                        kinds::HASHES_CALCULATED,
                        json!({ "files": manifest.len() }),
                    ));
                    self.phase = Phase::Counting(manifest);
                }
                // Queued events are yielded before any upload can fail.
                Phase::Counting(manifest) => {
                    self.pending.push_back(RawEvent::new(
                        kinds::FILE_COUNT,
                        json!({ "total": manifest.len(), "unique": manifest.unique_digests().len() }),
                    ));
                    self.phase = Phase::Uploading(manifest);
                }
                Phase::Uploading(manifest) => {
                    let unique = manifest.unique_digests();
                    let uploads = unique.len();
                    for entry in unique {
                        self.client.upload_file(entry).await?;
                    }
                    tracing::debug!(uploads, "uploaded application files");
                    self.pending.push_back(RawEvent::new(
                        kinds::ALL_FILES_UPLOADED,
                        json!({ "files": uploads }),
                    ));
                    self.phase = Phase::Creating(manifest);
                }
                Phase::Creating(manifest) => {
                    let mut body = self.body.clone();
                    let files = serde_json::to_value(manifest.entries()).context(EncodeSnafu)?;
                    if let Some(fields) = body.as_object_mut() {
                        fields.insert("files".to_string(), files);
                    }

                    let deployment = self.client.create_deployment(&body).await?;
                    let id = deployment
                        .get("id")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .context(UnexpectedResponseSnafu {
                            reason: "created deployment has no id",
                        })?;
                    tracing::debug!(deployment_id = %id, "provider accepted deployment");

                    self.pending
                        .push_back(RawEvent::new(kinds::CREATED, deployment.clone()));
                    self.advance(id, None, &deployment);
                }
                Phase::Polling { id, ready_state } => {
                    tokio::time::sleep(self.client.poll_interval).await;
                    let deployment = self.client.get_deployment(&id).await?;
                    self.advance(id, ready_state, &deployment);
                }
                Phase::Done => return Ok(None),
            }
        }
    }

    fn advance(&mut self, id: String, previous: Option<String>, deployment: &Value) {
        self.pending
            .extend(transition_events(previous.as_deref(), deployment));

        let current = ready_state_of(deployment).map(str::to_string);
        self.phase = if current.as_deref().is_some_and(is_terminal_state) {
            Phase::Done
        } else {
            Phase::Polling {
                id,
                ready_state: current.or(previous),
            }
        };
    }
}

fn ready_state_of(deployment: &Value) -> Option<&str> {
    deployment.get("readyState").and_then(Value::as_str)
}

fn is_terminal_state(state: &str) -> bool {
    matches!(state, "READY" | "ERROR" | "CANCELED")
}

/// Events implied by a polled deployment, given the last readiness seen.
///
/// A changed non-terminal readiness yields `build-state-changed`; reaching
/// `READY` yields only `ready` and `ERROR`/`CANCELED` only `error`, so the
/// terminal status is reported exactly once.
pub fn transition_events(previous: Option<&str>, deployment: &Value) -> Vec<RawEvent> {
    let Some(current) = ready_state_of(deployment) else {
        return Vec::new();
    };
    if previous == Some(current) {
        return Vec::new();
    }

    let kind = match current {
        "READY" => kinds::READY,
        "ERROR" | "CANCELED" => kinds::ERROR,
        _ => kinds::BUILD_STATE_CHANGED,
    };
    vec![RawEvent::new(kind, deployment.clone())]
}
