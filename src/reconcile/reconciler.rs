// ABOUTME: Event-driven reconciler mirroring provider deployment events into the tracking system.
// ABOUTME: One event at a time: register on created, append mapped statuses, publish at terminal.

use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde_json::Value;

use super::error::ReconcileError;
use super::state::{Outcome, ReconcileState};
use crate::diagnostics::{Diagnostics, Warning};
use crate::outputs::{OutputSink, PipelineOutputs, publish};
use crate::provider::{DeploymentEvent, DeploymentPayload, ProviderError, RawEvent};
use crate::status::{self, CanonicalStatus};
use crate::tracking::{
    CorrelatedRef, DeploymentTracker, RegisterRequest, StatusUpdate, TrackedDeployment,
};
use crate::types::{ProviderDeploymentId, Target, TrackingId};

/// What the reconciler needs to register a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    /// Used when the provider does not name a target.
    pub environment: Target,
    pub description: String,
    pub correlated_ref: CorrelatedRef,
}

/// Whether to keep pulling events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Done,
}

/// Result of a run that reached `ready`.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub tracking_id: TrackingId,
    pub provider_id: Option<ProviderDeploymentId>,
    pub outputs: PipelineOutputs,
    pub warnings: Vec<Warning>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

pub struct Reconciler<'a, T: ?Sized, S: ?Sized> {
    tracker: &'a T,
    sink: &'a S,
    context: RunContext,
    state: ReconcileState,
    provider_id: Option<ProviderDeploymentId>,
    outputs: Option<PipelineOutputs>,
    diagnostics: Diagnostics,
    last_event: Option<String>,
}

impl<'a, T, S> Reconciler<'a, T, S>
where
    T: DeploymentTracker + ?Sized,
    S: OutputSink + ?Sized,
{
    pub fn new(tracker: &'a T, sink: &'a S, context: RunContext) -> Self {
        Self {
            tracker,
            sink,
            context,
            state: ReconcileState::default(),
            provider_id: None,
            outputs: None,
            diagnostics: Diagnostics::default(),
            last_event: None,
        }
    }

    pub fn state(&self) -> &ReconcileState {
        &self.state
    }

    pub fn outputs(&self) -> Option<&PipelineOutputs> {
        self.outputs.as_ref()
    }

    pub fn warnings(&self) -> &[Warning] {
        self.diagnostics.warnings()
    }

    /// Drain `events` until a terminal event, a fatal error, or exhaustion.
    ///
    /// Events after the terminal one are not consumed. A stream error or an
    /// exhausted stream appends one best-effort `failure` status to an
    /// already registered deployment before failing the run.
    pub async fn run<E>(&mut self, events: E) -> Result<RunReport, ReconcileError>
    where
        E: Stream<Item = Result<RawEvent, ProviderError>>,
    {
        let started_at = Utc::now();
        let mut events = std::pin::pin!(events);

        while let Some(item) = events.next().await {
            let raw = match item {
                Ok(raw) => raw,
                Err(source) => {
                    tracing::error!(error = %source, "provider event stream failed");
                    self.abandon().await;
                    return Err(ReconcileError::Stream { source });
                }
            };

            if self.handle(raw).await? == Step::Done {
                break;
            }
        }

        match (&self.state, &self.outputs) {
            (
                ReconcileState::Terminal {
                    deployment,
                    outcome: Outcome::Succeeded,
                },
                Some(outputs),
            ) => Ok(RunReport {
                tracking_id: deployment.id.clone(),
                provider_id: self.provider_id.clone(),
                outputs: outputs.clone(),
                warnings: self.diagnostics.warnings().to_vec(),
                started_at,
                finished_at: Utc::now(),
            }),
            _ => {
                tracing::error!(state = self.state.name(), "provider event stream ended early");
                self.abandon().await;
                Err(ReconcileError::StreamTerminatedEarly {
                    last_event: self.last_event.clone(),
                })
            }
        }
    }

    /// Process one event to completion.
    pub async fn handle(&mut self, raw: RawEvent) -> Result<Step, ReconcileError> {
        if self.state.is_terminal() {
            return Ok(Step::Done);
        }

        self.last_event = Some(raw.kind.clone());
        let snapshot = raw.payload.clone();

        let event = match DeploymentEvent::decode(raw) {
            Ok(event) => event,
            Err(malformed) => {
                self.diagnostics.warn(
                    Warning::malformed_event(malformed.to_string())
                        .with_event(malformed.kind, malformed.payload),
                );
                return Ok(Step::Continue);
            }
        };

        match event {
            DeploymentEvent::Created { deployment, raw } => {
                self.on_created(&deployment, raw).await?;
                Ok(Step::Continue)
            }
            DeploymentEvent::HashesCalculated { files } => {
                tracing::debug!(files, "provider hashed application files");
                Ok(Step::Continue)
            }
            DeploymentEvent::Progress {
                kind,
                ready_state,
                deployment,
            } => {
                self.on_progress(&kind, &ready_state, &deployment, snapshot)
                    .await;
                Ok(Step::Continue)
            }
            DeploymentEvent::Ready(payload) => self.on_terminal(payload, true, snapshot).await,
            DeploymentEvent::Error(payload) => self.on_terminal(payload, false, snapshot).await,
            DeploymentEvent::Informational { kind } => {
                tracing::debug!(event = %kind, "provider event");
                Ok(Step::Continue)
            }
        }
    }

    async fn on_created(
        &mut self,
        deployment: &DeploymentPayload,
        raw: Value,
    ) -> Result<(), ReconcileError> {
        if let Some(existing) = self.state.tracked() {
            let message = format!(
                "ignoring repeated `created` event; deployment {} is already registered",
                existing.id
            );
            self.diagnostics
                .warn(Warning::duplicate_creation(message).with_event("created", raw));
            return Ok(());
        }

        let request = RegisterRequest {
            description: self.context.description.clone(),
            environment: deployment
                .target()
                .unwrap_or(self.context.environment.as_str())
                .to_string(),
            correlated_ref: self.context.correlated_ref.clone(),
            payload: raw,
        };

        let tracked = match self.tracker.register(&request).await {
            Ok(tracked) => tracked,
            Err(source) => {
                tracing::error!(error = %source, correlated_ref = %request.correlated_ref, "deployment registration failed");
                return Err(ReconcileError::CreationFailed { source });
            }
        };

        tracing::info!(
            tracking_id = %tracked.id,
            environment = %tracked.environment,
            provider_id = deployment.id.as_deref().unwrap_or_default(),
            "registered deployment"
        );
        self.provider_id = deployment.deployment_id();
        self.state = ReconcileState::Tracking(tracked);
        Ok(())
    }

    async fn on_progress(
        &mut self,
        kind: &str,
        ready_state: &str,
        deployment: &DeploymentPayload,
        snapshot: Value,
    ) {
        let Some(tracked) = self.tracking() else {
            self.diagnostics.warn(
                Warning::dropped_event(format!(
                    "dropping `{kind}` ({ready_state}): no deployment registered yet"
                ))
                .with_event(kind, snapshot),
            );
            return;
        };

        let update = status_update(&tracked, status::map(ready_state), deployment);
        match self.tracker.append_status(&update).await {
            Ok(recorded) => {
                tracing::info!(
                    tracking_id = %update.deployment_id,
                    ready_state,
                    status = %update.status,
                    recorded = %recorded.state,
                    "status updated"
                );
            }
            Err(e) => {
                self.diagnostics.warn(
                    Warning::status_append(format!(
                        "failed to record status {} for `{kind}`: {e}",
                        update.status
                    ))
                    .with_event(kind, snapshot),
                );
            }
        }
    }

    async fn on_terminal(
        &mut self,
        payload: DeploymentPayload,
        succeeded: bool,
        snapshot: Value,
    ) -> Result<Step, ReconcileError> {
        let kind = if succeeded { "ready" } else { "error" };
        let Some(tracked) = self.tracking() else {
            self.diagnostics.warn(
                Warning::dropped_event(format!(
                    "dropping `{kind}`: no deployment registered yet"
                ))
                .with_event(kind, snapshot),
            );
            return Ok(Step::Continue);
        };

        let status = if succeeded {
            CanonicalStatus::Success
        } else {
            CanonicalStatus::Error
        };
        let update = status_update(&tracked, status, &payload);
        if let Err(source) = self.tracker.append_status(&update).await {
            tracing::error!(error = %source, status = %status, "failed to record final status");
            return Err(ReconcileError::AppendFailed { status, source });
        }

        let outputs = PipelineOutputs::from_terminal(&payload, self.provider_id.as_ref());
        publish(self.sink, &outputs)?;
        self.outputs = Some(outputs.clone());
        self.state = ReconcileState::Terminal {
            deployment: tracked,
            outcome: if succeeded {
                Outcome::Succeeded
            } else {
                Outcome::Failed
            },
        };

        if succeeded {
            tracing::info!(
                environment_url = %outputs.environment_url,
                deployment_id = %outputs.deployment_id,
                "deployment ready"
            );
            return Ok(Step::Done);
        }

        let message = payload
            .failure_message()
            .unwrap_or("the provider reported an error")
            .to_string();
        tracing::error!(deployment_id = %outputs.deployment_id, message, "deployment failed");
        Err(ReconcileError::DeploymentFailed {
            deployment_id: outputs.deployment_id.clone(),
            message,
            outputs,
        })
    }

    /// Record `failure` on a registered deployment the stream left unfinished.
    async fn abandon(&mut self) {
        let Some(tracked) = self.tracking() else {
            return;
        };

        let update = StatusUpdate {
            deployment_id: tracked.id.clone(),
            status: CanonicalStatus::Failure,
            environment: tracked.environment.clone(),
            log_url: None,
            environment_url: None,
        };
        if let Err(e) = self.tracker.append_status(&update).await {
            tracing::warn!(error = %e, tracking_id = %tracked.id, "failed to mark abandoned deployment as failed");
        }

        self.state = ReconcileState::Terminal {
            deployment: tracked,
            outcome: Outcome::Abandoned,
        };
    }

    fn tracking(&self) -> Option<TrackedDeployment> {
        match &self.state {
            ReconcileState::Tracking(tracked) => Some(tracked.clone()),
            _ => None,
        }
    }
}

fn status_update(
    tracked: &TrackedDeployment,
    status: CanonicalStatus,
    deployment: &DeploymentPayload,
) -> StatusUpdate {
    StatusUpdate {
        deployment_id: tracked.id.clone(),
        status,
        environment: deployment
            .target()
            .unwrap_or(&tracked.environment)
            .to_string(),
        log_url: deployment.log_url(),
        environment_url: deployment.preview_url(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracked() -> TrackedDeployment {
        TrackedDeployment {
            id: TrackingId::new("DE_1"),
            environment: "staging".to_string(),
            initial_status_url: None,
        }
    }

    #[test]
    fn status_update_prefers_payload_target() {
        let payload = DeploymentPayload {
            target: Some("production".to_string()),
            url: Some("site-1.vercel.app".to_string()),
            ..Default::default()
        };
        let update = status_update(&tracked(), CanonicalStatus::Pending, &payload);
        assert_eq!(update.environment, "production");
        assert_eq!(update.environment_url.as_deref(), Some("https://site-1.vercel.app"));
        assert_eq!(update.log_url.as_deref(), Some("https://site-1.vercel.app"));
    }

    #[test]
    fn status_update_falls_back_to_registered_environment() {
        let update = status_update(
            &tracked(),
            CanonicalStatus::Queued,
            &DeploymentPayload::default(),
        );
        assert_eq!(update.environment, "staging");
        assert_eq!(update.deployment_id.as_str(), "DE_1");
        assert!(update.log_url.is_none());
        assert!(update.environment_url.is_none());
    }
}
