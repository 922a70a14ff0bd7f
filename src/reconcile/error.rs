// ABOUTME: Fatal errors of a reconciliation run.
// ABOUTME: Non-fatal problems are diagnostics warnings instead.

use crate::outputs::{OutputError, PipelineOutputs};
use crate::provider::ProviderError;
use crate::status::CanonicalStatus;
use crate::tracking::TrackingError;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Registration failed; no status can ever be reported for this run.
    #[error("failed to register deployment: {source}")]
    CreationFailed {
        #[source]
        source: TrackingError,
    },

    /// The terminal status could not be recorded.
    #[error("failed to record final status {status}: {source}")]
    AppendFailed {
        status: CanonicalStatus,
        #[source]
        source: TrackingError,
    },

    #[error("provider event stream ended before the deployment finished{}", last_event_suffix(.last_event))]
    StreamTerminatedEarly { last_event: Option<String> },

    /// The provider connection failed mid-run.
    #[error("lost connection to provider: {source}")]
    Stream {
        #[source]
        source: ProviderError,
    },

    /// The provider reported the deployment as failed.
    #[error("deployment {deployment_id} failed: {message}")]
    DeploymentFailed {
        deployment_id: String,
        message: String,
        /// Outputs published before failing.
        outputs: PipelineOutputs,
    },

    #[error("failed to publish outputs: {0}")]
    Publish(#[from] OutputError),
}

fn last_event_suffix(last_event: &Option<String>) -> String {
    match last_event {
        Some(kind) => format!(" (last event: {kind})"),
        None => " (no events received)".to_string(),
    }
}

impl ReconcileError {
    /// Provider deployment id, when the provider got far enough to assign one.
    pub fn deployment_id(&self) -> Option<&str> {
        match self {
            ReconcileError::DeploymentFailed { deployment_id, .. } if !deployment_id.is_empty() => {
                Some(deployment_id)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn early_termination_names_last_event() {
        let err = ReconcileError::StreamTerminatedEarly {
            last_event: Some("build-state-changed".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "provider event stream ended before the deployment finished (last event: build-state-changed)"
        );

        let err = ReconcileError::StreamTerminatedEarly { last_event: None };
        assert!(err.to_string().ends_with("(no events received)"));
    }

    #[test]
    fn deployment_failure_exposes_id() {
        let err = ReconcileError::DeploymentFailed {
            deployment_id: "dpl_1".to_string(),
            message: "Build failed".to_string(),
            outputs: PipelineOutputs::default(),
        };
        assert_eq!(err.deployment_id(), Some("dpl_1"));
        assert_eq!(err.to_string(), "deployment dpl_1 failed: Build failed");
    }
}
