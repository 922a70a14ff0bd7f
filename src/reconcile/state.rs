// ABOUTME: Per-run reconciliation state: awaiting creation, tracking a record, or terminal.
// ABOUTME: A tracked deployment exists in every state after the first successful registration.

use crate::tracking::TrackedDeployment;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `ready` was recorded.
    Succeeded,
    /// `error` was recorded.
    Failed,
    /// The stream broke off; a best-effort `failure` was attempted.
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReconcileState {
    #[default]
    AwaitingCreation,
    Tracking(TrackedDeployment),
    Terminal {
        deployment: TrackedDeployment,
        outcome: Outcome,
    },
}

impl ReconcileState {
    pub fn tracked(&self) -> Option<&TrackedDeployment> {
        match self {
            ReconcileState::AwaitingCreation => None,
            ReconcileState::Tracking(deployment) => Some(deployment),
            ReconcileState::Terminal { deployment, .. } => Some(deployment),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReconcileState::Terminal { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReconcileState::AwaitingCreation => "awaiting-creation",
            ReconcileState::Tracking(_) => "tracking",
            ReconcileState::Terminal { .. } => "terminal",
        }
    }
}
