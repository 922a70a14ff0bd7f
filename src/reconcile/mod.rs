// ABOUTME: Deployment-lifecycle reconciliation between the provider stream and the tracker.
// ABOUTME: Registration is fatal, intermediate statuses best-effort, the final status strict.

mod error;
mod reconciler;
mod state;

pub use error::ReconcileError;
pub use reconciler::{Reconciler, RunContext, RunReport, Step};
pub use state::{Outcome, ReconcileState};
