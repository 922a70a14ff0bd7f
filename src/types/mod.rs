// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Phantom-typed ids, deployment targets, and URL normalization.

mod id;
mod target;
mod link;

pub use id::{Id, NodeId, ProviderDeploymentId, TrackingId};
pub use target::{ParseTargetError, Target};
pub use link::{DEFAULT_SCHEME, normalize_url};
