// ABOUTME: Hosting provider integration: event envelope, file manifest, and API client.
// ABOUTME: Produces the ordered deployment event stream consumed by the reconciler.

mod client;
mod error;
mod event;
mod manifest;
mod options;

pub use client::{EventStream, ProviderClient, transition_events};
pub use error::{ProviderError, ProviderErrorKind};
pub use event::{DeploymentEvent, DeploymentPayload, MalformedEvent, RawEvent, kinds};
pub use manifest::{FileEntry, FileManifest, IGNORED_DIRS};
pub use options::DeploymentOptions;
