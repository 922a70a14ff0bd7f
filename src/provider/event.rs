// ABOUTME: Provider deployment events: the wire envelope and its decoded variants.
// ABOUTME: Payloads are decoded once at the stream boundary; failures become MalformedEvent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ProviderDeploymentId, normalize_url};

/// Event type names used on the provider stream.
pub mod kinds {
    pub const CREATED: &str = "created";
    pub const HASHES_CALCULATED: &str = "hashes-calculated";
    pub const FILE_COUNT: &str = "file-count";
    pub const ALL_FILES_UPLOADED: &str = "all-files-uploaded";
    pub const BUILDING: &str = "building";
    pub const BUILD_STATE_CHANGED: &str = "build-state-changed";
    pub const DEPLOYMENT_STATE_CHANGED: &str = "deployment-state-changed";
    pub const READY: &str = "ready";
    pub const ERROR: &str = "error";
}

/// One undecoded item from the provider stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl RawEvent {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

/// Deployment fields carried by status-bearing events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPayload {
    pub id: Option<String>,
    pub url: Option<String>,
    pub name: Option<String>,
    pub target: Option<String>,
    pub ready_state: Option<String>,
    pub alias: Option<Vec<String>>,
    pub inspector_url: Option<String>,
    pub error_message: Option<String>,
    pub message: Option<String>,
}

impl DeploymentPayload {
    /// Provider-assigned deployment id.
    pub fn deployment_id(&self) -> Option<ProviderDeploymentId> {
        non_empty(self.id.as_deref()).map(ProviderDeploymentId::new)
    }

    /// Target environment reported by the provider, if any.
    pub fn target(&self) -> Option<&str> {
        non_empty(self.target.as_deref())
    }

    pub fn aliases(&self) -> &[String] {
        self.alias.as_deref().unwrap_or_default()
    }

    /// The raw deployment URL with an explicit scheme.
    pub fn deployment_url(&self) -> Option<String> {
        non_empty(self.url.as_deref()).map(normalize_url)
    }

    /// First alias if one is assigned, else the deployment URL.
    pub fn preview_url(&self) -> Option<String> {
        self.aliases()
            .iter()
            .find_map(|alias| non_empty(Some(alias.as_str())))
            .map(normalize_url)
            .or_else(|| self.deployment_url())
    }

    /// Where build logs can be read: the inspector page, else the deployment URL.
    pub fn log_url(&self) -> Option<String> {
        non_empty(self.inspector_url.as_deref())
            .map(normalize_url)
            .or_else(|| self.deployment_url())
    }

    pub fn failure_message(&self) -> Option<&str> {
        non_empty(self.error_message.as_deref()).or_else(|| non_empty(self.message.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A decoded provider event.
#[derive(Debug, Clone, PartialEq)]
pub enum DeploymentEvent {
    /// The provider accepted the deployment. `raw` is forwarded to the tracking system.
    Created {
        deployment: DeploymentPayload,
        raw: Value,
    },
    /// File digests were computed. Informational.
    HashesCalculated { files: Option<u64> },
    /// Readiness changed while building or deploying.
    Progress {
        kind: String,
        ready_state: String,
        deployment: DeploymentPayload,
    },
    /// Terminal success.
    Ready(DeploymentPayload),
    /// Terminal failure.
    Error(DeploymentPayload),
    /// Anything else the provider emits (uploads, notices, aliasing).
    Informational { kind: String },
}

impl DeploymentEvent {
    /// Decode a raw envelope into a typed event.
    pub fn decode(raw: RawEvent) -> Result<Self, MalformedEvent> {
        match raw.kind.as_str() {
            kinds::CREATED => {
                let deployment = parse_payload(&raw)?;
                Ok(DeploymentEvent::Created {
                    deployment,
                    raw: raw.payload,
                })
            }
            kinds::HASHES_CALCULATED => Ok(DeploymentEvent::HashesCalculated {
                files: file_count(&raw.payload),
            }),
            kinds::BUILDING | kinds::BUILD_STATE_CHANGED | kinds::DEPLOYMENT_STATE_CHANGED => {
                let deployment = parse_payload(&raw)?;
                let ready_state = non_empty(deployment.ready_state.as_deref())
                    .map(str::to_string)
                    .ok_or_else(|| MalformedEvent::new(&raw, "missing readyState"))?;
                Ok(DeploymentEvent::Progress {
                    kind: raw.kind,
                    ready_state,
                    deployment,
                })
            }
            kinds::READY => parse_payload(&raw).map(DeploymentEvent::Ready),
            kinds::ERROR => parse_error_payload(&raw).map(DeploymentEvent::Error),
            _ => Ok(DeploymentEvent::Informational { kind: raw.kind }),
        }
    }

    /// The event type name.
    pub fn kind(&self) -> &str {
        match self {
            DeploymentEvent::Created { .. } => kinds::CREATED,
            DeploymentEvent::HashesCalculated { .. } => kinds::HASHES_CALCULATED,
            DeploymentEvent::Progress { kind, .. } => kind,
            DeploymentEvent::Ready(_) => kinds::READY,
            DeploymentEvent::Error(_) => kinds::ERROR,
            DeploymentEvent::Informational { kind } => kind,
        }
    }
}

fn parse_payload(raw: &RawEvent) -> Result<DeploymentPayload, MalformedEvent> {
    if !raw.payload.is_object() {
        return Err(MalformedEvent::new(raw, "payload is not an object"));
    }
    serde_json::from_value(raw.payload.clone())
        .map_err(|e| MalformedEvent::new(raw, format!("invalid payload: {e}")))
}

// Error payloads are sometimes a bare message rather than a deployment.
fn parse_error_payload(raw: &RawEvent) -> Result<DeploymentPayload, MalformedEvent> {
    match &raw.payload {
        Value::String(message) => Ok(DeploymentPayload {
            message: Some(message.clone()),
            ..Default::default()
        }),
        Value::Null => Ok(DeploymentPayload::default()),
        _ => parse_payload(raw),
    }
}

fn file_count(payload: &Value) -> Option<u64> {
    match payload {
        Value::Object(map) => map
            .get("files")
            .and_then(Value::as_u64)
            .or(Some(map.len() as u64)),
        Value::Array(items) => Some(items.len() as u64),
        _ => None,
    }
}

/// A provider event whose payload lacks what its type requires.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("malformed `{kind}` event: {reason}")]
pub struct MalformedEvent {
    pub kind: String,
    pub reason: String,
    /// Snapshot of the offending payload, kept for diagnosis.
    pub payload: Value,
}

impl MalformedEvent {
    pub fn new(raw: &RawEvent, reason: impl Into<String>) -> Self {
        Self {
            kind: raw.kind.clone(),
            reason: reason.into(),
            payload: raw.payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_created_and_keeps_raw_payload() {
        let payload = json!({"id": "dpl_1", "url": "app-1.now.sh", "target": "production"});
        let event = DeploymentEvent::decode(RawEvent::new("created", payload.clone())).unwrap();

        match event {
            DeploymentEvent::Created { deployment, raw } => {
                assert_eq!(deployment.id.as_deref(), Some("dpl_1"));
                assert_eq!(deployment.target(), Some("production"));
                assert_eq!(raw, payload);
            }
            other => panic!("expected created, got {other:?}"),
        }
    }

    #[test]
    fn progress_requires_ready_state() {
        let err = DeploymentEvent::decode(RawEvent::new(
            "build-state-changed",
            json!({"id": "dpl_1", "target": "staging"}),
        ))
        .unwrap_err();

        assert_eq!(err.kind, "build-state-changed");
        assert!(err.reason.contains("readyState"));
        assert_eq!(err.payload["id"], "dpl_1");
    }

    #[test]
    fn progress_carries_ready_state() {
        let event = DeploymentEvent::decode(RawEvent::new(
            "building",
            json!({"readyState": "BUILDING", "target": "staging"}),
        ))
        .unwrap();

        assert_eq!(event.kind(), "building");
        match event {
            DeploymentEvent::Progress { ready_state, .. } => assert_eq!(ready_state, "BUILDING"),
            other => panic!("expected progress, got {other:?}"),
        }
    }

    #[test]
    fn non_object_payload_is_malformed() {
        let err = DeploymentEvent::decode(RawEvent::new("ready", json!("nope"))).unwrap_err();
        assert!(err.reason.contains("not an object"));
    }

    #[test]
    fn mistyped_field_is_malformed() {
        let err =
            DeploymentEvent::decode(RawEvent::new("ready", json!({"url": 42}))).unwrap_err();
        assert!(err.reason.starts_with("invalid payload"));
    }

    #[test]
    fn error_accepts_bare_message() {
        let event = DeploymentEvent::decode(RawEvent::new("error", json!("build exploded"))).unwrap();
        match event {
            DeploymentEvent::Error(payload) => {
                assert_eq!(payload.failure_message(), Some("build exploded"))
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_types_are_informational() {
        let event = DeploymentEvent::decode(RawEvent::new("alias-assigned", Value::Null)).unwrap();
        assert_eq!(
            event,
            DeploymentEvent::Informational {
                kind: "alias-assigned".to_string()
            }
        );
    }

    #[test]
    fn hashes_calculated_counts_files() {
        let event =
            DeploymentEvent::decode(RawEvent::new("hashes-calculated", json!({"files": 12})))
                .unwrap();
        assert_eq!(event, DeploymentEvent::HashesCalculated { files: Some(12) });

        let event = DeploymentEvent::decode(RawEvent::new(
            "hashes-calculated",
            json!({"abc": {"names": ["a"]}, "def": {"names": ["b"]}}),
        ))
        .unwrap();
        assert_eq!(event, DeploymentEvent::HashesCalculated { files: Some(2) });
    }

    #[test]
    fn preview_url_prefers_first_alias() {
        let payload = DeploymentPayload {
            url: Some("app-abc.now.sh".to_string()),
            alias: Some(vec!["app.example.com".to_string(), "www.example.com".to_string()]),
            ..Default::default()
        };
        assert_eq!(payload.preview_url().as_deref(), Some("https://app.example.com"));
        assert_eq!(payload.deployment_url().as_deref(), Some("https://app-abc.now.sh"));
    }

    #[test]
    fn preview_url_falls_back_to_deployment_url() {
        let payload = DeploymentPayload {
            url: Some("app-abc.now.sh".to_string()),
            alias: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(payload.preview_url().as_deref(), Some("https://app-abc.now.sh"));
        assert_eq!(DeploymentPayload::default().preview_url(), None);
    }

    #[test]
    fn log_url_prefers_inspector() {
        let payload = DeploymentPayload {
            url: Some("app-abc.now.sh".to_string()),
            inspector_url: Some("vercel.com/team/app/abc".to_string()),
            ..Default::default()
        };
        assert_eq!(payload.log_url().as_deref(), Some("https://vercel.com/team/app/abc"));

        let payload = DeploymentPayload {
            url: Some("app-abc.now.sh".to_string()),
            ..Default::default()
        };
        assert_eq!(payload.log_url().as_deref(), Some("https://app-abc.now.sh"));
    }

    #[test]
    fn blank_target_is_treated_as_missing() {
        let payload = DeploymentPayload {
            target: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(payload.target(), None);
    }
}
