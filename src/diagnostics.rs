// ABOUTME: Diagnostics accumulator for non-fatal problems during a reconciliation run.
// ABOUTME: Each warning is logged when recorded and kept for the run report.

use serde::Serialize;
use serde_json::Value;

/// Collects non-fatal warnings during a run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        match &warning.event {
            Some(event) => {
                let payload = warning.payload.clone().unwrap_or_default();
                tracing::warn!(
                    kind = ?warning.kind,
                    event = %event,
                    payload = %payload,
                    "{}",
                    warning.message
                )
            }
            None => tracing::warn!(kind = ?warning.kind, "{}", warning.message),
        }
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

/// A non-fatal warning, with the event that caused it when there is one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Warning {
    fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            event: None,
            payload: None,
        }
    }

    /// Attach the event type and a payload snapshot.
    pub fn with_event(mut self, event: impl Into<String>, payload: Value) -> Self {
        self.event = Some(event.into());
        self.payload = Some(payload);
        self
    }

    /// A status event arrived before any deployment was registered.
    pub fn dropped_event(message: impl Into<String>) -> Self {
        Self::new(WarningKind::DroppedEvent, message)
    }

    pub fn malformed_event(message: impl Into<String>) -> Self {
        Self::new(WarningKind::MalformedEvent, message)
    }

    /// An intermediate status could not be appended.
    pub fn status_append(message: impl Into<String>) -> Self {
        Self::new(WarningKind::StatusAppend, message)
    }

    pub fn duplicate_creation(message: impl Into<String>) -> Self {
        Self::new(WarningKind::DuplicateCreation, message)
    }

    pub fn log_fetch(message: impl Into<String>) -> Self {
        Self::new(WarningKind::LogFetch, message)
    }
}

/// Categories of warnings that can occur during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// Status event before `created`; nothing to attach it to.
    DroppedEvent,
    /// Event payload could not be decoded.
    MalformedEvent,
    /// Intermediate status update was rejected.
    StatusAppend,
    /// A second `created` event in one run.
    DuplicateCreation,
    /// Build logs could not be retrieved after a failure.
    LogFetch,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::status_append("tracking API returned 502"));
        diag.warn(
            Warning::dropped_event("no deployment registered yet")
                .with_event("build-state-changed", json!({"readyState": "BUILDING"})),
        );

        let warnings = diag.warnings();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[1].event.as_deref(), Some("build-state-changed"));
        assert_eq!(warnings[1].payload, Some(json!({"readyState": "BUILDING"})));
    }

    #[test]
    fn event_without_payload_is_recorded() {
        let mut diag = Diagnostics::default();
        diag.warn(Warning {
            event: Some("ready".to_string()),
            ..Warning::dropped_event("no deployment registered yet")
        });

        assert_eq!(diag.warnings().len(), 1);
        assert_eq!(diag.warnings()[0].event.as_deref(), Some("ready"));
        assert!(diag.warnings()[0].payload.is_none());
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        assert_eq!(Warning::dropped_event("x").kind, WarningKind::DroppedEvent);
        assert_eq!(Warning::malformed_event("x").kind, WarningKind::MalformedEvent);
        assert_eq!(Warning::status_append("x").kind, WarningKind::StatusAppend);
        assert_eq!(
            Warning::duplicate_creation("x").kind,
            WarningKind::DuplicateCreation
        );
        assert_eq!(Warning::log_fetch("x").kind, WarningKind::LogFetch);
    }

    #[test]
    fn warnings_serialize_for_json_output() {
        let json = serde_json::to_value(Warning::log_fetch("npm not found")).unwrap();
        assert_eq!(json, json!({"kind": "log-fetch", "message": "npm not found"}));
    }
}
