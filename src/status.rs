// ABOUTME: Canonical deployment status vocabulary and the provider readiness mapping.
// ABOUTME: Pure and total: unknown readiness codes map to Inactive.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deployment status as recorded in the tracking system.
///
/// Serialized in SCREAMING_SNAKE_CASE, which is the wire form of the GitHub
/// `DeploymentStatusState` enum. Every status sent to the tracking system goes
/// through [`CanonicalStatus::as_wire`], so the casing is uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonicalStatus {
    Queued,
    Pending,
    InProgress,
    Success,
    Failure,
    Error,
    Inactive,
}

/// Status used for provider readiness codes with no mapping.
pub const DEFAULT_STATUS: CanonicalStatus = CanonicalStatus::Inactive;

impl CanonicalStatus {
    /// Map a provider readiness code (`readyState`) to a canonical status.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Anything unrecognized maps to [`DEFAULT_STATUS`].
    pub fn from_ready_state(ready_state: &str) -> Self {
        match ready_state.trim().to_ascii_uppercase().as_str() {
            "QUEUED" | "ANALYZING" | "INITIALIZING" => CanonicalStatus::Queued,
            "BUILDING" => CanonicalStatus::Pending,
            "DEPLOYING" => CanonicalStatus::InProgress,
            "ERROR" => CanonicalStatus::Error,
            "READY" => CanonicalStatus::Success,
            _ => DEFAULT_STATUS,
        }
    }

    /// Wire value sent to the tracking system.
    pub fn as_wire(&self) -> &'static str {
        match self {
            CanonicalStatus::Queued => "QUEUED",
            CanonicalStatus::Pending => "PENDING",
            CanonicalStatus::InProgress => "IN_PROGRESS",
            CanonicalStatus::Success => "SUCCESS",
            CanonicalStatus::Failure => "FAILURE",
            CanonicalStatus::Error => "ERROR",
            CanonicalStatus::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Map a provider readiness code to a canonical status.
pub fn map(ready_state: &str) -> CanonicalStatus {
    CanonicalStatus::from_ready_state(ready_state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_mappings() {
        let table = [
            ("QUEUED", CanonicalStatus::Queued),
            ("ANALYZING", CanonicalStatus::Queued),
            ("INITIALIZING", CanonicalStatus::Queued),
            ("BUILDING", CanonicalStatus::Pending),
            ("DEPLOYING", CanonicalStatus::InProgress),
            ("ERROR", CanonicalStatus::Error),
            ("READY", CanonicalStatus::Success),
        ];

        for (code, expected) in table {
            assert_eq!(map(code), expected, "readyState {code}");
        }
    }

    #[test]
    fn unknown_codes_fall_back_to_inactive() {
        assert_eq!(map("CANCELED"), CanonicalStatus::Inactive);
        assert_eq!(map(""), CanonicalStatus::Inactive);
        assert_eq!(map("FROZEN"), DEFAULT_STATUS);
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(map("building"), CanonicalStatus::Pending);
        assert_eq!(map(" Ready "), CanonicalStatus::Success);
    }

    #[test]
    fn wire_values_are_screaming_snake_case() {
        assert_eq!(CanonicalStatus::InProgress.as_wire(), "IN_PROGRESS");
        assert_eq!(
            serde_json::to_string(&CanonicalStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(CanonicalStatus::Queued.to_string(), "QUEUED");
    }
}
