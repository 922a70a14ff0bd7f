// ABOUTME: Deployment target environment (production or staging).
// ABOUTME: Serialized lowercase, as both the provider and tracking system expect.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown deployment target: {0}")]
pub struct ParseTargetError(String);

/// Logical environment a deployment is published to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Production,
    #[default]
    Staging,
}

impl Target {
    /// Choose the target from the `prod` flag.
    pub fn from_prod_flag(prod: bool) -> Self {
        if prod {
            Target::Production
        } else {
            Target::Staging
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Production => "production",
            Target::Staging => "staging",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = ParseTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Target::Production),
            "staging" | "preview" => Ok(Target::Staging),
            other => Err(ParseTargetError(other.to_string())),
        }
    }
}
