// ABOUTME: Deployment request body sent to the provider.
// ABOUTME: Built from resolved config and GitHub context, then merged with file overrides.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::config::{Config, GithubContext, merge_json};
use crate::types::Target;

/// Provider deployment options, before overrides.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentOptions {
    pub name: String,
    pub target: Target,
    pub alias: Vec<String>,
    pub regions: Vec<String>,
    pub public: bool,
    pub meta: BTreeMap<String, String>,
}

impl DeploymentOptions {
    pub fn new(config: &Config, context: &GithubContext) -> Self {
        Self {
            name: config.app_name.clone(),
            target: config.target,
            alias: config.aliases.clone(),
            regions: config.regions.iter().cloned().collect(),
            public: false,
            meta: context.deployment_meta(),
        }
    }

    /// Serialize and deep-merge `overrides` on top.
    pub fn to_request_body(&self, overrides: &Map<String, Value>) -> serde_json::Result<Value> {
        let mut body = serde_json::to_value(self)?;
        merge_json(&mut body, &Value::Object(overrides.clone()));
        Ok(body)
    }
}
