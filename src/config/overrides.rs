// ABOUTME: Optional JSON override file (deploy-now.json) and deep JSON merging.
// ABOUTME: Every key is optional; `deployment` is merged into the provider request body.

use nonempty::NonEmpty;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::EnvValue;
use crate::error::{Error, Result};

pub const OVERRIDE_FILENAME: &str = "deploy-now.json";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideFile {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_list")]
    pub alias: Option<Vec<String>>,

    #[serde(default, deserialize_with = "deserialize_regions")]
    pub regions: Option<NonEmpty<String>>,

    #[serde(default)]
    pub scope: Option<String>,

    #[serde(default)]
    pub team_id: Option<String>,

    #[serde(default)]
    pub api_url: Option<String>,

    #[serde(default, with = "humantime_serde")]
    pub poll_interval: Option<Duration>,

    #[serde(default)]
    pub now_token: Option<EnvValue>,

    #[serde(default)]
    pub github_token: Option<EnvValue>,

    #[serde(default)]
    pub logs_command: Option<Vec<String>>,

    #[serde(default)]
    pub fetch_logs_on_error: Option<bool>,

    #[serde(default)]
    pub deployment: Map<String, Value>,
}

impl OverrideFile {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))
    }

    /// Load `deploy-now.json` from `dir` if it exists.
    pub fn discover(dir: &Path) -> Result<Option<(PathBuf, Self)>> {
        let path = dir.join(OVERRIDE_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }
        let file = Self::load(&path)?;
        Ok(Some((path, file)))
    }
}

/// Deep-merge `patch` into `target`: objects merge key by key, anything else replaces.
pub fn merge_json(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListEntry {
    Joined(String),
    Items(Vec<String>),
}

impl ListEntry {
    fn into_vec(self) -> Vec<String> {
        match self {
            ListEntry::Joined(s) => super::parse_list(&s),
            ListEntry::Items(items) => items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

fn deserialize_list<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<ListEntry> = Option::deserialize(deserializer)?;
    Ok(opt.map(ListEntry::into_vec))
}

fn deserialize_regions<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NonEmpty<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<ListEntry> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(entry) => {
            let regions = NonEmpty::from_vec(entry.into_vec())
                .ok_or_else(|| serde::de::Error::custom("regions list cannot be empty"))?;
            Ok(Some(regions))
        }
    }
}
