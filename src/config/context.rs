// ABOUTME: GitHub Actions run context: repository, commit, actor, ref and event payload.
// ABOUTME: Supplies the correlated ref, description and provider meta for a deployment.

use serde_json::Value;
use std::collections::BTreeMap;

use super::Inputs;
use crate::error::{Error, Result};
use crate::tracking::{CorrelatedRef, Repository};

#[derive(Debug, Clone, Default)]
pub struct GithubContext {
    pub repository: Option<Repository>,
    pub sha: Option<String>,
    pub actor: Option<String>,
    pub git_ref: Option<String>,
    pub head_ref: Option<String>,
    /// Webhook payload of the triggering event.
    pub event: Value,
}

impl GithubContext {
    /// Read the context the Actions runner exports.
    pub fn load(inputs: &Inputs) -> Result<Self> {
        let event = match inputs.var("GITHUB_EVENT_PATH") {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| Error::InvalidConfig(format!("event payload {path}: {e}")))?;
                serde_json::from_str(&content)
                    .map_err(|e| Error::InvalidConfig(format!("event payload {path}: {e}")))?
            }
            None => Value::Null,
        };

        Ok(Self::from_parts(
            inputs.var("GITHUB_REPOSITORY"),
            inputs.var("GITHUB_SHA"),
            inputs.var("GITHUB_ACTOR"),
            inputs.var("GITHUB_REF"),
            inputs.var("GITHUB_HEAD_REF"),
            event,
        ))
    }

    pub fn from_parts(
        repository: Option<&str>,
        sha: Option<&str>,
        actor: Option<&str>,
        git_ref: Option<&str>,
        head_ref: Option<&str>,
        event: Value,
    ) -> Self {
        Self {
            repository: repository.and_then(Repository::parse),
            sha: sha.map(str::to_string),
            actor: actor.map(str::to_string),
            git_ref: git_ref.map(str::to_string),
            head_ref: head_ref.map(str::to_string),
            event,
        }
    }

    pub fn pull_request_number(&self) -> Option<u64> {
        self.event
            .pointer("/pull_request/number")
            .and_then(Value::as_u64)
    }

    /// Branch name: `GITHUB_HEAD_REF` on pull requests, else the short `GITHUB_REF`.
    pub fn branch(&self) -> Option<String> {
        if let Some(head) = self.head_ref.as_deref().filter(|h| !h.is_empty()) {
            return Some(head.to_string());
        }
        let git_ref = self.git_ref.as_deref()?;
        git_ref
            .strip_prefix("refs/heads/")
            .map(str::to_string)
    }

    /// Pull request when the event has one, otherwise the branch.
    pub fn correlated_ref(&self) -> Option<CorrelatedRef> {
        self.pull_request_number()
            .map(CorrelatedRef::PullRequest)
            .or_else(|| self.branch().map(CorrelatedRef::Branch))
    }

    pub fn commit_message(&self) -> Option<&str> {
        self.event
            .pointer("/head_commit/message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
    }

    pub fn pull_request_title(&self) -> Option<&str> {
        self.event
            .pointer("/pull_request/title")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
    }

    pub fn short_sha(&self) -> Option<&str> {
        self.sha.as_deref().map(|sha| sha.get(..7).unwrap_or(sha))
    }

    /// Human-readable deployment description.
    pub fn description(&self) -> String {
        if let Some(message) = self.commit_message() {
            return message.lines().next().unwrap_or(message).trim().to_string();
        }
        if let Some(title) = self.pull_request_title() {
            return title.trim().to_string();
        }
        match self.short_sha() {
            Some(sha) => format!("Deploy {sha}"),
            None => "Deploy".to_string(),
        }
    }

    /// Provider deployment `meta` linking the deployment back to the commit.
    pub fn deployment_meta(&self) -> BTreeMap<String, String> {
        let mut meta = BTreeMap::new();
        meta.insert("githubDeployment".to_string(), "1".to_string());

        if let Some(sha) = &self.sha {
            meta.insert("githubCommitSha".to_string(), sha.clone());
        }
        if let Some(actor) = &self.actor {
            meta.insert("githubCommitAuthorName".to_string(), actor.clone());
            meta.insert("githubCommitAuthorLogin".to_string(), actor.clone());
        }
        if let Some(repo) = &self.repository {
            meta.insert("githubOrg".to_string(), repo.owner.clone());
            meta.insert("githubRepo".to_string(), repo.name.clone());
            meta.insert("githubCommitOrg".to_string(), repo.owner.clone());
            meta.insert("githubCommitRepo".to_string(), repo.name.clone());
        }
        if let Some(message) = self.commit_message() {
            meta.insert("githubCommitMessage".to_string(), message.to_string());
        }
        if let Some(branch) = self.branch() {
            meta.insert("githubCommitRef".to_string(), branch);
        }
        meta
    }
}
