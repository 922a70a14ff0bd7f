// ABOUTME: Integration tests for the deploy-now CLI commands.
// ABOUTME: Validates help output, input validation failures and the logs command.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

/// Binary with a scrubbed environment so runner variables on the host don't leak in.
fn deploy_now_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("deploy-now"));
    cmd.env_clear();
    if let Some(path) = std::env::var_os("PATH") {
        cmd.env("PATH", path);
    }
    cmd
}

fn app_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("package.json"), "{}").unwrap();
    dir
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn help_shows_commands() {
    deploy_now_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("logs"));
}

#[test]
fn deploy_help_lists_inputs() {
    deploy_now_cmd()
        .args(["deploy", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--package"))
        .stdout(predicate::str::contains("--prod"))
        .stdout(predicate::str::contains("--github-token"));
}

#[test]
fn quiet_and_json_conflict() {
    deploy_now_cmd()
        .args(["--quiet", "--json", "deploy"])
        .assert()
        .failure();
}

mod validation {
    use super::*;

    #[test]
    fn invalid_app_path_fails() {
        deploy_now_cmd()
            .args(["deploy", "--package", "/nonexistent/deploy-now/app"])
            .args(["--now-token", "tok", "--github-token", "gh"])
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "app path is invalid: /nonexistent/deploy-now/app",
            ));
    }

    #[test]
    fn package_input_is_validated_too() {
        deploy_now_cmd()
            .arg("deploy")
            .env("INPUT_PACKAGE", "/nonexistent/deploy-now/app")
            .env("INPUT_NOWTOKEN", "tok")
            .assert()
            .failure()
            .stderr(predicate::str::contains("app path is invalid"));
    }

    #[test]
    fn missing_provider_token_fails() {
        let dir = app_dir();
        deploy_now_cmd()
            .args(["deploy", "--package", arg(dir.path())])
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing required input: nowToken"));
    }

    #[test]
    fn missing_github_token_fails() {
        let dir = app_dir();
        deploy_now_cmd()
            .args(["deploy", "--package", arg(dir.path()), "--now-token", "tok"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing required input: githubToken"));
    }

    #[test]
    fn missing_repository_fails() {
        let dir = app_dir();
        deploy_now_cmd()
            .args(["deploy", "--package", arg(dir.path())])
            .env("INPUT_NOWTOKEN", "tok")
            .env("INPUT_GITHUBTOKEN", "gh")
            .env("GITHUB_REF", "refs/heads/main")
            .assert()
            .failure()
            .stderr(predicate::str::contains("GITHUB_REPOSITORY"));
    }

    #[test]
    fn missing_ref_fails() {
        let dir = app_dir();
        deploy_now_cmd()
            .args(["deploy", "--package", arg(dir.path())])
            .env("INPUT_NOWTOKEN", "tok")
            .env("INPUT_GITHUBTOKEN", "gh")
            .env("GITHUB_REPOSITORY", "acme/web")
            .env("GITHUB_REF", "refs/tags/v1.0.0")
            .assert()
            .failure()
            .stderr(predicate::str::contains("cannot determine the branch"));
    }

    #[test]
    fn json_mode_reports_errors_as_events() {
        deploy_now_cmd()
            .args(["--json", "deploy", "--package", "/nonexistent/deploy-now/app"])
            .assert()
            .failure()
            .stderr(predicate::str::contains(r#""event":"error""#));
    }

    #[test]
    fn invalid_override_file_fails() {
        let dir = app_dir();
        fs::write(dir.path().join("deploy-now.json"), r#"{"regions": []}"#).unwrap();
        deploy_now_cmd()
            .args(["deploy", "--package", arg(dir.path()), "--now-token", "tok"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("regions list cannot be empty"));
    }

    #[test]
    fn zero_poll_interval_fails() {
        let dir = app_dir();
        fs::write(dir.path().join("deploy-now.json"), r#"{"pollInterval": "0s"}"#).unwrap();
        deploy_now_cmd()
            .args(["deploy", "--package", arg(dir.path()), "--now-token", "tok"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("pollInterval must be greater than zero"));
    }
}

#[cfg(unix)]
mod logs {
    use super::*;

    #[test]
    fn runs_the_configured_logs_command() {
        let dir = app_dir();
        fs::write(
            dir.path().join("deploy-now.json"),
            r#"{"logsCommand": ["echo", "logs for"]}"#,
        )
        .unwrap();

        deploy_now_cmd()
            .args(["logs", "dpl_123", "--package", arg(dir.path())])
            .args(["--now-token", "tok"])
            .assert()
            .success()
            .stdout(predicate::str::contains("logs for dpl_123 --token=tok"));
    }

    #[test]
    fn json_mode_wraps_logs() {
        let dir = app_dir();
        fs::write(
            dir.path().join("deploy-now.json"),
            r#"{"logsCommand": ["echo"]}"#,
        )
        .unwrap();

        deploy_now_cmd()
            .args(["--json", "logs", "dpl_123", "--package", arg(dir.path())])
            .env("INPUT_NOWTOKEN", "tok")
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""event":"logs""#))
            .stdout(predicate::str::contains(r#""deployment_id":"dpl_123""#));
    }

    #[test]
    fn failing_logs_command_fails() {
        let dir = app_dir();
        fs::write(
            dir.path().join("deploy-now.json"),
            r#"{"logsCommand": ["false"]}"#,
        )
        .unwrap();

        deploy_now_cmd()
            .args(["logs", "dpl_123", "--package", arg(dir.path()), "--now-token", "tok"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("logs command exited with"));
    }
}
