// ABOUTME: Integration tests for input resolution, deploy-now.json overrides and run context.
// ABOUTME: Exercises the environment layer through temp-env and real files through tempfile.

use deploy_now::config::*;
use deploy_now::error::Error;
use deploy_now::provider::DeploymentOptions;
use deploy_now::tracking::{CorrelatedRef, Repository};
use deploy_now::types::Target;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

fn app_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("package.json"), r#"{"name": "web"}"#).unwrap();
    dir
}

fn write_overrides(dir: &Path, json: &str) {
    std::fs::write(dir.join(OVERRIDE_FILENAME), json).unwrap();
}

fn flags_for(dir: &Path) -> Flags {
    Flags {
        package: Some(dir.to_path_buf()),
        now_token: Some("now_tok".to_string()),
        ..Flags::default()
    }
}

mod environment {
    use super::*;

    #[test]
    fn action_inputs_come_from_process_env() {
        temp_env::with_vars(
            [
                ("INPUT_NOWTOKEN", Some("from_action")),
                ("NOW_TOKEN", Some("from_plain_env")),
                ("INPUT_PROD", Some("yes")),
            ],
            || {
                let inputs = Inputs::from_env();
                assert_eq!(inputs.get("nowToken").as_deref(), Some("from_action"));
                assert_eq!(inputs.flag("prod"), Some(true));
            },
        );
    }

    #[test]
    fn plain_env_var_is_the_fallback() {
        temp_env::with_vars(
            [("INPUT_GITHUBTOKEN", None), ("GITHUB_TOKEN", Some("ghs_plain"))],
            || {
                let inputs = Inputs::from_env();
                assert_eq!(inputs.get("githubToken").as_deref(), Some("ghs_plain"));
            },
        );
    }

    #[test]
    fn blank_action_input_counts_as_unset() {
        temp_env::with_vars(
            [("INPUT_ALIAS", Some("   ")), ("ALIAS", Some("web.example.com"))],
            || {
                let inputs = Inputs::from_env();
                assert_eq!(inputs.get("alias").as_deref(), Some("web.example.com"));
            },
        );
    }

    #[test]
    fn resolve_reads_tokens_and_target_from_env() {
        let dir = app_dir();
        let flags = Flags {
            package: Some(dir.path().to_path_buf()),
            ..Flags::default()
        };

        temp_env::with_vars(
            [
                ("INPUT_NOWTOKEN", Some("now_env")),
                ("INPUT_GITHUBTOKEN", Some("gh_env")),
                ("INPUT_PROD", Some("1")),
                ("INPUT_ALIAS", Some("a.example.com, b.example.com")),
            ],
            || {
                let config = Config::resolve(&flags, &Inputs::from_env()).unwrap();
                assert_eq!(config.provider_token, "now_env");
                assert_eq!(config.tracking_token().unwrap(), "gh_env");
                assert_eq!(config.target, Target::Production);
                assert_eq!(config.aliases, vec!["a.example.com", "b.example.com"]);
            },
        );
    }

    #[test]
    fn package_input_selects_the_app_directory() {
        let dir = app_dir();
        let inputs = Inputs::from_vars([
            ("INPUT_PACKAGE", dir.path().to_str().unwrap()),
            ("INPUT_NOWTOKEN", "tok"),
        ]);

        let config = Config::resolve(&Flags::default(), &inputs).unwrap();
        assert_eq!(config.app_path, dir.path().canonicalize().unwrap());
    }
}

mod overrides {
    use super::*;

    #[test]
    fn discovered_file_fills_unset_values() {
        let dir = app_dir();
        write_overrides(
            dir.path(),
            r#"{
                "name": "marketing",
                "alias": "www.example.com",
                "regions": ["sfo1", "iad1"],
                "apiUrl": "https://vercel.internal",
                "pollInterval": "500ms",
                "logsCommand": ["yarn", "logs"],
                "fetchLogsOnError": false
            }"#,
        );

        let config = Config::resolve(&flags_for(dir.path()), &Inputs::default()).unwrap();

        assert_eq!(config.app_name, "marketing");
        assert_eq!(config.aliases, vec!["www.example.com"]);
        assert_eq!(config.regions.len(), 2);
        assert_eq!(config.regions.head, "sfo1");
        assert_eq!(config.api_url, "https://vercel.internal");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.logs_command, vec!["yarn", "logs"]);
        assert!(!config.fetch_logs_on_error);
        assert_eq!(
            config.override_file,
            Some(dir.path().canonicalize().unwrap().join(OVERRIDE_FILENAME))
        );
    }

    #[test]
    fn empty_regions_are_rejected() {
        let dir = app_dir();
        write_overrides(dir.path(), r#"{"regions": []}"#);

        let err = Config::resolve(&flags_for(dir.path()), &Inputs::default()).unwrap_err();
        assert!(err.to_string().contains("regions list cannot be empty"));
    }

    #[test]
    fn malformed_file_names_its_path() {
        let dir = app_dir();
        write_overrides(dir.path(), "{ not json");

        let err = Config::resolve(&flags_for(dir.path()), &Inputs::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(err.to_string().contains(OVERRIDE_FILENAME));
    }

    #[test]
    fn explicit_file_outside_the_app_directory() {
        let dir = app_dir();
        let elsewhere = tempfile::tempdir().unwrap();
        let path = elsewhere.path().join("ci.json");
        std::fs::write(&path, r#"{"scope": "acme"}"#).unwrap();

        let flags = Flags {
            config: Some(path.clone()),
            ..flags_for(dir.path())
        };
        let config = Config::resolve(&flags, &Inputs::default()).unwrap();
        assert_eq!(config.scope.as_deref(), Some("acme"));
        assert_eq!(config.override_file, Some(path));
    }

    #[test]
    fn missing_env_reference_fails() {
        let dir = app_dir();
        write_overrides(dir.path(), r#"{"nowToken": {"env": "DEPLOY_NOW_TEST_UNSET"}}"#);
        let flags = Flags {
            package: Some(dir.path().to_path_buf()),
            ..Flags::default()
        };

        temp_env::with_var_unset("DEPLOY_NOW_TEST_UNSET", || {
            let err = Config::resolve(&flags, &Inputs::from_env()).unwrap_err();
            assert!(matches!(err, Error::MissingEnvVar(ref name) if name == "DEPLOY_NOW_TEST_UNSET"));
        });
    }

    #[test]
    fn env_reference_default_applies() {
        let dir = app_dir();
        write_overrides(
            dir.path(),
            r#"{"nowToken": {"env": "DEPLOY_NOW_TEST_UNSET", "default": "fallback_tok"}}"#,
        );
        let flags = Flags {
            package: Some(dir.path().to_path_buf()),
            ..Flags::default()
        };

        let config = Config::resolve(&flags, &Inputs::default()).unwrap();
        assert_eq!(config.provider_token, "fallback_tok");
    }

    #[test]
    fn deployment_section_merges_into_request_body() {
        let dir = app_dir();
        write_overrides(
            dir.path(),
            r#"{"deployment": {"public": true, "meta": {"team": "web"}, "build": {"env": {"NODE_ENV": "production"}}}}"#,
        );

        let config = Config::resolve(&flags_for(dir.path()), &Inputs::default()).unwrap();
        let context = GithubContext::from_parts(
            Some("acme/web"),
            Some("0123456789abcdef"),
            Some("octocat"),
            Some("refs/heads/main"),
            None,
            json!({"head_commit": {"message": "Ship it"}}),
        );
        let body = DeploymentOptions::new(&config, &context)
            .to_request_body(&config.deployment_overrides)
            .unwrap();

        assert_eq!(body["public"], true);
        assert_eq!(body["target"], "staging");
        assert_eq!(body["meta"]["team"], "web");
        assert_eq!(body["meta"]["githubCommitSha"], "0123456789abcdef");
        assert_eq!(body["build"]["env"]["NODE_ENV"], "production");
    }
}

mod context {
    use super::*;

    #[test]
    fn loads_pull_request_event_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let event_path = dir.path().join("event.json");
        std::fs::write(
            &event_path,
            json!({"pull_request": {"number": 42, "title": "Add pricing page"}}).to_string(),
        )
        .unwrap();

        let inputs = Inputs::from_vars([
            ("GITHUB_REPOSITORY", "acme/web"),
            ("GITHUB_SHA", "0123456789abcdef"),
            ("GITHUB_REF", "refs/pull/42/merge"),
            ("GITHUB_HEAD_REF", "feature/pricing"),
            ("GITHUB_EVENT_PATH", event_path.to_str().unwrap()),
        ]);
        let context = GithubContext::load(&inputs).unwrap();

        assert_eq!(
            context.repository,
            Some(Repository {
                owner: "acme".to_string(),
                name: "web".to_string(),
            })
        );
        assert_eq!(context.correlated_ref(), Some(CorrelatedRef::PullRequest(42)));
        assert_eq!(context.description(), "Add pricing page");
    }

    #[test]
    fn push_event_correlates_by_branch() {
        let inputs = Inputs::from_vars([
            ("GITHUB_REPOSITORY", "acme/web"),
            ("GITHUB_SHA", "0123456789abcdef"),
            ("GITHUB_REF", "refs/heads/main"),
        ]);
        let context = GithubContext::load(&inputs).unwrap();

        assert_eq!(
            context.correlated_ref(),
            Some(CorrelatedRef::Branch("main".to_string()))
        );
        assert_eq!(context.description(), "Deploy 0123456");
    }

    #[test]
    fn unreadable_event_file_is_reported() {
        let inputs = Inputs::from_vars([("GITHUB_EVENT_PATH", "/nonexistent/event.json")]);
        let err = GithubContext::load(&inputs).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(err.to_string().contains("/nonexistent/event.json"));
    }

    #[test]
    fn without_ref_there_is_nothing_to_correlate() {
        let context = GithubContext::load(&Inputs::default()).unwrap();
        assert!(context.repository.is_none());
        assert!(context.correlated_ref().is_none());
        assert_eq!(context.description(), "Deploy");
    }
}
