// ABOUTME: Deploy command implementation.
// ABOUTME: Wires config, provider stream, GitHub tracker and output sink into one reconciliation run.

use deploy_now::config::{Config, Flags, GithubContext, Inputs};
use deploy_now::diagnostics::Warning;
use deploy_now::error::{Error, Result};
use deploy_now::logs::LogFetcher;
use deploy_now::output::Output;
use deploy_now::outputs::sink_from_env;
use deploy_now::provider::{DeploymentOptions, ProviderClient};
use deploy_now::reconcile::{Reconciler, RunContext};
use deploy_now::tracking::GithubTracker;

/// Deploy the configured app and mirror its lifecycle into GitHub.
pub async fn deploy(flags: Flags, inputs: &Inputs, output: &mut Output) -> Result<()> {
    output.start_timer();

    let config = Config::resolve(&flags, inputs)?;
    let tracking_token = config.tracking_token()?.to_string();
    let context = GithubContext::load(inputs)?;

    let repository = context
        .repository
        .clone()
        .ok_or_else(|| Error::MissingEnvVar("GITHUB_REPOSITORY".to_string()))?;
    let correlated_ref = context.correlated_ref().ok_or(Error::NoCorrelatedRef)?;

    let body = DeploymentOptions::new(&config, &context)
        .to_request_body(&config.deployment_overrides)?;
    tracing::debug!(body = %body, "deployment request");

    let provider = ProviderClient::new(&config)?;
    let mut tracker = GithubTracker::new(tracking_token, repository)?;
    if let Some(endpoint) = inputs.var("GITHUB_GRAPHQL_URL") {
        tracker = tracker.with_endpoint(endpoint);
    }
    let sink = sink_from_env(inputs);

    output.progress(&format!(
        "Deploying {} to {} ({})",
        config.app_name, config.target, correlated_ref
    ));

    let run_context = RunContext {
        environment: config.target,
        description: context.description(),
        correlated_ref,
    };
    let mut reconciler = Reconciler::new(&tracker, sink.as_ref(), run_context);
    let result = reconciler
        .run(provider.deploy(config.app_path.clone(), body))
        .await;

    for warning in reconciler.warnings() {
        output.warning(&warning.message);
    }

    match result {
        Ok(report) => {
            tracing::info!(
                tracking_id = %report.tracking_id,
                provider_id = ?report.provider_id,
                duration_ms = report.duration().num_milliseconds(),
                warnings = report.warnings.len(),
                "deployment tracked"
            );
            output.outputs(&report.outputs);
            output.success(&format!(
                "Deployed {} to {}",
                config.app_name, report.outputs.environment_url
            ));
            Ok(())
        }
        Err(e) => {
            if config.fetch_logs_on_error
                && let Some(deployment_id) = e.deployment_id()
            {
                print_build_logs(&config, deployment_id, output).await;
            }
            Err(e.into())
        }
    }
}

async fn print_build_logs(config: &Config, deployment_id: &str, output: &Output) {
    output.progress(&format!("Fetching build logs for {deployment_id}..."));
    match LogFetcher::from_config(config).fetch(deployment_id).await {
        Ok(logs) => output.logs(deployment_id, &logs.stdout),
        Err(e) => {
            let warning = Warning::log_fetch(format!("could not fetch build logs: {e}"));
            tracing::warn!(kind = ?warning.kind, "{}", warning.message);
            output.warning(&warning.message);
        }
    }
}
