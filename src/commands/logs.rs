// ABOUTME: Logs command implementation.
// ABOUTME: Runs the configured logs command for one deployment and prints what it captured.

use deploy_now::config::{Config, Flags, Inputs};
use deploy_now::error::Result;
use deploy_now::logs::LogFetcher;
use deploy_now::output::Output;

pub async fn logs(deployment_id: &str, flags: Flags, inputs: &Inputs, output: &Output) -> Result<()> {
    let config = Config::resolve(&flags, inputs)?;
    let logs = LogFetcher::from_config(&config).fetch(deployment_id).await?;

    output.logs(deployment_id, &logs.stdout);
    if !logs.stderr.trim().is_empty() {
        tracing::debug!(stderr = %logs.stderr.trim(), "logs command stderr");
    }
    Ok(())
}
