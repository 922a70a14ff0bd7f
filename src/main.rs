// ABOUTME: Entry point for the deploy-now CLI application.
// ABOUTME: Parses arguments, sets up tracing, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use deploy_now::config::Inputs;
use deploy_now::output::Output;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let inputs = Inputs::from_env();

    let debug = cli.verbose
        || matches!(&cli.command, Commands::Deploy(args) if args.debug)
        || inputs.flag("debug").unwrap_or(false);

    // RUST_LOG wins; stdout stays free for pipeline outputs.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn,deploy_now=info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .with_writer(std::io::stderr)
        .init();

    let mut output = Output::new(cli.output_mode());

    let result = match cli.command {
        Commands::Deploy(args) => commands::deploy(args.flags(), &inputs, &mut output).await,
        Commands::Logs {
            deployment_id,
            source,
        } => commands::logs(&deployment_id, source.flags(), &inputs, &output).await,
    };

    if let Err(e) = result {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}
