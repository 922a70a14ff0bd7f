// ABOUTME: Command module aggregator for the deploy-now CLI.
// ABOUTME: Re-exports the deploy and logs command handlers.

mod deploy;
mod logs;

pub use deploy::deploy;
pub use logs::logs;
