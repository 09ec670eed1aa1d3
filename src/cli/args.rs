//! CLI argument parsing

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "stopanyads")]
#[command(
    author,
    version,
    about = "Stop AnyDesk and remove its per-user data folder",
    long_about = None
)]
pub struct Args {
    /// Skip the disclaimer and confirmation prompts
    #[arg(short, long)]
    pub yes: bool,

    /// Show what would be terminated and deleted without doing it
    #[arg(long)]
    pub dry_run: bool,

    /// Output the final report as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbose output (debug logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Log filter for diagnostics on stderr (RUST_LOG takes precedence)
    #[arg(long, env = "STOPANYADS_LOG", default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// The log filter actually applied, after `--verbose`.
    pub fn effective_log_level(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}
