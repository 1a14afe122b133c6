mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ferrite_classifier=info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    Cli::parse().run()
}
