mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // stdout carries JSON results, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Optimize { input, config } => {
            commands::optimize::run(input.as_deref(), config.as_deref())
        }
        Commands::Inspect { query, history_len } => commands::inspect::run(&query, history_len),
    }
}
