pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod session;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub fn run() {
    // Logs go to stderr; stdout carries the table.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    tracing::debug!("{} v{}", config::APP_NAME, config::APP_VERSION);

    if let Err(e) = cli.dispatch() {
        eprintln!("Error: {e}");
        if e.is_rate_limit() {
            eprintln!("{}", config::RATE_LIMIT_NOTICE);
        }
        std::process::exit(1);
    }
}
