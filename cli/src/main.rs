//! sparkctl - Provision an EC2 Spark cluster and benchmark it

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sparkctl::cli::Cli;
use sparkctl::output::json;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json;
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            if json && let Ok(body) = json::format_error(&format!("{e:#}"), json::error_code(&e)) {
                println!("{body}");
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
