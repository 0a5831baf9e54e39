//! CLI entry point for tokentap.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use tokentap_cli::cli::Cli;
use tokentap_cli::output::StdoutSink;
use tokentap_cli::{EXIT_FAILURE, config, helpers};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; variables already set win.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    helpers::init_tracing(if cli.verbose { "debug" } else { "warn" });

    let settings = match config::resolve(cli).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let valid = settings.validate();
    if settings.verbose || valid.is_err() {
        eprintln!("Effective configuration:\n{}", settings.redacted_json());
    }
    if let Err(e) = valid {
        eprintln!("Error: {e}");
        return ExitCode::from(EXIT_FAILURE);
    }

    let sink = Arc::new(StdoutSink {
        verbose: settings.verbose,
    });
    match tokentap_cli::run(settings, sink, helpers::ctrl_c()).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
