use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use forage_cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Logs go to stderr; stdout is reserved for the JSON document.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (document, code) = match Cli::try_parse() {
        Ok(cli) => forage_cli::envelope(forage_cli::run(cli, std::io::stdin().lock())),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => (forage_cli::failure(err.to_string().trim()), ExitCode::FAILURE),
    };

    match serde_json::to_string_pretty(&document) {
        Ok(text) => {
            println!("{text}");
            code
        }
        Err(err) => {
            eprintln!("failed to serialize output: {err}");
            ExitCode::FAILURE
        }
    }
}
