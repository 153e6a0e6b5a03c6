use clap::Parser;
use repodocs::cli::{error_category, run, Cli};
use repodocs::logger::init_logger;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logger(cli.verbose, cli.quiet);
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    match run(cli).await {
        Ok(_) => {
            tracing::info!("CLI completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "CLI exited with error");
            eprintln!("[ERROR] {}: {e}", error_category(&e));
            eprintln!("{e:?}");
            ExitCode::FAILURE
        }
    }
}
