// ABOUTME: Entry point for the cumulo CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use cumulo::deploy::{CancelToken, cancellation};
use cumulo::error::Result;
use cumulo::output::Output;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Usage errors exit 1 like every other failure; help and version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let (handle, cancel) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            handle.cancel();
        }
    });

    let output = Output::new(cli.output);
    if let Err(e) = run(cli.command, cancel, &output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(command: Commands, cancel: CancelToken, output: &Output) -> Result<()> {
    match command {
        Commands::Deploy(args) => {
            commands::deploy(args, commands::Mode::Deploy, &cancel, output.clone()).await
        }
        Commands::Plan(args) => {
            commands::deploy(args, commands::Mode::Plan, &cancel, output.clone()).await
        }
        Commands::Status(args) => commands::status(args, output).await,
        Commands::Monitor(args) => commands::monitor(args, &cancel, output).await,
        Commands::Troubleshoot(args) => commands::troubleshoot(args, output).await,
        Commands::ListResources(args) => commands::list_resources(args, output).await,
        Commands::Delete { group, yes } => commands::delete(group, yes, output).await,
    }
}
