//! # depledger CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// Dependency ledger toolchain.
///
/// Replays operation scripts against a fresh ledger, verifies the
/// resulting receipt chain, and serves the HTTP API.
#[derive(Parser, Debug)]
#[command(name = "depledger", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Replay a script and print outcomes.
    Run(depledger_cli::run::RunArgs),
    /// Replay a script and verify the journal.
    Verify(depledger_cli::verify::VerifyArgs),
    /// Serve the HTTP API.
    Serve(depledger_cli::serve::ServeArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = matches!(&cli.command, Commands::Run(args) if args.json);
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match &cli.command {
        Commands::Run(args) => depledger_cli::run::run(args),
        Commands::Verify(args) => depledger_cli::verify::run(args),
        Commands::Serve(args) => depledger_cli::serve::run(args),
    }
}
