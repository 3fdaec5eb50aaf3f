//! # Serve Subcommand
//!
//! Runs the HTTP API in-process.
//!
//! `depledger serve [--port <port>] [--genesis <file>]`

use std::path::PathBuf;

use clap::Args;
use depledger_api::state::{AppConfig, AppState};

/// Arguments for the serve subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// TCP port to bind. Defaults to `PORT` or 8080.
    #[arg(long)]
    pub port: Option<u16>,

    /// Genesis file. Defaults to `GENESIS_CONFIG` if set.
    #[arg(long)]
    pub genesis: Option<PathBuf>,
}

impl ServeArgs {
    /// Environment configuration overridden by explicit flags.
    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::from_env();
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(genesis) = &self.genesis {
            config.genesis = Some(genesis.clone());
        }
        config
    }
}

/// Entry point for `depledger serve`.
pub fn run(args: &ServeArgs) -> anyhow::Result<()> {
    let config = args.config();
    let port = config.port;
    let state = AppState::bootstrap(config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(depledger_api::serve(state, port))?;
    Ok(())
}
