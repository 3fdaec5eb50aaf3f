//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! The ledger lives behind a [`SharedLedger`]. Handlers never hold its lock
//! across an `.await`: every handler takes the lock, runs one ledger call,
//! and drops the guard before building the response.

use std::path::PathBuf;

use depledger_state::{ConfigError, GenesisConfig, Ledger, SharedLedger};

/// Server configuration, read from the environment by the binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// TCP port to bind.
    pub port: u16,
    /// Optional genesis file seeding balances and developers.
    pub genesis: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            genesis: None,
        }
    }
}

impl AppConfig {
    /// Read `PORT` and `GENESIS_CONFIG`.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let genesis = std::env::var("GENESIS_CONFIG").ok().map(PathBuf::from);
        Self { port, genesis }
    }
}

/// Application state shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: AppConfig,
    /// The serialized ledger.
    pub ledger: SharedLedger,
}

impl AppState {
    /// Empty ledger, default configuration.
    pub fn new() -> Self {
        Self::with_ledger(AppConfig::default(), Ledger::new())
    }

    /// State around an existing ledger.
    pub fn with_ledger(config: AppConfig, ledger: Ledger) -> Self {
        Self {
            config,
            ledger: SharedLedger::new(ledger),
        }
    }

    /// Build the ledger described by `config`, loading its genesis file if
    /// one is set.
    pub fn bootstrap(config: AppConfig) -> Result<Self, ConfigError> {
        let ledger = match &config.genesis {
            Some(path) => {
                let genesis = GenesisConfig::load(path)?;
                tracing::info!(path = %path.display(), "loaded genesis configuration");
                Ledger::from_genesis(&genesis)?
            }
            None => Ledger::new(),
        };
        Ok(Self::with_ledger(config, ledger))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bootstrap_without_genesis_is_empty() {
        let state = AppState::bootstrap(AppConfig::default()).unwrap();
        assert!(state.ledger.read().journal().is_empty());
    }

    #[test]
    fn test_bootstrap_loads_genesis_balances() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "accounts:\n  - account: \"0x70997970c51812dc3a010c7d01b50e0d17dc79c8\"\n    balance: \"3\""
        )
        .unwrap();
        let config = AppConfig {
            port: 0,
            genesis: Some(file.path().to_path_buf()),
        };
        let state = AppState::bootstrap(config).unwrap();
        assert_eq!(state.ledger.read().journal().len(), 1);
    }

    #[test]
    fn test_bootstrap_reports_missing_genesis() {
        let config = AppConfig {
            port: 0,
            genesis: Some(PathBuf::from("/nonexistent/genesis.yaml")),
        };
        assert!(matches!(
            AppState::bootstrap(config),
            Err(ConfigError::FileNotFound { .. })
        ));
    }
}
