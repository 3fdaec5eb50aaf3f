//! # Genesis Configuration
//!
//! Initial balances (and optionally pre-registered developers) for a fresh
//! ledger. Loaded from YAML, or from JSON when the file ends in `.json`.
//!
//! ```yaml
//! accounts:
//!   - account: "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
//!     balance: "10.5"
//! developers:
//!   - "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
//! ```
//!
//! Balances are decimal amounts of whole units, not base units.

use std::path::{Path, PathBuf};

use depledger_core::{AccountId, Amount, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::LedgerError;

/// Errors loading or applying a genesis file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file does not exist.
    #[error("genesis file not found: {}", path.display())]
    FileNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// Reading the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse failure.
    #[error("failed to parse YAML {}: {source}", path.display())]
    YamlParse {
        /// The file.
        path: PathBuf,
        /// The parser error.
        source: serde_yaml::Error,
    },

    /// JSON parse failure.
    #[error("failed to parse JSON {}: {source}", path.display())]
    JsonParse {
        /// The file.
        path: PathBuf,
        /// The parser error.
        source: serde_json::Error,
    },

    /// A balance is not a valid decimal amount.
    #[error("invalid balance for {account}: {source}")]
    InvalidAmount {
        /// The account whose balance is malformed.
        account: AccountId,
        /// The validation failure.
        source: ValidationError,
    },

    /// Applying the genesis state to the ledger failed.
    #[error("genesis rejected by ledger: {0}")]
    Ledger(#[from] LedgerError),
}

/// One initial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    /// The funded account.
    pub account: AccountId,
    /// Decimal amount of whole units, e.g. `"10.5"`.
    pub balance: String,
}

/// Initial ledger state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Initial balances, applied in order.
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
    /// Accounts to register as developers after funding, in order.
    #[serde(default)]
    pub developers: Vec<AccountId>,
}

impl GenesisConfig {
    /// Load a genesis file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io(e)
            }
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: Self = if is_json {
            serde_json::from_str(&content).map_err(|source| ConfigError::JsonParse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
                path: path.to_path_buf(),
                source,
            })?
        };
        config.allocations()?;
        Ok(config)
    }

    /// The parsed `(account, amount)` allocations.
    pub fn allocations(&self) -> Result<Vec<(AccountId, Amount)>, ConfigError> {
        self.accounts
            .iter()
            .map(|entry| {
                Amount::parse_decimal(&entry.balance)
                    .map(|amount| (entry.account, amount))
                    .map_err(|source| ConfigError::InvalidAmount {
                        account: entry.account,
                        source,
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DEV1: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    #[test]
    fn test_load_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "accounts:\n  - account: \"{DEV1}\"\n    balance: \"10.5\"\ndevelopers:\n  - \"{DEV1}\""
        )
        .unwrap();
        let config = GenesisConfig::load(file.path()).unwrap();
        assert_eq!(config.developers.len(), 1);
        let allocations = config.allocations().unwrap();
        assert_eq!(allocations[0].1, Amount::parse_decimal("10.5").unwrap());
    }

    #[test]
    fn test_load_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{\"accounts\":[{{\"account\":\"{DEV1}\",\"balance\":\"1\"}}]}}").unwrap();
        let config = GenesisConfig::load(file.path()).unwrap();
        assert!(config.developers.is_empty());
        assert_eq!(config.allocations().unwrap()[0].1, Amount::from_whole(1));
    }

    #[test]
    fn test_invalid_balance_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "accounts:\n  - account: \"{DEV1}\"\n    balance: \"-3\"").unwrap();
        let err = GenesisConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAmount { .. }));
    }

    #[test]
    fn test_invalid_address_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "accounts:\n  - account: \"0x12\"\n    balance: \"1\"").unwrap();
        assert!(matches!(
            GenesisConfig::load(file.path()),
            Err(ConfigError::YamlParse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = GenesisConfig::load(Path::new("/nonexistent/genesis.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
