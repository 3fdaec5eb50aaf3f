//! # Operation Scripts
//!
//! A script is an ordered list of ledger operations, written in YAML (or
//! JSON when the file ends in `.json`). Either a bare sequence or a
//! document with an `operations` key is accepted:
//!
//! ```yaml
//! description: dev2 sells a license to dev1
//! operations:
//!   - op: register_developer
//!     account: "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc"
//!   - op: mint_software
//!     account: "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc"
//!     metadata: "ipfs://lib-b"
//!   - op: purchase_license
//!     buyer: "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
//!     repository: { developer: "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc" }
//!     token_id: 1
//!     payment: "1000000000000000000"
//! ```
//!
//! Repository addresses are derived at registration, so a script may name
//! a repository by its developer instead; the reference is resolved
//! against the ledger when the operation is replayed. Amounts in scripts
//! are base-unit strings.

use std::path::{Path, PathBuf};

use depledger_core::{AccountId, Amount, RepositoryId, TokenId};
use depledger_state::{DependencySpec, Ledger, LedgerError, Metadata, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a script.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// The script file does not exist.
    #[error("script not found: {}", path.display())]
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
}

/// A repository named either by address or by its developer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepositoryRef {
    Address(RepositoryId),
    Developer { developer: AccountId },
}

impl RepositoryRef {
    /// The repository address, looking up developers in `ledger`.
    pub fn resolve(&self, ledger: &Ledger) -> Result<RepositoryId, LedgerError> {
        match self {
            Self::Address(repository) => Ok(*repository),
            Self::Developer { developer } => ledger
                .repository_of(developer)
                .ok_or(LedgerError::NotRegistered {
                    account: *developer,
                }),
        }
    }
}

/// Dependencies on one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptDependency {
    pub repository: RepositoryRef,
    pub token_ids: Vec<TokenId>,
}

/// One script entry. Mirrors [`Operation`] with symbolic repositories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptOp {
    RegisterDeveloper {
        account: AccountId,
    },
    Deposit {
        account: AccountId,
        amount: Amount,
    },
    MintSoftware {
        account: AccountId,
        metadata: Metadata,
        #[serde(default)]
        dependencies: Vec<ScriptDependency>,
    },
    ListSoftware {
        seller: AccountId,
        token_id: TokenId,
        price: Amount,
    },
    DelistSoftware {
        seller: AccountId,
        token_id: TokenId,
    },
    PurchaseLicense {
        buyer: AccountId,
        repository: RepositoryRef,
        token_id: TokenId,
        payment: Amount,
    },
}

impl ScriptOp {
    /// The `op` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterDeveloper { .. } => "register_developer",
            Self::Deposit { .. } => "deposit",
            Self::MintSoftware { .. } => "mint_software",
            Self::ListSoftware { .. } => "list_software",
            Self::DelistSoftware { .. } => "delist_software",
            Self::PurchaseLicense { .. } => "purchase_license",
        }
    }

    /// The concrete operation, with repository references resolved
    /// against the current state of `ledger`.
    pub fn resolve(self, ledger: &Ledger) -> Result<Operation, LedgerError> {
        Ok(match self {
            Self::RegisterDeveloper { account } => Operation::RegisterDeveloper { account },
            Self::Deposit { account, amount } => Operation::Deposit { account, amount },
            Self::MintSoftware {
                account,
                metadata,
                dependencies,
            } => Operation::MintSoftware {
                account,
                metadata,
                dependencies: dependencies
                    .into_iter()
                    .map(|dep| {
                        Ok(DependencySpec {
                            repository: dep.repository.resolve(ledger)?,
                            token_ids: dep.token_ids,
                        })
                    })
                    .collect::<Result<_, LedgerError>>()?,
            },
            Self::ListSoftware {
                seller,
                token_id,
                price,
            } => Operation::ListSoftware {
                seller,
                token_id,
                price,
            },
            Self::DelistSoftware { seller, token_id } => {
                Operation::DelistSoftware { seller, token_id }
            }
            Self::PurchaseLicense {
                buyer,
                repository,
                token_id,
                payment,
            } => Operation::PurchaseLicense {
                buyer,
                repository: repository.resolve(ledger)?,
                token_id,
                payment,
            },
        })
    }
}

/// A parsed script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Free-form note shown before replay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Operations in application order.
    pub operations: Vec<ScriptOp>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptRepr {
    Document(Script),
    Bare(Vec<ScriptOp>),
}

impl From<ScriptRepr> for Script {
    fn from(repr: ScriptRepr) -> Self {
        match repr {
            ScriptRepr::Document(script) => script,
            ScriptRepr::Bare(operations) => Script {
                description: None,
                operations,
            },
        }
    }
}

impl Script {
    /// Load a script from disk.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScriptError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ScriptError::Io(e)
            }
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let repr: ScriptRepr = if is_json {
            serde_json::from_str(&content).map_err(|source| ScriptError::JsonParse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|source| ScriptError::YamlParse {
                path: path.to_path_buf(),
                source,
            })?
        };
        let script = Script::from(repr);
        tracing::debug!(
            path = %path.display(),
            operations = script.operations.len(),
            "loaded script"
        );
        Ok(script)
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the script has no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
