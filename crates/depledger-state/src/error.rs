//! # Ledger Errors
//!
//! One enum for every way an operation can be refused. Each variant
//! carries the identifiers involved so a caller can report the failure
//! without re-querying the ledger.
//!
//! Failures are grouped into four classes:
//!
//! | Class | Variants |
//! |---|---|
//! | Authorization | `NotRegistered`, `NotOwner`, `SelfPurchase`, `TransferNotPermitted` |
//! | State | `AlreadyRegistered`, `AlreadyListed`, `NotListed` |
//! | Integrity | `DanglingReference`, `UnknownToken`, `UnknownRepository`, `ArityMismatch`, `EmptyDependencyList` |
//! | Value | `InvalidPrice`, `PriceMismatch`, `InsufficientFunds`, `BalanceOverflow` |
//!
//! No error is retried internally and every error leaves the ledger
//! unchanged.

use depledger_core::{AccountId, Amount, CanonicalizationError, RepositoryId, TokenRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::journal::JournalError;
use crate::repository::Authority;

/// Coarse classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The caller lacks the required relationship to the target entity.
    Authorization,
    /// The operation is invalid in the current lifecycle state.
    State,
    /// The mutation would violate a graph or ownership invariant.
    Integrity,
    /// A numeric precondition is unmet.
    Value,
    /// Serialization or journal failure inside the ledger itself.
    Internal,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Authorization => "authorization",
            Self::State => "state",
            Self::Integrity => "integrity",
            Self::Value => "value",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Errors returned by ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The account has no repository.
    #[error("account {account} is not a registered developer")]
    NotRegistered {
        /// The unregistered account.
        account: AccountId,
    },

    /// The account does not own the token through its repository.
    #[error("account {account} does not own {token}")]
    NotOwner {
        /// The caller.
        account: AccountId,
        /// The token the caller tried to act on.
        token: TokenRef,
    },

    /// A seller tried to buy their own listing.
    #[error("account {account} cannot purchase its own listing of {token}")]
    SelfPurchase {
        /// The buyer, who is also the seller.
        account: AccountId,
        /// The listed token.
        token: TokenRef,
    },

    /// The authority may not move this kind of token.
    #[error("{authority} may not transfer ownership of {token}")]
    TransferNotPermitted {
        /// The token whose ownership was to change.
        token: TokenRef,
        /// The authority that attempted the transfer.
        authority: Authority,
    },

    /// The account already has a repository.
    #[error("account {account} is already registered with repository {repository}")]
    AlreadyRegistered {
        /// The account.
        account: AccountId,
        /// Its existing repository.
        repository: RepositoryId,
    },

    /// The token already has an active listing.
    #[error("{token} is already listed")]
    AlreadyListed {
        /// The listed token.
        token: TokenRef,
    },

    /// The token has no active listing.
    #[error("{token} is not listed")]
    NotListed {
        /// The token.
        token: TokenRef,
    },

    /// An edge would point at a token that does not exist.
    #[error("dangling reference to {target}")]
    DanglingReference {
        /// The missing edge target.
        target: TokenRef,
    },

    /// The token does not exist.
    #[error("unknown token {token}")]
    UnknownToken {
        /// The missing token.
        token: TokenRef,
    },

    /// The repository does not exist.
    #[error("unknown repository {repository}")]
    UnknownRepository {
        /// The missing repository.
        repository: RepositoryId,
    },

    /// Parallel dependency arrays have different lengths.
    #[error("{repositories} dependency repositories but {token_lists} token id lists")]
    ArityMismatch {
        /// Length of the repository array.
        repositories: usize,
        /// Length of the token-id-list array.
        token_lists: usize,
    },

    /// A declared dependency repository lists no token ids.
    #[error("dependency on repository {repository} lists no token ids")]
    EmptyDependencyList {
        /// The repository with an empty id list.
        repository: RepositoryId,
    },

    /// Listing price must be positive.
    #[error("listing price must be greater than zero")]
    InvalidPrice,

    /// Payment does not equal the listing price.
    #[error("payment {offered} does not match listing price {expected}")]
    PriceMismatch {
        /// The listing price.
        expected: Amount,
        /// The payment offered.
        offered: Amount,
    },

    /// The paying account cannot cover the amount.
    #[error("account {account} has {balance} but {required} is required")]
    InsufficientFunds {
        /// The paying account.
        account: AccountId,
        /// Its current balance.
        balance: Amount,
        /// The amount required.
        required: Amount,
    },

    /// A credit would overflow the account balance.
    #[error("balance of account {account} would overflow")]
    BalanceOverflow {
        /// The credited account.
        account: AccountId,
    },

    /// Canonical serialization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// The journal rejected or failed to verify a receipt.
    #[error("journal error: {0}")]
    Journal(#[from] JournalError),
}

impl LedgerError {
    /// The class this error belongs to.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotRegistered { .. }
            | Self::NotOwner { .. }
            | Self::SelfPurchase { .. }
            | Self::TransferNotPermitted { .. } => ErrorClass::Authorization,
            Self::AlreadyRegistered { .. } | Self::AlreadyListed { .. } | Self::NotListed { .. } => {
                ErrorClass::State
            }
            Self::DanglingReference { .. }
            | Self::UnknownToken { .. }
            | Self::UnknownRepository { .. }
            | Self::ArityMismatch { .. }
            | Self::EmptyDependencyList { .. } => ErrorClass::Integrity,
            Self::InvalidPrice
            | Self::PriceMismatch { .. }
            | Self::InsufficientFunds { .. }
            | Self::BalanceOverflow { .. } => ErrorClass::Value,
            Self::Canonicalization(_) | Self::Journal(_) => ErrorClass::Internal,
        }
    }

    /// Machine-readable error code, e.g. `"NOT_LISTED"`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotRegistered { .. } => "NOT_REGISTERED",
            Self::NotOwner { .. } => "NOT_OWNER",
            Self::SelfPurchase { .. } => "SELF_PURCHASE",
            Self::TransferNotPermitted { .. } => "TRANSFER_NOT_PERMITTED",
            Self::AlreadyRegistered { .. } => "ALREADY_REGISTERED",
            Self::AlreadyListed { .. } => "ALREADY_LISTED",
            Self::NotListed { .. } => "NOT_LISTED",
            Self::DanglingReference { .. } => "DANGLING_REFERENCE",
            Self::UnknownToken { .. } => "UNKNOWN_TOKEN",
            Self::UnknownRepository { .. } => "UNKNOWN_REPOSITORY",
            Self::ArityMismatch { .. } => "ARITY_MISMATCH",
            Self::EmptyDependencyList { .. } => "EMPTY_DEPENDENCY_LIST",
            Self::InvalidPrice => "INVALID_PRICE",
            Self::PriceMismatch { .. } => "PRICE_MISMATCH",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::BalanceOverflow { .. } => "BALANCE_OVERFLOW",
            Self::Canonicalization(_) => "CANONICALIZATION_ERROR",
            Self::Journal(_) => "JOURNAL_ERROR",
        }
    }
}
