//! # Error Types: Validation and Canonicalization
//!
//! Errors raised while constructing core values. Ledger state errors live
//! in `depledger-state`; this crate only knows about malformed inputs.

use thiserror::Error;

/// A value failed validation at construction or deserialization time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Address is not `0x` followed by 40 hex characters.
    #[error("invalid address {0:?}: expected 0x followed by 40 hex characters")]
    InvalidAddress(String),

    /// Digest is not 64 hex characters, optionally prefixed `sha256:`.
    #[error("invalid digest {0:?}")]
    InvalidDigest(String),

    /// Token reference is not `<address>#<id>`.
    #[error("invalid token reference {0:?}: expected <address>#<token id>")]
    InvalidTokenRef(String),

    /// Amount string could not be parsed.
    #[error("invalid amount {value:?}: {reason}")]
    InvalidAmount {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Timestamp string could not be parsed or was not UTC.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Amounts must be strings or integers.
    #[error("float values are not permitted in canonical representations; use string or integer for amount: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
