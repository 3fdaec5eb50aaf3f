//! # depledger-core: Foundational Types for the Dependency Ledger
//!
//! This crate defines the type-system primitives shared by every other
//! crate in the workspace. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `AccountId`, `RepositoryId`,
//!    `TokenRef`, `ListingId` are distinct types with validated
//!    constructors. No bare strings or byte arrays for addresses.
//!
//! 2. **Integer-only currency.** `Amount` counts base units (18 decimals)
//!    in a `u128` and serializes as a decimal string. Floats never reach
//!    a balance or a digest.
//!
//! 3. **`CanonicalBytes` newtype.** Every digest (repository address
//!    derivation, journal receipts) flows through `CanonicalBytes::new()`.
//!
//! 4. **UTC-only timestamps.** `Timestamp` enforces UTC with Z suffix and
//!    seconds precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `depledger-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use amount::{Amount, DECIMALS};
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{AccountId, ListingId, RepositoryId, TokenId, TokenRef};
pub use temporal::Timestamp;
