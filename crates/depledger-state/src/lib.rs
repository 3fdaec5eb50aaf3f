//! # depledger-state: The Dependency Ledger State Machine
//!
//! Tracks software packages as tokens owned by per-developer repositories,
//! records dependency edges between them in a bidirectional reference
//! graph, and sells licenses whose reference edges encode the transitive
//! license chain.
//!
//! ## Components (leaves first)
//!
//! - **Primitives** (`primitives.rs`): account balances with atomic
//!   transfer, per-repository token counters.
//! - **Reference graph** (`graph.rs`): the [`ReferenceGraph`] trait and the
//!   append-only [`AdjacencyGraph`] with *referring* / *referred* views.
//! - **Repository** (`repository.rs`): a developer's tokens, their
//!   metadata, ownership and declared dependencies.
//! - **Registry** (`registry.rs`): developer → repository directory and
//!   the only minting entry point.
//! - **Marketplace** (`marketplace.rs`): listings and license holdings.
//! - **Journal** (`journal.rs`): hash-chained receipts of every committed
//!   operation.
//! - **Ledger** (`ledger.rs`): the facade that runs each operation as one
//!   indivisible unit, and [`SharedLedger`] which serializes concurrent
//!   callers.
//!
//! ## Atomicity
//!
//! Every mutating operation performs all of its fallible checks before its
//! first mutation. A failed operation therefore leaves balances, counters,
//! listings, the graph and the journal exactly as they were.

pub mod config;
pub mod error;
pub mod graph;
pub mod journal;
pub mod ledger;
pub mod marketplace;
pub mod primitives;
pub mod registry;
pub mod repository;

pub use config::{ConfigError, GenesisAccount, GenesisConfig};
pub use error::{ErrorClass, LedgerError};
pub use graph::{group_by_repository, AdjacencyGraph, ReferenceGraph, RepositoryEdges};
pub use journal::{verify_receipts, Event, Journal, JournalError, PendingReceipt, Receipt};
pub use ledger::{Ledger, Operation, Outcome, SharedLedger};
pub use marketplace::{LicenseHolding, Listing, ListingStatus, Marketplace};
pub use primitives::{Balances, TokenCounter};
pub use registry::{DependencySpec, Registry};
pub use repository::{Authority, Metadata, Owner, Repository, SoftwareMeta, Token, TokenKind};
