//! # depledger-cli: Dependency Ledger Command-Line Interface
//!
//! Drives the ledger from operation scripts and hosts the HTTP API.
//!
//! ## Subcommands
//!
//! - `run`: replay a script and print each outcome and the final state
//! - `verify`: replay a script and check the receipt hash chain
//! - `serve`: run the HTTP API
//!
//! Argument parsing lives with each subcommand; ledger semantics live in
//! `depledger-state`.

pub mod replay;
pub mod run;
pub mod script;
pub mod serve;
pub mod verify;
