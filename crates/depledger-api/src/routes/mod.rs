//! # API Route Modules
//!
//! - `developers`: registration and developer lookup.
//! - `accounts`: deposits, balances and license holdings.
//! - `software`: minting software tokens.
//! - `repositories`: token, ownership and reference-graph queries.
//! - `listings`: opening, inspecting and withdrawing listings.
//! - `purchases`: buying licenses.
//! - `journal`: the hash-chained operation journal.

pub mod accounts;
pub mod developers;
pub mod journal;
pub mod listings;
pub mod purchases;
pub mod repositories;
pub mod software;
