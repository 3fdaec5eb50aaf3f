//! # Marketplace
//!
//! Listing records and license holdings.
//!
//! Each `(repository, token)` moves through
//!
//! ```text
//! Unlisted ──list──▶ Active ──purchase──▶ Sold
//!                      │
//!                      └────delist──────▶ Delisted
//! ```
//!
//! Sold and delisted tokens may be listed again, which opens a fresh
//! listing with a new id. Past listings are kept as history and never
//! deleted. At most one listing per token is active at a time.
//!
//! The purchase protocol itself spans balances, the registry and the
//! journal, so it lives on [`Ledger`](crate::ledger::Ledger). This module
//! keeps the marketplace's own state consistent.

use std::collections::BTreeMap;

use depledger_core::{AccountId, Amount, ListingId, TokenRef};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Lifecycle state of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Open for purchase.
    Active,
    /// Closed by a purchase.
    Sold,
    /// Withdrawn by the seller.
    Delisted,
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Sold => "sold",
            Self::Delisted => "delisted",
        };
        f.write_str(s)
    }
}

/// An offer to license a software token at a fixed price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Unique listing id.
    pub id: ListingId,
    /// The listed software token.
    pub token: TokenRef,
    /// The developer who listed it.
    pub seller: AccountId,
    /// Exact payment required.
    pub price: Amount,
    /// Current lifecycle state.
    pub status: ListingStatus,
    /// Journal sequence number of the listing operation.
    pub listed_at: u64,
}

impl Listing {
    /// Whether the listing can be purchased.
    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }
}

/// A license held by an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseHolding {
    /// The purchased package.
    pub licensed: TokenRef,
    /// The license token.
    pub license: TokenRef,
}

/// Listing history and the license holdings index.
#[derive(Debug, Clone, Default)]
pub struct Marketplace {
    listings: BTreeMap<TokenRef, Vec<Listing>>,
    holdings: BTreeMap<AccountId, Vec<LicenseHolding>>,
}

impl Marketplace {
    /// Create an empty marketplace.
    pub fn new() -> Self {
        Self::default()
    }

    /// The active listing for `token`, if any.
    pub fn active_listing(&self, token: &TokenRef) -> Option<&Listing> {
        self.listings
            .get(token)
            .and_then(|history| history.last())
            .filter(|l| l.is_active())
    }

    /// Whether `token` has an active listing.
    pub fn is_listed(&self, token: &TokenRef) -> bool {
        self.active_listing(token).is_some()
    }

    /// The most recent listing for `token`, active or not.
    pub fn listing(&self, token: &TokenRef) -> Option<&Listing> {
        self.listings.get(token).and_then(|history| history.last())
    }

    /// Every listing ever opened for `token`, oldest first.
    pub fn history(&self, token: &TokenRef) -> &[Listing] {
        self.listings.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All active listings, in listing order.
    pub fn active_listings(&self) -> Vec<&Listing> {
        let mut active: Vec<&Listing> = self
            .listings
            .values()
            .filter_map(|history| history.last())
            .filter(|l| l.is_active())
            .collect();
        active.sort_by_key(|l| l.listed_at);
        active
    }

    /// Fail with `AlreadyListed` if `token` has an active listing.
    pub(crate) fn check_unlisted(&self, token: &TokenRef) -> Result<(), LedgerError> {
        if self.is_listed(token) {
            return Err(LedgerError::AlreadyListed { token: *token });
        }
        Ok(())
    }

    pub(crate) fn open(&mut self, listing: Listing) -> Result<(), LedgerError> {
        self.check_unlisted(&listing.token)?;
        self.listings.entry(listing.token).or_default().push(listing);
        Ok(())
    }

    /// Move the active listing for `token` to `status`.
    pub(crate) fn close(
        &mut self,
        token: &TokenRef,
        status: ListingStatus,
    ) -> Result<Listing, LedgerError> {
        let active = self
            .listings
            .get_mut(token)
            .and_then(|history| history.last_mut())
            .filter(|l| l.is_active())
            .ok_or(LedgerError::NotListed { token: *token })?;
        active.status = status;
        Ok(active.clone())
    }

    pub(crate) fn record_license(&mut self, holder: AccountId, licensed: TokenRef, license: TokenRef) {
        self.holdings
            .entry(holder)
            .or_default()
            .push(LicenseHolding { licensed, license });
    }

    /// Whether `account` holds a license for `licensed`.
    pub fn has_license(&self, account: &AccountId, licensed: &TokenRef) -> bool {
        self.earliest_license(account, licensed).is_some()
    }

    /// Licenses held by `account`, in acquisition order.
    pub fn licenses_of(&self, account: &AccountId) -> &[LicenseHolding] {
        self.holdings.get(account).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The first license `account` acquired for `licensed`.
    pub fn earliest_license(&self, account: &AccountId, licensed: &TokenRef) -> Option<TokenRef> {
        self.licenses_of(account)
            .iter()
            .find(|h| h.licensed == *licensed)
            .map(|h| h.license)
    }
}
