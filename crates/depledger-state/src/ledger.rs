//! # Ledger Facade
//!
//! [`Ledger`] owns balances, the registry, the marketplace and the journal,
//! and runs each boundary operation as one indivisible unit.
//!
//! ## Operation Shape
//!
//! Every mutating operation follows the same three phases:
//!
//! 1. **Validate.** Every check that can fail runs against the current
//!    state, including predicting the ids the operation will allocate and
//!    hashing its journal receipt.
//! 2. **Apply.** State is mutated. All steps here were proven to succeed
//!    in phase 1.
//! 3. **Commit.** The receipt is appended and the event is logged.
//!
//! A failure therefore surfaces before anything changes, and no event is
//! observable until every effect of the operation is in place.
//!
//! ## Concurrency
//!
//! [`SharedLedger`] wraps the ledger in a `parking_lot::RwLock`. Mutations
//! hold the write lock for the whole operation, so concurrent submissions
//! are serialized into one total order.

use std::sync::Arc;

use depledger_core::{AccountId, Amount, ListingId, RepositoryId, TokenId, TokenRef};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, GenesisConfig};
use crate::error::LedgerError;
use crate::graph::{group_by_repository, AdjacencyGraph, ReferenceGraph, RepositoryEdges};
use crate::journal::{Event, Journal};
use crate::marketplace::{LicenseHolding, Listing, ListingStatus, Marketplace};
use crate::primitives::Balances;
use crate::registry::{DependencySpec, Registry};
use crate::repository::{Authority, Metadata, Owner, SoftwareMeta, Token};

/// Log a rejected operation and pass the error through.
fn rejected(op: &'static str, err: LedgerError) -> LedgerError {
    tracing::debug!(op, code = err.code(), class = %err.class(), error = %err, "operation rejected");
    err
}

/// The dependency ledger.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balances: Balances,
    registry: Registry<AdjacencyGraph>,
    marketplace: Marketplace,
    journal: Journal,
}

impl Ledger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger seeded from a genesis configuration.
    ///
    /// Balances are deposited first, then developers registered, each
    /// through the journal like any other operation.
    pub fn from_genesis(genesis: &GenesisConfig) -> Result<Self, ConfigError> {
        let mut ledger = Self::new();
        for (account, amount) in genesis.allocations()? {
            ledger.deposit(account, amount)?;
        }
        for account in &genesis.developers {
            ledger.register_developer(*account)?;
        }
        tracing::info!(
            accounts = genesis.accounts.len(),
            developers = genesis.developers.len(),
            "ledger seeded from genesis"
        );
        Ok(ledger)
    }

    // ── Ledger primitives ───────────────────────────────────────────────

    /// Credit `amount` to `account`. Returns the new balance.
    pub fn deposit(&mut self, account: AccountId, amount: Amount) -> Result<Amount, LedgerError> {
        self.try_deposit(account, amount)
            .map_err(|e| rejected("deposit", e))
    }

    fn try_deposit(&mut self, account: AccountId, amount: Amount) -> Result<Amount, LedgerError> {
        let balance = self.balances.check_deposit(&account, amount)?;
        let receipt = self.journal.prepare(Event::FundsDeposited {
            account,
            amount,
            balance,
        })?;

        self.balances.deposit(&account, amount)?;

        self.journal.commit(receipt);
        tracing::info!(%account, %amount, %balance, "funds deposited");
        Ok(balance)
    }

    /// Balance of `account`; zero if never mentioned.
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.balance_of(account)
    }

    /// The balance sheet.
    pub fn balances(&self) -> &Balances {
        &self.balances
    }

    // ── Registry ────────────────────────────────────────────────────────

    /// Provision a repository for `account`.
    pub fn register_developer(&mut self, account: AccountId) -> Result<RepositoryId, LedgerError> {
        self.try_register_developer(account)
            .map_err(|e| rejected("register_developer", e))
    }

    fn try_register_developer(&mut self, account: AccountId) -> Result<RepositoryId, LedgerError> {
        let repository = self.registry.prepare_registration(&account)?;
        let receipt = self.journal.prepare(Event::DeveloperRegistered {
            account,
            repository,
        })?;

        self.registry.register_developer(account)?;

        self.journal.commit(receipt);
        tracing::info!(%account, %repository, "developer registered");
        Ok(repository)
    }

    /// Whether `account` has a repository.
    pub fn is_developer(&self, account: &AccountId) -> bool {
        self.registry.is_developer(account)
    }

    /// The repository of `account`, if registered.
    pub fn repository_of(&self, account: &AccountId) -> Option<RepositoryId> {
        self.registry.repository_of(account)
    }

    /// Registered `(account, repository)` pairs in registration order.
    pub fn developers(&self) -> Vec<(AccountId, RepositoryId)> {
        self.registry.developers()
    }

    /// The registry.
    pub fn registry(&self) -> &Registry<AdjacencyGraph> {
        &self.registry
    }

    /// Mint a software token into the repository of `account`.
    ///
    /// Every dependency must name an existing token. On failure no token,
    /// edge or counter advance is recorded.
    pub fn mint_software(
        &mut self,
        account: AccountId,
        metadata: Metadata,
        dependencies: &[TokenRef],
    ) -> Result<TokenRef, LedgerError> {
        self.try_mint_software(account, metadata, dependencies)
            .map_err(|e| rejected("mint_software", e))
    }

    /// Mint with dependencies given as parallel repository and token-id
    /// arrays.
    pub fn mint_software_parallel(
        &mut self,
        account: AccountId,
        metadata: Metadata,
        dependency_repositories: &[RepositoryId],
        dependency_token_ids: &[Vec<TokenId>],
    ) -> Result<TokenRef, LedgerError> {
        let dependencies =
            DependencySpec::from_parallel(dependency_repositories, dependency_token_ids)
                .map_err(|e| rejected("mint_software", e))?;
        self.mint_software(account, metadata, &dependencies)
    }

    fn try_mint_software(
        &mut self,
        account: AccountId,
        metadata: Metadata,
        dependencies: &[TokenRef],
    ) -> Result<TokenRef, LedgerError> {
        let predicted = self.registry.prepare_mint(&account, dependencies)?;
        let receipt = self.journal.prepare(Event::SoftwareMinted {
            repository: predicted.repository,
            token_id: predicted.token_id,
            metadata: metadata.clone(),
            dependencies: dependencies.to_vec(),
        })?;

        let token = self
            .registry
            .mint_software(&account, metadata, dependencies, receipt.sequence())?;

        self.journal.commit(receipt);
        tracing::info!(
            %account,
            %token,
            dependencies = dependencies.len(),
            "software minted"
        );
        Ok(token)
    }

    // ── Token queries ───────────────────────────────────────────────────

    /// Look up a token.
    pub fn token(&self, token: &TokenRef) -> Result<&Token, LedgerError> {
        self.registry
            .repository(&token.repository)
            .map_err(|_| LedgerError::UnknownToken { token: *token })?
            .token(token.token_id)
    }

    /// Every token of `repository`, in id order.
    pub fn tokens_of(&self, repository: &RepositoryId) -> Result<Vec<&Token>, LedgerError> {
        Ok(self.registry.repository(repository)?.tokens().collect())
    }

    /// Current owner of a token.
    pub fn owner_of(&self, token: &TokenRef) -> Result<Owner, LedgerError> {
        self.token(token).map(|t| t.owner)
    }

    /// Metadata blob of a token.
    pub fn token_uri(&self, token: &TokenRef) -> Result<&Metadata, LedgerError> {
        self.token(token).map(|t| &t.metadata)
    }

    /// Metadata plus dependencies grouped by repository.
    pub fn software_meta(&self, token: &TokenRef) -> Result<SoftwareMeta, LedgerError> {
        self.token(token)?;
        self.registry
            .repository(&token.repository)?
            .software_meta(token.token_id)
    }

    /// Whether `repository` holds software token `token_id`.
    pub fn repository_owns_software(&self, repository: &RepositoryId, token_id: TokenId) -> bool {
        self.registry.repository_owns_software(repository, token_id)
    }

    /// Outbound edges of `token`.
    pub fn referring_of(&self, token: &TokenRef) -> Result<&[TokenRef], LedgerError> {
        self.registry.graph().referring_of(token)
    }

    /// Inbound edges of `token`.
    pub fn referred_of(&self, token: &TokenRef) -> Result<&[TokenRef], LedgerError> {
        self.registry.graph().referred_of(token)
    }

    /// Outbound edges grouped by repository.
    pub fn grouped_referring_of(&self, token: &TokenRef) -> Result<Vec<RepositoryEdges>, LedgerError> {
        self.referring_of(token).map(group_by_repository)
    }

    /// Inbound edges grouped by repository.
    pub fn grouped_referred_of(&self, token: &TokenRef) -> Result<Vec<RepositoryEdges>, LedgerError> {
        self.referred_of(token).map(group_by_repository)
    }

    // ── Marketplace ─────────────────────────────────────────────────────

    /// Offer software token `token_id` of the seller's repository for
    /// licensing at `price`.
    pub fn list_software(
        &mut self,
        seller: AccountId,
        token_id: TokenId,
        price: Amount,
    ) -> Result<Listing, LedgerError> {
        self.try_list_software(seller, token_id, price)
            .map_err(|e| rejected("list_software", e))
    }

    /// Resolve the seller's repository and check the seller owns the
    /// software token through it.
    fn check_seller_owns(&self, seller: &AccountId, token_id: TokenId) -> Result<TokenRef, LedgerError> {
        let repository = self
            .registry
            .repository_of(seller)
            .ok_or(LedgerError::NotRegistered { account: *seller })?;
        let token = TokenRef::new(repository, token_id);
        let record = self.registry.repository(&repository)?.token(token_id)?;
        if !record.kind.is_software() || record.owner != Owner::Repository(repository) {
            return Err(LedgerError::NotOwner {
                account: *seller,
                token,
            });
        }
        Ok(token)
    }

    fn try_list_software(
        &mut self,
        seller: AccountId,
        token_id: TokenId,
        price: Amount,
    ) -> Result<Listing, LedgerError> {
        let token = self.check_seller_owns(&seller, token_id)?;
        self.marketplace.check_unlisted(&token)?;
        if price.is_zero() {
            return Err(LedgerError::InvalidPrice);
        }
        let id = ListingId::new();
        let receipt = self.journal.prepare(Event::SoftwareListed {
            listing: id,
            seller,
            repository: token.repository,
            token_id,
            price,
        })?;
        let listing = Listing {
            id,
            token,
            seller,
            price,
            status: ListingStatus::Active,
            listed_at: receipt.sequence(),
        };

        self.marketplace.open(listing.clone())?;

        self.journal.commit(receipt);
        tracing::info!(%seller, %token, %price, listing = %id, "software listed");
        Ok(listing)
    }

    /// Withdraw the seller's active listing of `token_id`.
    pub fn delist_software(&mut self, seller: AccountId, token_id: TokenId) -> Result<Listing, LedgerError> {
        self.try_delist_software(seller, token_id)
            .map_err(|e| rejected("delist_software", e))
    }

    fn try_delist_software(&mut self, seller: AccountId, token_id: TokenId) -> Result<Listing, LedgerError> {
        let token = self.check_seller_owns(&seller, token_id)?;
        let active = self
            .marketplace
            .active_listing(&token)
            .ok_or(LedgerError::NotListed { token })?;
        let receipt = self.journal.prepare(Event::SoftwareDelisted {
            listing: active.id,
            seller,
            repository: token.repository,
            token_id,
        })?;

        let closed = self.marketplace.close(&token, ListingStatus::Delisted)?;

        self.journal.commit(receipt);
        tracing::info!(%seller, %token, listing = %closed.id, "software delisted");
        Ok(closed)
    }

    /// Whether the token has an active listing.
    pub fn is_listed(&self, token: &TokenRef) -> bool {
        self.marketplace.is_listed(token)
    }

    /// The most recent listing of the token, active or not.
    pub fn listing(&self, token: &TokenRef) -> Option<&Listing> {
        self.marketplace.listing(token)
    }

    /// All active listings, in listing order.
    pub fn active_listings(&self) -> Vec<&Listing> {
        self.marketplace.active_listings()
    }

    /// Whether `account` holds a license for `licensed`.
    pub fn has_license(&self, account: &AccountId, licensed: &TokenRef) -> bool {
        self.marketplace.has_license(account, licensed)
    }

    /// Licenses held by `account`, in acquisition order.
    pub fn licenses_of(&self, account: &AccountId) -> &[LicenseHolding] {
        self.marketplace.licenses_of(account)
    }

    /// Buy a license for the listed token, paying exactly its price.
    ///
    /// On success the payment reaches the seller, the listing is sold, and
    /// a license is minted into the seller's repository and handed to the
    /// buyer. The license refers to the purchased token and, for every
    /// dependency the purchased token declared, to the earliest license the
    /// seller holds for that dependency. Returns the license token.
    pub fn purchase_license(
        &mut self,
        buyer: AccountId,
        token: TokenRef,
        payment: Amount,
    ) -> Result<TokenRef, LedgerError> {
        self.try_purchase_license(buyer, token, payment)
            .map_err(|e| rejected("purchase_license", e))
    }

    /// Edges of a new license for `purchased` sold by `seller`.
    fn provenance_edges(&self, seller: &AccountId, purchased: &TokenRef) -> Result<Vec<TokenRef>, LedgerError> {
        let mut edges = vec![*purchased];
        for dependency in &self.token(purchased)?.dependencies {
            if let Some(license) = self.marketplace.earliest_license(seller, dependency) {
                if !edges.contains(&license) {
                    edges.push(license);
                }
            }
        }
        Ok(edges)
    }

    fn try_purchase_license(
        &mut self,
        buyer: AccountId,
        token: TokenRef,
        payment: Amount,
    ) -> Result<TokenRef, LedgerError> {
        let listing = self
            .marketplace
            .active_listing(&token)
            .cloned()
            .ok_or(LedgerError::NotListed { token })?;
        if payment != listing.price {
            return Err(LedgerError::PriceMismatch {
                expected: listing.price,
                offered: payment,
            });
        }
        if buyer == listing.seller {
            return Err(LedgerError::SelfPurchase {
                account: buyer,
                token,
            });
        }
        self.balances.check_transfer(&buyer, &listing.seller, payment)?;

        let metadata = self.token_uri(&token)?.clone();
        let provenance = self.provenance_edges(&listing.seller, &token)?;
        self.registry.graph().check_targets(&provenance)?;
        let license = TokenRef::new(
            token.repository,
            self.registry.repository(&token.repository)?.peek_next_id(),
        );
        let receipt = self.journal.prepare(Event::LicensePurchased {
            listing: listing.id,
            buyer,
            seller: listing.seller,
            repository: token.repository,
            token_id: token.token_id,
            price: payment,
            license,
        })?;

        self.balances.transfer(&buyer, &listing.seller, payment)?;
        self.marketplace.close(&token, ListingStatus::Sold)?;
        let minted = self.registry.mint_license(
            &token.repository,
            token,
            metadata,
            provenance,
            receipt.sequence(),
        )?;
        self.registry
            .transfer_ownership(Authority::Marketplace, minted, Owner::Account(buyer))?;
        self.marketplace.record_license(buyer, token, minted);

        self.journal.commit(receipt);
        tracing::info!(
            %buyer,
            seller = %listing.seller,
            %token,
            license = %minted,
            price = %payment,
            "license purchased"
        );
        Ok(minted)
    }

    // ── Journal ─────────────────────────────────────────────────────────

    /// The operation journal.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Run one serialized operation.
    pub fn apply(&mut self, operation: Operation) -> Result<Outcome, LedgerError> {
        match operation {
            Operation::RegisterDeveloper { account } => self
                .register_developer(account)
                .map(|repository| Outcome::Registered {
                    account,
                    repository,
                }),
            Operation::Deposit { account, amount } => self
                .deposit(account, amount)
                .map(|balance| Outcome::Deposited { account, balance }),
            Operation::MintSoftware {
                account,
                metadata,
                dependencies,
            } => {
                let edges =
                    DependencySpec::flatten(&dependencies).map_err(|e| rejected("mint_software", e))?;
                self.mint_software(account, metadata, &edges)
                    .map(|token| Outcome::Minted { token })
            }
            Operation::ListSoftware {
                seller,
                token_id,
                price,
            } => self
                .list_software(seller, token_id, price)
                .map(|listing| Outcome::Listed { listing }),
            Operation::DelistSoftware { seller, token_id } => self
                .delist_software(seller, token_id)
                .map(|listing| Outcome::Delisted { listing }),
            Operation::PurchaseLicense {
                buyer,
                repository,
                token_id,
                payment,
            } => self
                .purchase_license(buyer, TokenRef::new(repository, token_id), payment)
                .map(|license| Outcome::Purchased { license }),
        }
    }
}

/// A serialized ledger operation, as it appears in a replayable script or
/// on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Onboard a developer.
    RegisterDeveloper {
        /// The developer account.
        account: AccountId,
    },
    /// Credit native currency.
    Deposit {
        /// The credited account.
        account: AccountId,
        /// Base units.
        amount: Amount,
    },
    /// Mint a software token.
    MintSoftware {
        /// The minting developer.
        account: AccountId,
        /// Opaque metadata blob.
        metadata: Metadata,
        /// Declared dependencies, grouped by repository.
        #[serde(default)]
        dependencies: Vec<DependencySpec>,
    },
    /// List a software token.
    ListSoftware {
        /// The developer listing.
        seller: AccountId,
        /// Token id within the seller's repository.
        token_id: TokenId,
        /// Base units.
        price: Amount,
    },
    /// Withdraw a listing.
    DelistSoftware {
        /// The developer delisting.
        seller: AccountId,
        /// Token id within the seller's repository.
        token_id: TokenId,
    },
    /// Buy a license.
    PurchaseLicense {
        /// The buying account.
        buyer: AccountId,
        /// Repository of the listed token.
        repository: RepositoryId,
        /// The listed token.
        token_id: TokenId,
        /// Base units; must equal the listing price.
        payment: Amount,
    },
}

impl Operation {
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
}

/// The result of a successful [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// A repository was provisioned.
    Registered {
        /// The developer.
        account: AccountId,
        /// The new repository.
        repository: RepositoryId,
    },
    /// Funds were credited.
    Deposited {
        /// The credited account.
        account: AccountId,
        /// Its new balance.
        balance: Amount,
    },
    /// A software token was minted.
    Minted {
        /// The new token.
        token: TokenRef,
    },
    /// A listing was opened.
    Listed {
        /// The new listing.
        listing: Listing,
    },
    /// A listing was withdrawn.
    Delisted {
        /// The closed listing.
        listing: Listing,
    },
    /// A license was sold.
    Purchased {
        /// The new license token.
        license: TokenRef,
    },
}

/// Thread-safe handle to one [`Ledger`].
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
}

impl SharedLedger {
    /// Share `ledger`.
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    /// Shared read access for queries.
    pub fn read(&self) -> RwLockReadGuard<'_, Ledger> {
        self.inner.read()
    }

    /// Exclusive access for one mutation.
    pub fn write(&self) -> RwLockWriteGuard<'_, Ledger> {
        self.inner.write()
    }

    /// Apply one operation under the write lock.
    pub fn apply(&self, operation: Operation) -> Result<Outcome, LedgerError> {
        self.inner.write().apply(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(b: u8) -> AccountId {
        AccountId::from_bytes([b; 20])
    }

    fn funded_developers() -> (Ledger, RepositoryId, RepositoryId) {
        let mut ledger = Ledger::new();
        let r1 = ledger.register_developer(account(1)).unwrap();
        let r2 = ledger.register_developer(account(2)).unwrap();
        ledger.deposit(account(1), Amount::from_whole(10)).unwrap();
        ledger.deposit(account(2), Amount::from_whole(10)).unwrap();
        (ledger, r1, r2)
    }

    #[test]
    fn test_list_requires_registration_and_ownership() {
        let (mut ledger, _, _) = funded_developers();
        let b = ledger.mint_software(account(2), "b".into(), &[]).unwrap();

        let err = ledger
            .list_software(account(9), b.token_id, Amount::from_whole(1))
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotRegistered { .. }));

        // Token id 1 of account 1's repository does not exist.
        let err = ledger
            .list_software(account(1), b.token_id, Amount::from_whole(1))
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownToken { .. }));
    }

    #[test]
    fn test_list_check_order() {
        let (mut ledger, _, _) = funded_developers();
        let b = ledger.mint_software(account(2), "b".into(), &[]).unwrap();
        let err = ledger.list_software(account(2), b.token_id, Amount::ZERO).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidPrice));

        ledger
            .list_software(account(2), b.token_id, Amount::from_whole(1))
            .unwrap();
        // AlreadyListed is reported before the price check.
        let err = ledger.list_software(account(2), b.token_id, Amount::ZERO).unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyListed { .. }));
    }

    #[test]
    fn test_license_tokens_are_not_listable() {
        let (mut ledger, _, r2) = funded_developers();
        let b = ledger.mint_software(account(2), "b".into(), &[]).unwrap();
        ledger
            .list_software(account(2), b.token_id, Amount::from_whole(1))
            .unwrap();
        let license = ledger
            .purchase_license(account(1), b, Amount::from_whole(1))
            .unwrap();
        assert_eq!(license.repository, r2);
        let err = ledger
            .list_software(account(2), license.token_id, Amount::from_whole(1))
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotOwner { .. }));
    }

    #[test]
    fn test_purchase_check_order() {
        let (mut ledger, _, _) = funded_developers();
        let b = ledger.mint_software(account(2), "b".into(), &[]).unwrap();
        ledger
            .list_software(account(2), b.token_id, Amount::from_whole(1))
            .unwrap();

        let err = ledger
            .purchase_license(account(2), b, Amount::from_whole(2))
            .unwrap_err();
        assert!(matches!(err, LedgerError::PriceMismatch { .. }));

        let err = ledger
            .purchase_license(account(2), b, Amount::from_whole(1))
            .unwrap_err();
        assert!(matches!(err, LedgerError::SelfPurchase { .. }));

        let err = ledger
            .purchase_license(account(7), b, Amount::from_whole(1))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert!(ledger.is_listed(&b));
    }

    #[test]
    fn test_delist_then_relist() {
        let (mut ledger, _, _) = funded_developers();
        let b = ledger.mint_software(account(2), "b".into(), &[]).unwrap();
        let first = ledger
            .list_software(account(2), b.token_id, Amount::from_whole(1))
            .unwrap();
        let closed = ledger.delist_software(account(2), b.token_id).unwrap();
        assert_eq!(closed.id, first.id);
        assert_eq!(closed.status, ListingStatus::Delisted);
        assert!(!ledger.is_listed(&b));
        assert!(matches!(
            ledger.delist_software(account(2), b.token_id),
            Err(LedgerError::NotListed { .. })
        ));
        assert!(matches!(
            ledger.purchase_license(account(1), b, Amount::from_whole(1)),
            Err(LedgerError::NotListed { .. })
        ));

        let second = ledger
            .list_software(account(2), b.token_id, Amount::from_whole(2))
            .unwrap();
        assert_ne!(second.id, first.id);
        assert_eq!(ledger.listing(&b).unwrap().price, Amount::from_whole(2));
    }

    #[test]
    fn test_unknown_repository_queries() {
        let ledger = Ledger::new();
        let missing = TokenRef::new(RepositoryId::from_bytes([4; 20]), 1);
        assert!(matches!(ledger.owner_of(&missing), Err(LedgerError::UnknownToken { .. })));
        assert!(matches!(
            ledger.referring_of(&missing),
            Err(LedgerError::UnknownToken { .. })
        ));
        assert!(matches!(
            ledger.tokens_of(&missing.repository),
            Err(LedgerError::UnknownRepository { .. })
        ));
    }

    #[test]
    fn test_journal_records_only_commits() {
        let (mut ledger, _, _) = funded_developers();
        assert_eq!(ledger.journal().len(), 4);
        let _ = ledger.register_developer(account(1));
        let _ = ledger.mint_software(account(9), "x".into(), &[]);
        assert_eq!(ledger.journal().len(), 4);
        ledger.mint_software(account(1), "a".into(), &[]).unwrap();
        assert_eq!(ledger.journal().len(), 5);
        assert!(ledger.journal().verify().is_ok());
    }

    #[test]
    fn test_minted_at_matches_receipt_sequence() {
        let (mut ledger, _, _) = funded_developers();
        let a = ledger.mint_software(account(1), "a".into(), &[]).unwrap();
        let seq = ledger.token(&a).unwrap().minted_at;
        let receipt = &ledger.journal().receipts()[seq as usize];
        assert!(matches!(
            receipt.event,
            Event::SoftwareMinted { token_id, .. } if token_id == a.token_id
        ));
    }

    #[test]
    fn test_apply_dispatches_operations() {
        let mut ledger = Ledger::new();
        let ops: Vec<Operation> = serde_json::from_value(serde_json::json!([
            {"op": "register_developer", "account": account(1).to_string()},
            {"op": "deposit", "account": account(1).to_string(), "amount": "5"},
            {"op": "mint_software", "account": account(1).to_string(), "metadata": "pkg"}
        ]))
        .unwrap();
        let outcomes: Vec<Outcome> = ops
            .into_iter()
            .map(|op| ledger.apply(op).unwrap())
            .collect();
        assert!(matches!(outcomes[0], Outcome::Registered { .. }));
        assert!(matches!(outcomes[1], Outcome::Deposited { balance, .. } if balance == Amount::from_base_units(5)));
        assert!(matches!(outcomes[2], Outcome::Minted { token } if token.token_id == 1));
    }

    #[test]
    fn test_apply_rejects_empty_dependency_list() {
        let mut ledger = Ledger::new();
        ledger.register_developer(account(1)).unwrap();
        let op = Operation::MintSoftware {
            account: account(1),
            metadata: "x".into(),
            dependencies: vec![DependencySpec {
                repository: RepositoryId::from_bytes([3; 20]),
                token_ids: vec![],
            }],
        };
        assert!(matches!(
            ledger.apply(op),
            Err(LedgerError::EmptyDependencyList { .. })
        ));
    }

    #[test]
    fn test_mint_parallel_form() {
        let (mut ledger, r1, r2) = funded_developers();
        let b = ledger.mint_software(account(2), "b".into(), &[]).unwrap();
        let before = ledger.journal().len();

        let err = ledger
            .mint_software_parallel(account(1), "a".into(), &[r2, r2], &[vec![1]])
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::ArityMismatch {
                repositories: 2,
                token_lists: 1
            }
        ));
        let err = ledger
            .mint_software_parallel(account(1), "a".into(), &[r2], &[vec![]])
            .unwrap_err();
        assert!(matches!(err, LedgerError::EmptyDependencyList { repository } if repository == r2));
        assert_eq!(ledger.journal().len(), before);
        assert_eq!(ledger.registry().repository(&r1).unwrap().peek_next_id(), 1);

        let a = ledger
            .mint_software_parallel(account(1), "a".into(), &[r2], &[vec![b.token_id]])
            .unwrap();
        assert_eq!(a, TokenRef::new(r1, 1));
        assert_eq!(ledger.referring_of(&a).unwrap(), &[b]);
        assert_eq!(ledger.journal().len(), before + 1);
    }

    #[test]
    fn test_genesis_seeds_balances_and_developers() {
        let genesis = GenesisConfig {
            accounts: vec![crate::config::GenesisAccount {
                account: account(1),
                balance: "2.5".to_string(),
            }],
            developers: vec![account(1)],
        };
        let ledger = Ledger::from_genesis(&genesis).unwrap();
        assert_eq!(ledger.balance_of(&account(1)), Amount::parse_decimal("2.5").unwrap());
        assert!(ledger.is_developer(&account(1)));
        assert_eq!(ledger.journal().len(), 2);
    }

    #[test]
    fn test_shared_ledger_serializes_purchases() {
        let (mut ledger, _, _) = funded_developers();
        ledger.deposit(account(3), Amount::from_whole(10)).unwrap();
        let b = ledger.mint_software(account(2), "b".into(), &[]).unwrap();
        ledger
            .list_software(account(2), b.token_id, Amount::from_whole(1))
            .unwrap();
        let shared = SharedLedger::new(ledger);

        let handles: Vec<_> = [account(1), account(3)]
            .into_iter()
            .map(|buyer| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    shared.apply(Operation::PurchaseLicense {
                        buyer,
                        repository: b.repository,
                        token_id: b.token_id,
                        payment: Amount::from_whole(1),
                    })
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(LedgerError::NotListed { .. }))));
        assert_eq!(shared.read().balance_of(&account(2)), Amount::from_whole(11));
    }
}
