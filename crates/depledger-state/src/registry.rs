//! # Registry
//!
//! The directory of developers. Maps each registered account to exactly
//! one [`Repository`] and is the only entry point for minting software,
//! so the "registered developer" check lives in one place.
//!
//! The registry owns the reference graph shared by all repositories.

use std::collections::BTreeMap;

use depledger_core::{AccountId, RepositoryId, TokenId, TokenRef};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::graph::{AdjacencyGraph, ReferenceGraph};
use crate::repository::{Authority, Metadata, Owner, Repository, TokenKind};

/// Declared dependencies on one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    /// The dependency repository.
    pub repository: RepositoryId,
    /// Token ids within it. Must not be empty.
    pub token_ids: Vec<TokenId>,
}

impl DependencySpec {
    /// Expand grouped dependencies into one edge per `(repository, id)`,
    /// preserving declaration order.
    pub fn flatten(specs: &[DependencySpec]) -> Result<Vec<TokenRef>, LedgerError> {
        let mut edges = Vec::new();
        for spec in specs {
            if spec.token_ids.is_empty() {
                return Err(LedgerError::EmptyDependencyList {
                    repository: spec.repository,
                });
            }
            edges.extend(spec.token_ids.iter().map(|id| TokenRef::new(spec.repository, *id)));
        }
        Ok(edges)
    }

    /// Build the edge list from parallel arrays of repositories and
    /// token-id lists.
    pub fn from_parallel(
        repositories: &[RepositoryId],
        token_id_lists: &[Vec<TokenId>],
    ) -> Result<Vec<TokenRef>, LedgerError> {
        if repositories.len() != token_id_lists.len() {
            return Err(LedgerError::ArityMismatch {
                repositories: repositories.len(),
                token_lists: token_id_lists.len(),
            });
        }
        let specs: Vec<DependencySpec> = repositories
            .iter()
            .zip(token_id_lists)
            .map(|(repository, ids)| DependencySpec {
                repository: *repository,
                token_ids: ids.clone(),
            })
            .collect();
        Self::flatten(&specs)
    }
}

/// Developer directory and repository store.
#[derive(Debug, Clone)]
pub struct Registry<G: ReferenceGraph = AdjacencyGraph> {
    developers: BTreeMap<AccountId, RepositoryId>,
    order: Vec<AccountId>,
    repositories: BTreeMap<RepositoryId, Repository>,
    graph: G,
    nonce: u64,
}

impl Registry<AdjacencyGraph> {
    /// An empty registry backed by an [`AdjacencyGraph`].
    pub fn new() -> Self {
        Self::with_graph(AdjacencyGraph::new())
    }
}

impl Default for Registry<AdjacencyGraph> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: ReferenceGraph> Registry<G> {
    /// An empty registry backed by `graph`.
    pub fn with_graph(graph: G) -> Self {
        Self {
            developers: BTreeMap::new(),
            order: Vec::new(),
            repositories: BTreeMap::new(),
            graph,
            nonce: 0,
        }
    }

    /// The repository `register_developer(account)` would provision,
    /// without provisioning it.
    pub fn prepare_registration(&self, account: &AccountId) -> Result<RepositoryId, LedgerError> {
        if let Some(existing) = self.developers.get(account) {
            return Err(LedgerError::AlreadyRegistered {
                account: *account,
                repository: *existing,
            });
        }
        Ok(RepositoryId::derive(account, self.nonce)?)
    }

    /// Provision a repository for `account`.
    pub fn register_developer(&mut self, account: AccountId) -> Result<RepositoryId, LedgerError> {
        let repository = self.prepare_registration(&account)?;
        self.nonce += 1;
        self.developers.insert(account, repository);
        self.order.push(account);
        self.repositories
            .insert(repository, Repository::new(repository, account));
        Ok(repository)
    }

    /// Whether `account` has a repository.
    pub fn is_developer(&self, account: &AccountId) -> bool {
        self.developers.contains_key(account)
    }

    /// The repository of `account`, if registered.
    pub fn repository_of(&self, account: &AccountId) -> Option<RepositoryId> {
        self.developers.get(account).copied()
    }

    /// Registered `(account, repository)` pairs in registration order.
    pub fn developers(&self) -> Vec<(AccountId, RepositoryId)> {
        self.order
            .iter()
            .filter_map(|a| self.developers.get(a).map(|r| (*a, *r)))
            .collect()
    }

    /// Look up a repository.
    pub fn repository(&self, id: &RepositoryId) -> Result<&Repository, LedgerError> {
        self.repositories
            .get(id)
            .ok_or(LedgerError::UnknownRepository { repository: *id })
    }

    pub(crate) fn repository_mut(&mut self, id: &RepositoryId) -> Result<&mut Repository, LedgerError> {
        self.repositories
            .get_mut(id)
            .ok_or(LedgerError::UnknownRepository { repository: *id })
    }

    /// Every repository, in address order.
    pub fn repositories(&self) -> impl Iterator<Item = &Repository> {
        self.repositories.values()
    }

    /// The shared reference graph.
    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Whether `repository` holds software token `id`.
    pub fn repository_owns_software(&self, repository: &RepositoryId, id: TokenId) -> bool {
        self.repositories
            .get(repository)
            .and_then(|r| r.token(id).ok())
            .is_some_and(|t| t.kind.is_software() && t.owner == Owner::Repository(*repository))
    }

    /// The token `mint_software(account, .., dependencies)` would create,
    /// without creating it.
    pub fn prepare_mint(
        &self,
        account: &AccountId,
        dependencies: &[TokenRef],
    ) -> Result<TokenRef, LedgerError> {
        let repository = self
            .repository_of(account)
            .ok_or(LedgerError::NotRegistered { account: *account })?;
        self.graph.check_targets(dependencies)?;
        let next = self.repository(&repository)?.peek_next_id();
        Ok(TokenRef::new(repository, next))
    }

    /// Mint a software token into the repository of `account`.
    pub fn mint_software(
        &mut self,
        account: &AccountId,
        metadata: Metadata,
        dependencies: &[TokenRef],
        minted_at: u64,
    ) -> Result<TokenRef, LedgerError> {
        let repository = self
            .repository_of(account)
            .ok_or(LedgerError::NotRegistered { account: *account })?;
        let repo = self
            .repositories
            .get_mut(&repository)
            .ok_or(LedgerError::UnknownRepository { repository })?;
        repo.mint(
            &mut self.graph,
            TokenKind::Software,
            metadata,
            dependencies.to_vec(),
            minted_at,
        )
    }

    /// Mint a license for `licensed` into `repository`.
    pub(crate) fn mint_license(
        &mut self,
        repository: &RepositoryId,
        licensed: TokenRef,
        metadata: Metadata,
        provenance: Vec<TokenRef>,
        minted_at: u64,
    ) -> Result<TokenRef, LedgerError> {
        let repo = self
            .repositories
            .get_mut(repository)
            .ok_or(LedgerError::UnknownRepository {
                repository: *repository,
            })?;
        repo.mint(
            &mut self.graph,
            TokenKind::License { licensed },
            metadata,
            provenance,
            minted_at,
        )
    }

    /// Move a token to `new_owner` on behalf of `authority`.
    pub(crate) fn transfer_ownership(
        &mut self,
        authority: Authority,
        token: TokenRef,
        new_owner: Owner,
    ) -> Result<(), LedgerError> {
        self.repository_mut(&token.repository)?
            .transfer_ownership(authority, token.token_id, new_owner)
    }
}
