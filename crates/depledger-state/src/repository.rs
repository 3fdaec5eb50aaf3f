//! # Repository
//!
//! A developer's container of tokens. Each repository allocates its own
//! token ids and stores the metadata, kind, owner and declared
//! dependencies of every token it minted.
//!
//! Repositories do not accept mint calls from arbitrary callers: minting
//! is `pub(crate)` and reached only through the [`Registry`], which
//! enforces developer registration, and the marketplace purchase flow,
//! which issues licenses.
//!
//! ## Ownership
//!
//! Software tokens are owned by their minting repository. A license token
//! is minted into the seller's repository and then handed to the buyer's
//! account by [`Authority::Marketplace`].
//!
//! [`Registry`]: crate::registry::Registry

use std::collections::BTreeMap;

use depledger_core::{AccountId, RepositoryId, TokenId, TokenRef};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::graph::{group_by_repository, ReferenceGraph};
use crate::primitives::TokenCounter;

// ── Metadata ────────────────────────────────────────────────────────────

/// The opaque metadata blob attached to a token.
///
/// Stored as bytes and returned verbatim. Serializes as a plain string
/// when the bytes are valid UTF-8 and as `{"hex": "..."}` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Metadata(Vec<u8>);

impl Metadata {
    /// Wrap raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The bytes as text, if they are valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the blob is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Metadata {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for Metadata {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<Vec<u8>> for Metadata {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum MetadataRepr {
    Text(String),
    Bytes { hex: String },
}

impl Serialize for Metadata {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = match self.as_str() {
            Some(text) => MetadataRepr::Text(text.to_string()),
            None => MetadataRepr::Bytes {
                hex: self.0.iter().map(|b| format!("{b:02x}")).collect(),
            },
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match MetadataRepr::deserialize(deserializer)? {
            MetadataRepr::Text(text) => Ok(Self(text.into_bytes())),
            MetadataRepr::Bytes { hex } => {
                if hex.len() % 2 != 0 || !hex.is_ascii() {
                    return Err(serde::de::Error::custom("metadata hex must have even length"));
                }
                (0..hex.len())
                    .step_by(2)
                    .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
                    .collect::<Result<Vec<u8>, _>>()
                    .map(Self)
                    .map_err(|e| serde::de::Error::custom(format!("invalid metadata hex: {e}")))
            }
        }
    }
}

// ── Token model ─────────────────────────────────────────────────────────

/// What a token represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenKind {
    /// A software package minted by its developer.
    Software,
    /// The right to use `licensed`, issued by the marketplace.
    License {
        /// The purchased package.
        licensed: TokenRef,
    },
}

impl TokenKind {
    /// Whether this is a software token.
    pub fn is_software(&self) -> bool {
        matches!(self, Self::Software)
    }
}

/// The current holder of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Owner {
    /// Held by a repository.
    Repository(RepositoryId),
    /// Held by an account directly (licenses only).
    Account(AccountId),
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repository(id) => write!(f, "repository {id}"),
            Self::Account(id) => write!(f, "account {id}"),
        }
    }
}

/// The component requesting an ownership transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authority {
    /// The marketplace; may move license tokens.
    Marketplace,
    /// The registry; may move software tokens.
    Registry,
}

impl Authority {
    fn may_transfer(&self, kind: &TokenKind) -> bool {
        matches!(
            (self, kind),
            (Self::Marketplace, TokenKind::License { .. }) | (Self::Registry, TokenKind::Software)
        )
    }
}

impl std::fmt::Display for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Marketplace => f.write_str("marketplace"),
            Self::Registry => f.write_str("registry"),
        }
    }
}

/// A minted token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Id within the minting repository.
    pub id: TokenId,
    /// Software or license.
    #[serde(flatten)]
    pub kind: TokenKind,
    /// The opaque metadata blob (`tokenURI`).
    pub metadata: Metadata,
    /// Current holder.
    pub owner: Owner,
    /// Outbound edges recorded at mint time, in declaration order.
    pub dependencies: Vec<TokenRef>,
    /// Journal sequence number of the operation that minted the token.
    pub minted_at: u64,
}

/// Metadata plus dependencies grouped by repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareMeta {
    /// The token's metadata blob.
    pub metadata: Metadata,
    /// Dependency repositories in first-seen order.
    pub deps: Vec<RepositoryId>,
    /// Token ids per entry of `deps`.
    pub dep_token_ids: Vec<Vec<TokenId>>,
}

// ── Repository ──────────────────────────────────────────────────────────

/// A developer's token container.
#[derive(Debug, Clone)]
pub struct Repository {
    id: RepositoryId,
    developer: AccountId,
    counter: TokenCounter,
    tokens: BTreeMap<TokenId, Token>,
}

impl Repository {
    pub(crate) fn new(id: RepositoryId, developer: AccountId) -> Self {
        Self {
            id,
            developer,
            counter: TokenCounter::new(),
            tokens: BTreeMap::new(),
        }
    }

    /// This repository's address.
    pub fn id(&self) -> RepositoryId {
        self.id
    }

    /// The developer the repository belongs to.
    pub fn developer(&self) -> AccountId {
        self.developer
    }

    /// The id the next mint will receive.
    pub fn peek_next_id(&self) -> TokenId {
        self.counter.peek()
    }

    /// Every token, in id order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    /// Number of tokens minted.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Look up a token.
    pub fn token(&self, id: TokenId) -> Result<&Token, LedgerError> {
        self.tokens.get(&id).ok_or(LedgerError::UnknownToken {
            token: TokenRef::new(self.id, id),
        })
    }

    /// Current owner of a token.
    pub fn owner_of(&self, id: TokenId) -> Result<Owner, LedgerError> {
        self.token(id).map(|t| t.owner)
    }

    /// Metadata blob of a token.
    pub fn token_uri(&self, id: TokenId) -> Result<&Metadata, LedgerError> {
        self.token(id).map(|t| &t.metadata)
    }

    /// Metadata plus dependencies grouped by repository.
    pub fn software_meta(&self, id: TokenId) -> Result<SoftwareMeta, LedgerError> {
        let token = self.token(id)?;
        let (deps, dep_token_ids) = group_by_repository(&token.dependencies)
            .into_iter()
            .map(|g| (g.repository, g.token_ids))
            .unzip();
        Ok(SoftwareMeta {
            metadata: token.metadata.clone(),
            deps,
            dep_token_ids,
        })
    }

    /// Mint a token and record its outbound edges.
    ///
    /// Every dependency target is checked before the counter advances, so
    /// a `DanglingReference` leaves the repository and the graph untouched.
    pub(crate) fn mint<G: ReferenceGraph>(
        &mut self,
        graph: &mut G,
        kind: TokenKind,
        metadata: Metadata,
        dependencies: Vec<TokenRef>,
        minted_at: u64,
    ) -> Result<TokenRef, LedgerError> {
        graph.check_targets(&dependencies)?;

        let id = self.counter.next_id();
        let token_ref = TokenRef::new(self.id, id);
        graph.register(token_ref);
        graph.add_edges(token_ref, &dependencies)?;

        self.tokens.insert(
            id,
            Token {
                id,
                kind,
                metadata,
                owner: Owner::Repository(self.id),
                dependencies,
                minted_at,
            },
        );
        Ok(token_ref)
    }

    /// Check that `authority` may move token `id`.
    pub(crate) fn check_transfer(&self, authority: Authority, id: TokenId) -> Result<(), LedgerError> {
        let token = self.token(id)?;
        if !authority.may_transfer(&token.kind) {
            return Err(LedgerError::TransferNotPermitted {
                token: TokenRef::new(self.id, id),
                authority,
            });
        }
        Ok(())
    }

    /// Hand token `id` to `new_owner`.
    pub(crate) fn transfer_ownership(
        &mut self,
        authority: Authority,
        id: TokenId,
        new_owner: Owner,
    ) -> Result<(), LedgerError> {
        self.check_transfer(authority, id)?;
        if let Some(token) = self.tokens.get_mut(&id) {
            token.owner = new_owner;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AdjacencyGraph;

    fn repo(b: u8) -> Repository {
        Repository::new(RepositoryId::from_bytes([b; 20]), AccountId::from_bytes([b; 20]))
    }

    #[test]
    fn test_mint_without_dependencies() {
        let mut graph = AdjacencyGraph::new();
        let mut r = repo(1);
        let t = r
            .mint(&mut graph, TokenKind::Software, "pkg-a".into(), vec![], 0)
            .unwrap();
        assert_eq!(t.token_id, 1);
        assert_eq!(r.owner_of(1).unwrap(), Owner::Repository(r.id()));
        assert_eq!(r.token_uri(1).unwrap().as_str(), Some("pkg-a"));
        assert!(graph.referring_of(&t).unwrap().is_empty());
    }

    #[test]
    fn test_dangling_mint_does_not_advance_counter() {
        let mut graph = AdjacencyGraph::new();
        let mut r = repo(1);
        let missing = TokenRef::new(RepositoryId::from_bytes([9; 20]), 4);
        let err = r
            .mint(&mut graph, TokenKind::Software, "x".into(), vec![missing], 0)
            .unwrap_err();
        assert!(matches!(err, LedgerError::DanglingReference { .. }));
        assert_eq!(r.peek_next_id(), 1);
        assert_eq!(r.token_count(), 0);
        assert_eq!(graph.vertex_count(), 0);
    }

    #[test]
    fn test_unknown_token_lookup() {
        let r = repo(1);
        assert!(matches!(r.owner_of(3), Err(LedgerError::UnknownToken { .. })));
        assert!(matches!(r.token_uri(3), Err(LedgerError::UnknownToken { .. })));
    }

    #[test]
    fn test_software_meta_groups_dependencies() {
        let mut graph = AdjacencyGraph::new();
        let mut a = repo(1);
        let mut b = repo(2);
        let a1 = a.mint(&mut graph, TokenKind::Software, "a1".into(), vec![], 0).unwrap();
        let a2 = a.mint(&mut graph, TokenKind::Software, "a2".into(), vec![], 1).unwrap();
        let b1 = b.mint(&mut graph, TokenKind::Software, "b1".into(), vec![], 2).unwrap();
        let c = b
            .mint(&mut graph, TokenKind::Software, "c".into(), vec![a1, b1, a2], 3)
            .unwrap();
        let meta = b.software_meta(c.token_id).unwrap();
        assert_eq!(meta.deps, vec![a.id(), b.id()]);
        assert_eq!(meta.dep_token_ids, vec![vec![1, 2], vec![1]]);
    }

    #[test]
    fn test_transfer_authority_rules() {
        let mut graph = AdjacencyGraph::new();
        let mut r = repo(1);
        let sw = r.mint(&mut graph, TokenKind::Software, "sw".into(), vec![], 0).unwrap();
        let lic = r
            .mint(&mut graph, TokenKind::License { licensed: sw }, "sw".into(), vec![sw], 1)
            .unwrap();
        let buyer = Owner::Account(AccountId::from_bytes([5; 20]));

        let err = r
            .transfer_ownership(Authority::Marketplace, sw.token_id, buyer)
            .unwrap_err();
        assert!(matches!(err, LedgerError::TransferNotPermitted { .. }));
        assert!(r
            .transfer_ownership(Authority::Registry, lic.token_id, buyer)
            .is_err());

        r.transfer_ownership(Authority::Marketplace, lic.token_id, buyer)
            .unwrap();
        assert_eq!(r.owner_of(lic.token_id).unwrap(), buyer);
    }

    #[test]
    fn test_metadata_serde_text_and_bytes() {
        let text = Metadata::from("{\"name\":\"pkg\"}");
        let json = serde_json::to_string(&text).unwrap();
        assert_eq!(json, "\"{\\\"name\\\":\\\"pkg\\\"}\"");
        assert_eq!(serde_json::from_str::<Metadata>(&json).unwrap(), text);

        let raw = Metadata::from_bytes(vec![0xff, 0x00]);
        let json = serde_json::to_string(&raw).unwrap();
        assert_eq!(json, "{\"hex\":\"ff00\"}");
        assert_eq!(serde_json::from_str::<Metadata>(&json).unwrap(), raw);
        assert!(serde_json::from_str::<Metadata>("{\"hex\":\"f\"}").is_err());
    }
}
