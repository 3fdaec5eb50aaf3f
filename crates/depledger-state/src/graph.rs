//! # Reference Graph Store
//!
//! Directed edges between tokens, kept as two append-only adjacency views:
//!
//! - *referring*: outbound edges, what a token depends on or licenses.
//! - *referred*: inbound edges, who points at a token.
//!
//! An edge `(A,a) → (B,b)` is in `referring(A,a)` if and only if it is in
//! `referred(B,b)`. Both views are written in the same call, and there is
//! no remove or replace operation, so a token's declared dependencies are
//! permanent.

use std::collections::BTreeMap;

use depledger_core::{RepositoryId, TokenId, TokenRef};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Storage interface for the bidirectional reference graph.
///
/// Vertices must be registered before they can be the source or target of
/// an edge.
pub trait ReferenceGraph {
    /// Add a vertex with empty adjacency. Registering twice is a no-op.
    fn register(&mut self, token: TokenRef);

    /// Whether the vertex exists.
    fn contains(&self, token: &TokenRef) -> bool;

    /// Append `source → target` to both views.
    ///
    /// Fails with `UnknownToken` if the source is not registered and with
    /// `DanglingReference` if the target is not.
    fn add_edge(&mut self, source: TokenRef, target: TokenRef) -> Result<(), LedgerError>;

    /// Outbound edges of `token`, in insertion order.
    fn referring_of(&self, token: &TokenRef) -> Result<&[TokenRef], LedgerError>;

    /// Inbound edges of `token`, in insertion order.
    fn referred_of(&self, token: &TokenRef) -> Result<&[TokenRef], LedgerError>;

    /// Fail with `DanglingReference` on the first target that does not exist.
    fn check_targets(&self, targets: &[TokenRef]) -> Result<(), LedgerError> {
        match targets.iter().find(|t| !self.contains(t)) {
            Some(missing) => Err(LedgerError::DanglingReference { target: *missing }),
            None => Ok(()),
        }
    }

    /// Append `source → t` for every `t` in `targets`, or nothing at all.
    fn add_edges(&mut self, source: TokenRef, targets: &[TokenRef]) -> Result<(), LedgerError> {
        if !self.contains(&source) {
            return Err(LedgerError::UnknownToken { token: source });
        }
        self.check_targets(targets)?;
        for target in targets {
            self.add_edge(source, *target)?;
        }
        Ok(())
    }
}

/// Adjacency-list implementation of [`ReferenceGraph`].
#[derive(Debug, Clone, Default)]
pub struct AdjacencyGraph {
    referring: BTreeMap<TokenRef, Vec<TokenRef>>,
    referred: BTreeMap<TokenRef, Vec<TokenRef>>,
}

impl AdjacencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered vertices.
    pub fn vertex_count(&self) -> usize {
        self.referring.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.referring.values().map(Vec::len).sum()
    }

    /// Every edge as `(source, target)`, grouped by source in vertex order.
    pub fn edges(&self) -> impl Iterator<Item = (TokenRef, TokenRef)> + '_ {
        self.referring
            .iter()
            .flat_map(|(source, targets)| targets.iter().map(move |t| (*source, *t)))
    }
}

impl ReferenceGraph for AdjacencyGraph {
    fn register(&mut self, token: TokenRef) {
        self.referring.entry(token).or_default();
        self.referred.entry(token).or_default();
    }

    fn contains(&self, token: &TokenRef) -> bool {
        self.referring.contains_key(token)
    }

    fn add_edge(&mut self, source: TokenRef, target: TokenRef) -> Result<(), LedgerError> {
        if !self.contains(&source) {
            return Err(LedgerError::UnknownToken { token: source });
        }
        if !self.contains(&target) {
            return Err(LedgerError::DanglingReference { target });
        }
        self.referring.entry(source).or_default().push(target);
        self.referred.entry(target).or_default().push(source);
        Ok(())
    }

    fn referring_of(&self, token: &TokenRef) -> Result<&[TokenRef], LedgerError> {
        self.referring
            .get(token)
            .map(Vec::as_slice)
            .ok_or(LedgerError::UnknownToken { token: *token })
    }

    fn referred_of(&self, token: &TokenRef) -> Result<&[TokenRef], LedgerError> {
        self.referred
            .get(token)
            .map(Vec::as_slice)
            .ok_or(LedgerError::UnknownToken { token: *token })
    }
}

/// Edges to (or from) one repository: the repository and the token ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEdges {
    /// The repository on the far side of the edges.
    pub repository: RepositoryId,
    /// Token ids in that repository, in edge order.
    pub token_ids: Vec<TokenId>,
}

/// Group an edge list by repository, keeping first-seen repository order.
pub fn group_by_repository(edges: &[TokenRef]) -> Vec<RepositoryEdges> {
    let mut groups: Vec<RepositoryEdges> = Vec::new();
    for edge in edges {
        match groups.iter_mut().find(|g| g.repository == edge.repository) {
            Some(group) => group.token_ids.push(edge.token_id),
            None => groups.push(RepositoryEdges {
                repository: edge.repository,
                token_ids: vec![edge.token_id],
            }),
        }
    }
    groups
}
