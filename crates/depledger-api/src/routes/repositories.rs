//! # Repository API
//!
//! Read-only views of repositories, their tokens, and the reference graph.
//! `referring` lists what a token points at; `referred` lists what points
//! back at it. Both are also returned grouped by repository.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use depledger_core::{RepositoryId, TokenId, TokenRef};
use depledger_state::{Ledger, LedgerError, RepositoryEdges, SoftwareMeta, Token};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::extract_path;
use crate::state::AppState;

/// A token with its repository, listing status and grouped dependencies.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenView {
    pub repository: RepositoryId,
    #[serde(flatten)]
    pub token: Token,
    pub listed: bool,
    pub meta: SoftwareMeta,
}

/// Edges of one token.
#[derive(Debug, Serialize, Deserialize)]
pub struct EdgesView {
    pub token: TokenRef,
    pub edges: Vec<TokenRef>,
    pub grouped: Vec<RepositoryEdges>,
}

/// Build the repositories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/repositories/{repository}/tokens", get(tokens))
        .route("/v1/repositories/{repository}/tokens/{token_id}", get(token))
        .route(
            "/v1/repositories/{repository}/tokens/{token_id}/referring",
            get(referring),
        )
        .route(
            "/v1/repositories/{repository}/tokens/{token_id}/referred",
            get(referred),
        )
}

fn token_view(ledger: &Ledger, token: TokenRef) -> Result<TokenView, LedgerError> {
    Ok(TokenView {
        repository: token.repository,
        token: ledger.token(&token)?.clone(),
        listed: ledger.is_listed(&token),
        meta: ledger.software_meta(&token)?,
    })
}

/// GET /v1/repositories/{repository}/tokens: Every token in id order.
async fn tokens(
    State(state): State<AppState>,
    path: Result<Path<RepositoryId>, PathRejection>,
) -> Result<Json<Vec<TokenView>>, AppError> {
    let repository = extract_path(path)?;
    let ledger = state.ledger.read();
    let views = ledger
        .tokens_of(&repository)?
        .iter()
        .map(|t| token_view(&ledger, TokenRef::new(repository, t.id)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(views))
}

/// GET /v1/repositories/{repository}/tokens/{token_id}: One token.
async fn token(
    State(state): State<AppState>,
    path: Result<Path<(RepositoryId, TokenId)>, PathRejection>,
) -> Result<Json<TokenView>, AppError> {
    let (repository, token_id) = extract_path(path)?;
    let ledger = state.ledger.read();
    Ok(Json(token_view(&ledger, TokenRef::new(repository, token_id))?))
}

/// GET /v1/repositories/{repository}/tokens/{token_id}/referring: Outbound edges.
async fn referring(
    State(state): State<AppState>,
    path: Result<Path<(RepositoryId, TokenId)>, PathRejection>,
) -> Result<Json<EdgesView>, AppError> {
    let (repository, token_id) = extract_path(path)?;
    let token = TokenRef::new(repository, token_id);
    let ledger = state.ledger.read();
    Ok(Json(EdgesView {
        token,
        edges: ledger.referring_of(&token)?.to_vec(),
        grouped: ledger.grouped_referring_of(&token)?,
    }))
}

/// GET /v1/repositories/{repository}/tokens/{token_id}/referred: Inbound edges.
async fn referred(
    State(state): State<AppState>,
    path: Result<Path<(RepositoryId, TokenId)>, PathRejection>,
) -> Result<Json<EdgesView>, AppError> {
    let (repository, token_id) = extract_path(path)?;
    let token = TokenRef::new(repository, token_id);
    let ledger = state.ledger.read();
    Ok(Json(EdgesView {
        token,
        edges: ledger.referred_of(&token)?.to_vec(),
        grouped: ledger.grouped_referred_of(&token)?,
    }))
}
