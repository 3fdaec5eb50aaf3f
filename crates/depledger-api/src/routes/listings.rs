//! # Listing API
//!
//! Opens, inspects and withdraws marketplace listings. A token has at
//! most one active listing; a sold or withdrawn token may be listed again.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use depledger_core::{AccountId, Amount, RepositoryId, TokenId, TokenRef};
use depledger_state::{LedgerError, Listing};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::{extract_json, extract_path, extract_validated_json, Validate};
use crate::state::AppState;

/// Request to list a software token of the seller's repository.
#[derive(Debug, Deserialize)]
pub struct ListRequest {
    pub seller: AccountId,
    pub token_id: TokenId,
    pub price: Amount,
}

impl Validate for ListRequest {
    fn validate(&self) -> Result<(), String> {
        if self.token_id == 0 {
            return Err("token_id must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Request to withdraw a listing.
#[derive(Debug, Deserialize)]
pub struct DelistRequest {
    pub seller: AccountId,
}

/// Listing status of one token.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListingStatusView {
    pub token: TokenRef,
    pub listed: bool,
    /// Most recent listing, active or not.
    pub listing: Option<Listing>,
}

/// Build the listings router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/listings", post(list).get(active))
        .route(
            "/v1/listings/{repository}/{token_id}",
            get(status).delete(delist),
        )
}

/// POST /v1/listings: List a software token.
async fn list(
    State(state): State<AppState>,
    body: Result<Json<ListRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Listing>), AppError> {
    let req = extract_validated_json(body)?;
    let listing = state
        .ledger
        .write()
        .list_software(req.seller, req.token_id, req.price)?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// GET /v1/listings: All active listings, in listing order.
async fn active(State(state): State<AppState>) -> Json<Vec<Listing>> {
    let listings = state
        .ledger
        .read()
        .active_listings()
        .into_iter()
        .cloned()
        .collect();
    Json(listings)
}

/// GET /v1/listings/{repository}/{token_id}: Listing status of a token.
async fn status(
    State(state): State<AppState>,
    path: Result<Path<(RepositoryId, TokenId)>, PathRejection>,
) -> Result<Json<ListingStatusView>, AppError> {
    let (repository, token_id) = extract_path(path)?;
    let token = TokenRef::new(repository, token_id);
    let ledger = state.ledger.read();
    ledger.token(&token)?;
    Ok(Json(ListingStatusView {
        token,
        listed: ledger.is_listed(&token),
        listing: ledger.listing(&token).cloned(),
    }))
}

/// DELETE /v1/listings/{repository}/{token_id}: Withdraw the active listing.
async fn delist(
    State(state): State<AppState>,
    path: Result<Path<(RepositoryId, TokenId)>, PathRejection>,
    body: Result<Json<DelistRequest>, JsonRejection>,
) -> Result<Json<Listing>, AppError> {
    let (repository, token_id) = extract_path(path)?;
    let req = extract_json(body)?;
    let mut ledger = state.ledger.write();
    if ledger.repository_of(&req.seller) != Some(repository) {
        return Err(LedgerError::NotOwner {
            account: req.seller,
            token: TokenRef::new(repository, token_id),
        }
        .into());
    }
    Ok(Json(ledger.delist_software(req.seller, token_id)?))
}
