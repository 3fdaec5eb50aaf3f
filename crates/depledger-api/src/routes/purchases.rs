//! # Purchase API
//!
//! Buys a license for a listed token. The payment must equal the listing
//! price exactly.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use depledger_core::{AccountId, Amount, RepositoryId, TokenId, TokenRef};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// Request to buy a license.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    /// The paying account.
    pub buyer: AccountId,
    /// Repository of the listed token.
    pub repository: RepositoryId,
    /// The listed token.
    pub token_id: TokenId,
    /// Base units; must equal the listing price.
    pub payment: Amount,
}

/// The purchased license.
#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseResponse {
    /// The new license token.
    pub license: TokenRef,
    /// The token it licenses.
    pub licensed: TokenRef,
    /// Outbound edges of the license: the purchased token, then the
    /// seller's licenses for its dependencies.
    pub provenance: Vec<TokenRef>,
}

/// Build the purchases router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/purchases", post(purchase))
}

/// POST /v1/purchases: Buy a license.
async fn purchase(
    State(state): State<AppState>,
    body: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PurchaseResponse>), AppError> {
    let req = extract_json(body)?;
    let licensed = TokenRef::new(req.repository, req.token_id);
    let mut ledger = state.ledger.write();
    let license = ledger.purchase_license(req.buyer, licensed, req.payment)?;
    let provenance = ledger.referring_of(&license)?.to_vec();
    Ok((
        StatusCode::CREATED,
        Json(PurchaseResponse {
            license,
            licensed,
            provenance,
        }),
    ))
}
