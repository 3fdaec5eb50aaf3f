//! # Software API
//!
//! Mints software tokens. Dependencies are grouped by repository; each
//! group must name at least one token id.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use depledger_core::{AccountId, RepositoryId, TokenId};
use depledger_state::{DependencySpec, Metadata};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Largest accepted metadata blob, in bytes.
const MAX_METADATA_BYTES: usize = 64 * 1024;

/// Request to mint a software token.
#[derive(Debug, Deserialize)]
pub struct MintRequest {
    pub account: AccountId,
    /// The opaque metadata blob, stored verbatim.
    pub metadata: String,
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
}

impl Validate for MintRequest {
    fn validate(&self) -> Result<(), String> {
        if self.metadata.len() > MAX_METADATA_BYTES {
            return Err(format!(
                "metadata must not exceed {MAX_METADATA_BYTES} bytes"
            ));
        }
        Ok(())
    }
}

/// The minted token.
#[derive(Debug, Serialize, Deserialize)]
pub struct MintResponse {
    pub repository: RepositoryId,
    pub token_id: TokenId,
}

/// Build the software router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/software", post(mint))
}

/// POST /v1/software: Mint a software token.
async fn mint(
    State(state): State<AppState>,
    body: Result<Json<MintRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MintResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let dependencies = DependencySpec::flatten(&req.dependencies)?;
    let token = state.ledger.write().mint_software(
        req.account,
        Metadata::from(req.metadata),
        &dependencies,
    )?;
    Ok((
        StatusCode::CREATED,
        Json(MintResponse {
            repository: token.repository,
            token_id: token.token_id,
        }),
    ))
}
