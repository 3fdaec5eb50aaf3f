//! # Developer API
//!
//! Onboards developers and reports their repository.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use depledger_core::{AccountId, RepositoryId};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::{extract_json, extract_path};
use crate::state::AppState;

/// Request to register a developer.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub account: AccountId,
}

/// A developer and their repository.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeveloperView {
    pub account: AccountId,
    pub is_developer: bool,
    pub repository: Option<RepositoryId>,
}

/// Build the developers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/developers", post(register).get(list))
        .route("/v1/developers/{account}", get(lookup))
}

/// POST /v1/developers: Provision a repository for an account.
async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DeveloperView>), AppError> {
    let req = extract_json(body)?;
    let repository = state.ledger.write().register_developer(req.account)?;
    Ok((
        StatusCode::CREATED,
        Json(DeveloperView {
            account: req.account,
            is_developer: true,
            repository: Some(repository),
        }),
    ))
}

/// GET /v1/developers: All developers in registration order.
async fn list(State(state): State<AppState>) -> Json<Vec<DeveloperView>> {
    let developers = state
        .ledger
        .read()
        .developers()
        .into_iter()
        .map(|(account, repository)| DeveloperView {
            account,
            is_developer: true,
            repository: Some(repository),
        })
        .collect();
    Json(developers)
}

/// GET /v1/developers/{account}: Registration status of an account.
async fn lookup(
    State(state): State<AppState>,
    path: Result<Path<AccountId>, PathRejection>,
) -> Result<Json<DeveloperView>, AppError> {
    let account = extract_path(path)?;
    let repository = state.ledger.read().repository_of(&account);
    Ok(Json(DeveloperView {
        account,
        is_developer: repository.is_some(),
        repository,
    }))
}
