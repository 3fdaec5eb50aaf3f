//! # Account API
//!
//! Native-currency deposits and account summaries. Amounts are base-unit
//! strings; summaries also carry the decimal rendering.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use depledger_core::{AccountId, Amount};
use depledger_state::{Ledger, LicenseHolding};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::{extract_json, extract_path};
use crate::state::AppState;

/// Request to credit an account.
#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub amount: Amount,
}

/// Balance and licenses of an account.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountView {
    pub account: AccountId,
    pub balance: Amount,
    /// `balance` as a decimal amount of whole units.
    pub balance_decimal: String,
    pub licenses: Vec<LicenseHolding>,
}

/// Build the accounts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/accounts/{account}", get(summary))
        .route("/v1/accounts/{account}/deposit", post(deposit))
}

fn view(ledger: &Ledger, account: AccountId, balance: Amount) -> AccountView {
    AccountView {
        account,
        balance,
        balance_decimal: balance.format_decimal(),
        licenses: ledger.licenses_of(&account).to_vec(),
    }
}

/// POST /v1/accounts/{account}/deposit: Credit native currency.
async fn deposit(
    State(state): State<AppState>,
    path: Result<Path<AccountId>, PathRejection>,
    body: Result<Json<DepositRequest>, JsonRejection>,
) -> Result<Json<AccountView>, AppError> {
    let account = extract_path(path)?;
    let req = extract_json(body)?;
    let mut ledger = state.ledger.write();
    let balance = ledger.deposit(account, req.amount)?;
    Ok(Json(view(&ledger, account, balance)))
}

/// GET /v1/accounts/{account}: Balance and held licenses.
async fn summary(
    State(state): State<AppState>,
    path: Result<Path<AccountId>, PathRejection>,
) -> Result<Json<AccountView>, AppError> {
    let account = extract_path(path)?;
    let ledger = state.ledger.read();
    Ok(Json(view(&ledger, account, ledger.balance_of(&account))))
}
