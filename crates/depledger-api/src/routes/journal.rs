//! # Journal API
//!
//! Exposes the hash-chained receipts and re-verifies the chain on every
//! request.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use depledger_core::ContentDigest;
use depledger_state::Receipt;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// The full journal.
#[derive(Debug, Serialize, Deserialize)]
pub struct JournalView {
    pub length: usize,
    pub head: ContentDigest,
    pub verified: bool,
    pub receipts: Vec<Receipt>,
}

/// Build the journal router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/journal", get(journal))
}

/// GET /v1/journal: Receipts, head digest and verification status.
async fn journal(State(state): State<AppState>) -> Json<JournalView> {
    let ledger = state.ledger.read();
    let journal = ledger.journal();
    Json(JournalView {
        length: journal.len(),
        head: journal.head(),
        verified: journal.verify().is_ok(),
        receipts: journal.receipts().to_vec(),
    })
}
