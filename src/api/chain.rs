use actix_web::{HttpResponse, Responder, get, post, web};
use log::warn;

use super::models::{AppState, ChainResponse, ValidateResponse};
use crate::blockchain::ChainError;

/// Get the full chain with its length and difficulty. This response doubles
/// as the `{length, chain}` report peers consume during reconciliation.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ChainResponse {
        length: ledger.len(),
        difficulty: ledger.difficulty,
        chain: &ledger.chain,
    })
}

/// Validate the whole chain. Never fails at the HTTP level; a broken chain
/// is reported in the body.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    let (valid, message) = match ledger.validate_chain() {
        Ok(()) => (true, "chain is valid".to_string()),
        Err(err) => (false, err.to_string()),
    };
    HttpResponse::Ok().json(ValidateResponse {
        valid,
        length: ledger.len(),
        message,
    })
}

/// Mine the pending queue into a new block.
///
/// The Proof-of-Work search is CPU-bound and unbounded, so it runs on the
/// blocking pool; the ledger lock is held for the duration so no other
/// mutation can race the append. A reconciliation arriving mid-search
/// requests an abort, which surfaces here as 409.
#[post("/mine/")]
pub async fn mine_block(state: web::Data<AppState>) -> impl Responder {
    let worker_state = state.clone();
    let result = web::block(move || {
        let mut ledger = worker_state.ledger.lock().expect("mutex poisoned");
        // consume any abort request left over from before this search
        worker_state.mining_abort.clear();
        ledger.mine(&worker_state.mining_abort)
    })
    .await;

    match result {
        Ok(Ok(receipt)) => HttpResponse::Ok().json(receipt),
        Ok(Err(err @ ChainError::MiningAborted)) => {
            warn!("mining aborted by a concurrent reconciliation");
            HttpResponse::Conflict().body(err.to_string())
        }
        Ok(Err(err)) => HttpResponse::Conflict().body(err.to_string()),
        Err(err) => {
            warn!("mining task failed to run: {err}");
            HttpResponse::InternalServerError().body("mining task failed to run")
        }
    }
}
