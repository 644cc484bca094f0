use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::blockchain::{Block, Blockchain, CancelFlag, DEFAULT_DIFFICULTY, Transaction};

/// Shared application state: one in-memory ledger behind a mutex (the chain,
/// the pending queue and the peer set mutate as a single unit), the mining
/// abort flag, and a reusable HTTP client for peer queries.
pub struct AppState {
    pub ledger: Mutex<Blockchain>,
    pub mining_abort: CancelFlag,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(difficulty: u32) -> Self {
        Self {
            ledger: Mutex::new(Blockchain::new(difficulty)),
            mining_abort: CancelFlag::new(),
            http: reqwest::Client::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_DIFFICULTY)
    }
}

/* ---------- Chain API models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub length: usize,
    pub difficulty: u32,
    pub chain: &'a [Block],
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub message: String,
}

/* ---------- Transaction API models ---------- */

/// Option-typed on purpose: missing-field detection is this boundary's job,
/// the core never validates transaction fields.
#[derive(Deserialize)]
pub struct NewTxRequest {
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub amount: Option<u64>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct PendingResponse {
    pub size: usize,
    pub transactions: Vec<Transaction>,
}

/* ---------- Peer API models ---------- */

#[derive(Deserialize)]
pub struct ConnectPeersRequest {
    pub peers: Vec<String>,
}

#[derive(Serialize)]
pub struct PeersResponse {
    pub peers: Vec<String>,
}

#[derive(Serialize)]
pub struct ReconcileResponse {
    pub replaced: bool,
    pub length: usize,
    pub chain: Vec<Block>,
}
