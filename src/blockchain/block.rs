use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

/// A transfer record queued by a caller and committed into a block.
/// Fields are taken at face value; signature checks are out of scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub amount: u64,
}

/// A single block in the chain holding a list of transactions.
///
/// `hash` is the empty string until the block is sealed: genesis is sealed
/// at construction, every later block on acceptance by the ledger. A sealed
/// block is never mutated; a rejected candidate is simply dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: i64, // Unix timestamp (UTC), informational only
    pub previous_hash: String,
    pub transactions: Vec<Transaction>,
    pub nonce: u64, // Proof-of-Work nonce
    pub hash: String,
}

impl Block {
    /// Create an unsealed candidate block. Run PoW and `Blockchain::add_block`
    /// to seal it.
    pub fn new(index: u64, previous_hash: String, transactions: Vec<Transaction>) -> Self {
        Self {
            index,
            timestamp: Utc::now().timestamp(),
            previous_hash,
            transactions,
            nonce: 0,
            hash: String::new(),
        }
    }

    /// Compute the SHA-256 hash of this block's content.
    ///
    /// The preimage is built from an explicit enumeration of the content
    /// fields — `hash` is excluded by construction, not by filtering — and
    /// serialized as JSON with keys in sorted order, so two blocks with the
    /// same logical content always hash identically.
    pub fn compute_hash(&self) -> String {
        // serde_json's default map is ordered by key, which pins the
        // canonical field order regardless of how the literal is written.
        let content = json!({
            "index": self.index,
            "timestamp": self.timestamp,
            "previous_hash": self.previous_hash,
            "transactions": self.transactions,
            "nonce": self.nonce,
        });
        let payload = serde_json::to_vec(&content).expect("serialize block content");
        hex::encode(Sha256::digest(&payload))
    }
}

/// True when `hash` carries at least `difficulty` leading zero hex chars.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let d = difficulty as usize;
    hash.len() >= d && hash.bytes().take(d).all(|b| b == b'0')
}
