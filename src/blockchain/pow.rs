use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::block::{Block, meets_difficulty};
use super::error::ChainError;

/// Cooperative cancellation signal for the proof-of-work search. Cloneable;
/// all clones share one flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask any in-flight search to stop at its next iteration.
    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Consume a pending request, e.g. before starting a fresh search.
    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Search nonce space until the block's canonical hash has at least
/// `difficulty` leading zero hex characters, starting from the candidate's
/// current nonce. Returns the winning hash; the winning nonce is left on the
/// block. The block's `hash` field is not touched — sealing is the ledger's
/// call to make.
///
/// Expected work grows with 16^difficulty and there is no iteration bound,
/// so `cancel` is checked on every iteration; a set flag aborts the search
/// with `MiningAborted` and leaves the candidate's nonce wherever the search
/// stopped. `difficulty == 0` succeeds immediately at the starting nonce.
pub fn mine(block: &mut Block, difficulty: u32, cancel: &CancelFlag) -> Result<String, ChainError> {
    loop {
        if cancel.is_requested() {
            return Err(ChainError::MiningAborted);
        }
        let hash = block.compute_hash();
        if meets_difficulty(&hash, difficulty) {
            return Ok(hash);
        }
        block.nonce = block.nonce.wrapping_add(1);
    }
}
