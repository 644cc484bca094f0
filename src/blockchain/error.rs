use thiserror::Error;

/// Failure shapes for ledger mutations and chain validation. Nothing here is
/// fatal; the HTTP layer turns each variant into a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The candidate's previous-hash pointer is stale or wrong.
    #[error("candidate's previous hash does not match the chain tip")]
    PreviousHashMismatch,

    /// The claimed or stored hash misses the difficulty target or does not
    /// match the canonical recomputation of the block's content.
    #[error("block {index} has an invalid hash")]
    InvalidHash { index: u64 },

    /// The validator found a chain discontinuity at `index`.
    #[error("chain linkage broken at block {index}")]
    BrokenLinkage { index: u64 },

    /// The proof-of-work search was cancelled before finding a valid nonce.
    #[error("mining was aborted before a valid nonce was found")]
    MiningAborted,
}
