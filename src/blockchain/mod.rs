pub mod block;
pub mod error;
pub mod model;
pub mod pow;

pub use block::{Block, Transaction};
pub use error::ChainError;
pub use model::{BlockReceipt, Blockchain, validate};
pub use pow::CancelFlag;

/// Default Proof-of-Work difficulty (leading zero hex chars).
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Sentinel previous-hash carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";
