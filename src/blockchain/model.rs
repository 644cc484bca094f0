use std::collections::HashSet;

use log::{debug, info};
use serde::Serialize;

use super::block::{Block, Transaction, meets_difficulty};
use super::error::ChainError;
use super::pow::{self, CancelFlag};
use super::GENESIS_PREVIOUS_HASH;

/// What an accepted block looked like: index, seal and the transactions that
/// made it in. Returned by `add_block` and `mine` so the caller can report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockReceipt {
    pub index: u64,
    pub hash: String,
    pub nonce: u64,
    pub transactions: Vec<Transaction>,
}

/// In-memory single-ledger blockchain with Proof-of-Work.
///
/// The chain, the pending-transaction queue and the peer set form a single
/// unit of mutation; callers serialize access through one lock (see
/// `api::AppState`).
#[derive(Debug)]
pub struct Blockchain {
    pub chain: Vec<Block>,
    pub pending_transactions: Vec<Transaction>,
    pub difficulty: u32,
    pub peers: HashSet<String>,
}

impl Blockchain {
    /// Initialize a ledger with a mined genesis block.
    ///
    /// Genesis carries the `"0"` sentinel previous-hash and never goes
    /// through the normal acceptance path, but it is still mined so that
    /// every block on the chain meets the difficulty target.
    pub fn new(difficulty: u32) -> Self {
        let mut genesis = Block::new(0, GENESIS_PREVIOUS_HASH.to_string(), Vec::new());
        let hash = pow::mine(&mut genesis, difficulty, &CancelFlag::new())
            .expect("genesis mining cannot be cancelled");
        genesis.hash = hash;
        Self {
            chain: vec![genesis],
            pending_transactions: Vec::new(),
            difficulty,
            peers: HashSet::new(),
        }
    }

    /// Return the chain tip.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("chain always holds at least the genesis block")
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Queue a transaction for inclusion in the next mined block. Field
    /// validation belongs to the boundary layer; this always succeeds.
    pub fn add_transaction(&mut self, tx: Transaction) {
        self.pending_transactions.push(tx);
    }

    /// Register a peer location (`host:port`). Set semantics; duplicates
    /// collapse.
    pub fn add_peer(&mut self, identifier: String) {
        self.peers.insert(identifier);
    }

    /// Verify a candidate against the tip and the difficulty target, then
    /// seal and append it. A rejected candidate leaves the chain untouched.
    pub fn add_block(
        &mut self,
        mut candidate: Block,
        claimed_hash: String,
    ) -> Result<BlockReceipt, ChainError> {
        let tip = self.last_block();
        if candidate.previous_hash != tip.hash {
            return Err(ChainError::PreviousHashMismatch);
        }
        if !meets_difficulty(&claimed_hash, self.difficulty)
            || claimed_hash != candidate.compute_hash()
        {
            return Err(ChainError::InvalidHash {
                index: candidate.index,
            });
        }

        candidate.hash = claimed_hash;
        let receipt = BlockReceipt {
            index: candidate.index,
            hash: candidate.hash.clone(),
            nonce: candidate.nonce,
            transactions: candidate.transactions.clone(),
        };
        info!(
            "sealed block #{} (hash={}, nonce={}, txs={})",
            receipt.index,
            receipt.hash,
            receipt.nonce,
            receipt.transactions.len()
        );
        self.chain.push(candidate);
        Ok(receipt)
    }

    /// Build a candidate from the tip and a snapshot of the pending queue,
    /// run the Proof-of-Work search, and try to append the result.
    ///
    /// The candidate owns a copy of the queue, never an alias, so a sealed
    /// block's transaction list is independent of later queue mutation. The
    /// queue is dropped on acceptance and on rejection alike (base ledger
    /// semantics); a cancelled search returns `MiningAborted` and preserves
    /// the queue.
    pub fn mine(&mut self, cancel: &CancelFlag) -> Result<BlockReceipt, ChainError> {
        let tip = self.last_block();
        let mut candidate = Block::new(
            tip.index + 1,
            tip.hash.clone(),
            self.pending_transactions.clone(),
        );
        debug!(
            "mining candidate #{} with {} pending txs at difficulty {}",
            candidate.index,
            candidate.transactions.len(),
            self.difficulty
        );
        let hash = pow::mine(&mut candidate, self.difficulty, cancel)?;
        let result = self.add_block(candidate, hash);
        self.pending_transactions.clear();
        result
    }

    /// Validate the ledger's own chain.
    pub fn validate_chain(&self) -> Result<(), ChainError> {
        validate(&self.chain, self.difficulty)
    }

    /// Replace the chain wholesale (longest-valid-chain adoption). The
    /// pending queue and peer set are left alone.
    pub fn replace_chain(&mut self, chain: Vec<Block>) {
        info!("chain replaced: {} -> {} blocks", self.chain.len(), chain.len());
        self.chain = chain;
    }
}

/// Walk a chain verifying linkage and proof-of-work end to end.
///
/// Genesis is trusted axiomatically; from block 1 on, each block's
/// `previous_hash` must equal the canonical recomputation of its
/// predecessor, and its stored hash must meet the difficulty target and
/// match its own recomputation. Read-only; also used by chain sync to vet
/// candidate chains from peers.
pub fn validate(chain: &[Block], difficulty: u32) -> Result<(), ChainError> {
    for i in 1..chain.len() {
        let block = &chain[i];
        let prev = &chain[i - 1];
        if block.previous_hash != prev.compute_hash() {
            return Err(ChainError::BrokenLinkage { index: block.index });
        }
        if !meets_difficulty(&block.hash, difficulty) || block.hash != block.compute_hash() {
            return Err(ChainError::InvalidHash { index: block.index });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Blockchain, validate};
    use crate::blockchain::block::{Block, Transaction};
    use crate::blockchain::error::ChainError;
    use crate::blockchain::pow::CancelFlag;

    fn tx(sender: &str, receiver: &str, amount: u64) -> Transaction {
        Transaction {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
        }
    }

    #[test]
    fn genesis_invariant() {
        let bc = Blockchain::new(2);
        assert_eq!(bc.len(), 1);
        let genesis = &bc.chain[0];
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_hash, "0");
        assert!(genesis.hash.starts_with("00"));
        assert_eq!(genesis.hash, genesis.compute_hash());
    }

    #[test]
    fn queue_is_fifo_and_cleared_by_mine() {
        let mut bc = Blockchain::new(1);
        let t1 = tx("alice", "bob", 10);
        let t2 = tx("bob", "carol", 5);
        bc.add_transaction(t1.clone());
        bc.add_transaction(t2.clone());

        let receipt = bc.mine(&CancelFlag::new()).unwrap();
        assert_eq!(receipt.transactions, vec![t1.clone(), t2.clone()]);
        assert!(bc.pending_transactions.is_empty());
        assert_eq!(bc.last_block().transactions, vec![t1, t2]);
    }

    #[test]
    fn mined_block_owns_a_snapshot_of_the_queue() {
        let mut bc = Blockchain::new(1);
        bc.add_transaction(tx("alice", "bob", 10));
        bc.mine(&CancelFlag::new()).unwrap();

        // later queue activity must not leak into the sealed block
        bc.add_transaction(tx("mallory", "eve", 99));
        assert_eq!(bc.chain[1].transactions.len(), 1);
    }

    #[test]
    fn stale_previous_hash_is_rejected_without_mutation() {
        let mut bc = Blockchain::new(1);
        let candidate = Block::new(1, "not-the-tip".into(), Vec::new());
        let claimed = candidate.compute_hash();
        let err = bc.add_block(candidate, claimed).unwrap_err();
        assert_eq!(err, ChainError::PreviousHashMismatch);
        assert_eq!(bc.len(), 1);
    }

    #[test]
    fn wrong_claimed_hash_is_rejected() {
        let mut bc = Blockchain::new(0);
        let candidate = Block::new(1, bc.last_block().hash.clone(), Vec::new());
        let err = bc
            .add_block(candidate, "definitely-not-the-hash".into())
            .unwrap_err();
        assert_eq!(err, ChainError::InvalidHash { index: 1 });
        assert_eq!(bc.len(), 1);
    }

    #[test]
    fn claimed_hash_below_difficulty_is_rejected() {
        let mut bc = Blockchain::new(4);
        let candidate = Block::new(1, bc.last_block().hash.clone(), Vec::new());
        // correct recomputation, but (almost surely) short of four zeros
        let claimed = candidate.compute_hash();
        if !claimed.starts_with("0000") {
            let err = bc.add_block(candidate, claimed).unwrap_err();
            assert_eq!(err, ChainError::InvalidHash { index: 1 });
        }
    }

    #[test]
    fn aborted_mining_preserves_the_queue() {
        let mut bc = Blockchain::new(8);
        bc.add_transaction(tx("alice", "bob", 10));
        let cancel = CancelFlag::new();
        cancel.request();
        let err = bc.mine(&cancel).unwrap_err();
        assert_eq!(err, ChainError::MiningAborted);
        assert_eq!(bc.pending_transactions.len(), 1);
        assert_eq!(bc.len(), 1);
    }

    #[test]
    fn tamper_detection_starts_at_the_mutated_block() {
        let mut bc = Blockchain::new(1);
        bc.add_transaction(tx("alice", "bob", 10));
        bc.mine(&CancelFlag::new()).unwrap();
        bc.add_transaction(tx("bob", "carol", 5));
        bc.mine(&CancelFlag::new()).unwrap();
        assert_eq!(bc.len(), 3);
        assert!(bc.validate_chain().is_ok());

        bc.chain[1].transactions[0].amount = 1_000_000;
        let err = bc.validate_chain().unwrap_err();
        // block 1 is flagged, not block 2's (now also broken) linkage
        assert_eq!(err, ChainError::InvalidHash { index: 1 });
    }

    #[test]
    fn validator_flags_broken_linkage() {
        let mut bc = Blockchain::new(1);
        bc.mine(&CancelFlag::new()).unwrap();
        bc.chain[1].previous_hash = "severed".into();
        let err = bc.validate_chain().unwrap_err();
        assert_eq!(err, ChainError::BrokenLinkage { index: 1 });
    }

    #[test]
    fn validator_accepts_single_block_chain() {
        let bc = Blockchain::new(3);
        assert!(validate(&bc.chain, 3).is_ok());
    }

    #[test]
    fn peers_deduplicate() {
        let mut bc = Blockchain::new(0);
        bc.add_peer("127.0.0.1:5000".into());
        bc.add_peer("127.0.0.1:5000".into());
        bc.add_peer("127.0.0.1:5001".into());
        assert_eq!(bc.peers.len(), 2);
    }

    #[test]
    fn difficulty_two_end_to_end() {
        let mut bc = Blockchain::new(2);
        let mut candidate = Block::new(1, bc.last_block().hash.clone(), Vec::new());
        let hash = crate::blockchain::pow::mine(&mut candidate, 2, &CancelFlag::new()).unwrap();
        assert!(hash.starts_with("00"));
        bc.add_block(candidate, hash).unwrap();
        assert_eq!(bc.len(), 2);
        assert!(bc.validate_chain().is_ok());
    }
}
