//! Longest-valid-chain adoption across peers.
//!
//! Peers report `{length, chain}`; the longest strictly-longer candidate
//! that passes the chain validator replaces the local chain wholesale.
//! Peer fetches are failure-isolated: one unreachable peer never aborts the
//! scan of the others.

use log::warn;
use serde::Deserialize;
use thiserror::Error;

use crate::blockchain::{Block, Blockchain, validate};

/// A peer's view of its chain, as served by `GET /api/v1/chain/`. Extra
/// response fields (e.g. the peer's difficulty) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PeerReport {
    pub length: usize,
    pub chain: Vec<Block>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A longer valid peer chain was adopted.
    Replaced,
    /// No peer offered a strictly longer valid chain; a normal outcome,
    /// not an error.
    KeptLocal,
}

impl ReconcileOutcome {
    pub fn replaced(&self) -> bool {
        matches!(self, Self::Replaced)
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// The peer query failed or timed out. Skipped per peer, never fatal.
    #[error("peer {peer} unreachable: {source}")]
    PeerUnreachable {
        peer: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Scan peer reports and adopt the longest strictly-longer chain.
///
/// Gating: the local chain must currently validate (a ledger that cannot
/// trust itself does not adopt), and each candidate chain must itself pass
/// the validator at the local difficulty before it is considered. The
/// longest surviving candidate wins; adoption replaces the chain wholesale
/// and leaves the pending queue and peer set alone.
pub fn adopt_longest(ledger: &mut Blockchain, reports: Vec<PeerReport>) -> ReconcileOutcome {
    let local_is_valid = ledger.validate_chain().is_ok();
    let mut max_length = ledger.len();
    let mut best: Option<Vec<Block>> = None;

    for report in reports {
        if !local_is_valid || report.length <= max_length || report.chain.is_empty() {
            continue;
        }
        if let Err(err) = validate(&report.chain, ledger.difficulty) {
            warn!(
                "rejecting candidate chain of reported length {}: {}",
                report.length, err
            );
            continue;
        }
        max_length = report.length;
        best = Some(report.chain);
    }

    match best {
        Some(chain) => {
            ledger.replace_chain(chain);
            ReconcileOutcome::Replaced
        }
        None => ReconcileOutcome::KeptLocal,
    }
}

/// Ask one peer for its chain report.
pub async fn fetch_report(
    client: &reqwest::Client,
    peer: &str,
) -> Result<PeerReport, SyncError> {
    let url = format!("http://{peer}/api/v1/chain/");
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| unreachable(peer, e))?
        .error_for_status()
        .map_err(|e| unreachable(peer, e))?;
    response
        .json::<PeerReport>()
        .await
        .map_err(|e| unreachable(peer, e))
}

fn unreachable(peer: &str, source: reqwest::Error) -> SyncError {
    SyncError::PeerUnreachable {
        peer: peer.to_string(),
        source,
    }
}
