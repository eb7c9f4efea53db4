//! Replay suppression by sequence number.
//!
//! The gateway retries deliveries it believes were lost, so the same `sn`
//! can arrive more than once. A sequence number seen within the window is
//! dropped; one last seen longer ago is admitted again.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

/// Replay window in milliseconds (10 minutes).
pub const DEDUP_WINDOW_MS: u64 = 600_000;

/// Tracks the last admission time of each sequence number.
///
/// Entries are never evicted. A stale entry is simply overwritten the next
/// time its sequence number is admitted.
#[derive(Debug)]
pub struct DuplicateSuppressor {
    window_ms: u64,
    ledger: Mutex<HashMap<u64, u64>>,
}

impl Default for DuplicateSuppressor {
    fn default() -> Self {
        Self::new(DEDUP_WINDOW_MS)
    }
}

impl DuplicateSuppressor {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            ledger: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` if `sn` is new (record it), `false` if it is a replay.
    ///
    /// A replay is a sequence number admitted less than the window ago. A
    /// timestamp from the future (clock step back) counts as zero elapsed.
    pub fn admit(&self, sn: u64, now_ms: u64) -> bool {
        let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(&prior_ms) = ledger.get(&sn) {
            let elapsed_ms = now_ms.saturating_sub(prior_ms);
            if elapsed_ms < self.window_ms {
                debug!(sn = sn, elapsed_ms = elapsed_ms, "khl_sn_replay");
                return false;
            }
        }

        ledger.insert(sn, now_ms);
        true
    }

    /// Number of sequence numbers ever admitted.
    pub fn ledger_size(&self) -> usize {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
