use chrono::Utc;
use serde::Serialize;

use crate::blockchain::Block;

/// Summary numbers for one chain, computed from its stored blocks.
#[derive(Debug, Clone, Serialize)]
pub struct ChainStats {
    pub chain_id: String,
    pub total_blocks: usize,
    /// Every block after genesis carries one submission.
    pub total_transactions: usize,
    pub oldest_time: i64,
    pub newest_time: i64,
    /// Mean seconds between blocks over the whole chain.
    pub average_block_time: f64,
    /// Share of blocks whose stored validity flag is set (not re-walked).
    pub chain_integrity: u32,
    pub timestamp: i64,
}

impl ChainStats {
    pub fn from_blocks(chain_id: &str, blocks: &[Block]) -> Self {
        let total_blocks = blocks.len();
        let oldest_time = blocks.iter().map(|b| b.timestamp).min().unwrap_or(0);
        let newest_time = blocks.iter().map(|b| b.timestamp).max().unwrap_or(0);

        let average_block_time = if total_blocks > 1 {
            (newest_time - oldest_time) as f64 / (total_blocks - 1) as f64 / 1000.0
        } else {
            0.0
        };
        let chain_integrity = if total_blocks == 0 {
            0
        } else {
            let valid = blocks.iter().filter(|b| b.is_valid).count();
            (valid * 100 / total_blocks) as u32
        };

        Self {
            chain_id: chain_id.to_string(),
            total_blocks,
            total_transactions: total_blocks.saturating_sub(1),
            oldest_time,
            newest_time,
            average_block_time,
            chain_integrity,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}
