use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::hash::sha256_hex_str;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Genesis,
    Text,
    File,
    Combined,
}

/// A single block of a chain. Everything except `is_valid` is fixed once mined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub chain_id: String,
    pub index: u64,
    pub previous_hash: String,
    pub hash: String, // empty until mined
    pub nonce: u64,
    pub timestamp: i64, // Unix epoch millis (UTC)
    pub block_type: BlockType,
    pub difficulty: u32,
    pub is_valid: bool,
    pub mined_by: Option<String>,
    pub mining_reward: Option<u64>,
}

impl Block {
    /// Create a new block (not mined yet). Hand it to the miner to seal it.
    pub fn new(chain_id: &str, index: u64, previous_hash: String, block_type: BlockType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            chain_id: chain_id.to_string(),
            index,
            previous_hash,
            hash: String::new(),
            nonce: 0,
            timestamp: Utc::now().timestamp_millis(),
            block_type,
            difficulty: 0,
            is_valid: true,
            mined_by: None,
            mining_reward: None,
        }
    }

    /// Hash preimage of this block for the given mining payload and nonce.
    pub fn preimage(&self, content: &str, nonce: u64) -> String {
        block_preimage(
            self.index,
            Some(self.previous_hash.as_str()),
            self.timestamp,
            content,
            nonce,
        )
    }

    /// Recompute the hash from the block's own fields and `content`.
    pub fn compute_hash(&self, content: &str) -> String {
        sha256_hex_str(&self.preimage(content, self.nonce))
    }

    /// Whether the stored hash carries the prefix of the difficulty it was stamped with.
    pub fn meets_own_difficulty(&self) -> bool {
        meets_difficulty(&self.hash, self.difficulty)
    }

    pub fn is_mined(&self) -> bool {
        !self.hash.is_empty()
    }
}

/// Exact string hashed for a block. The punctuation is part of the preimage.
pub fn block_preimage(
    index: u64,
    previous_hash: Option<&str>,
    timestamp: i64,
    content: &str,
    nonce: u64,
) -> String {
    format!(
        "{{id:{},hashPrevio:{},timeStamp:{},contenido:{},nonce:{}}}",
        index,
        previous_hash.unwrap_or("null"),
        timestamp,
        content,
        nonce
    )
}

/// Mining payload of a file block: the file hash, plus `:<comment>` if any.
pub fn file_payload(file_hash: &str, comment: Option<&str>) -> String {
    match comment {
        Some(c) => format!("{file_hash}:{c}"),
        None => file_hash.to_string(),
    }
}

/// True when the first `difficulty` characters of `hash` are all `'0'`.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let d = difficulty as usize;
    hash.len() >= d && hash.bytes().take(d).all(|b| b == b'0')
}
