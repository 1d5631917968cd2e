use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

use crate::blockchain::{
    Block, BlockType, ContentType, GENESIS_PREV_HASH, file_payload, meets_difficulty,
};
use crate::error::{LedgerError, Result};
use crate::storage::ChainStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockStatus {
    Valid,
    Invalid,
}

/// Linkage verdict for one block of a walked chain.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub block_index: u64,
    pub current_hash: String,
    pub previous_hash: String,
    pub expected_previous_hash: Option<String>,
    pub status: BlockStatus,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainValidation {
    pub is_valid: bool,
    pub message: String,
    pub details: Vec<ValidationDetail>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegritySummary {
    pub chain_id: String,
    pub integrity_percentage: u32,
    pub is_valid: bool,
    pub total_blocks: usize,
    pub valid_blocks: usize,
}

/// Walks persisted chains and reports on their linkage.
#[derive(Debug)]
pub struct Validator {
    store: Arc<dyn ChainStore>,
}

impl Validator {
    pub fn new(store: Arc<dyn ChainStore>) -> Self {
        Self { store }
    }

    pub fn validate_chain(&self, chain_id: &str) -> Result<ChainValidation> {
        if self.store.find_chain(chain_id)?.is_none() {
            return Err(LedgerError::NotFound(format!("chain not found: {chain_id}")));
        }
        let blocks = self.store.blocks_ordered(chain_id)?;
        if blocks.is_empty() {
            return Ok(ChainValidation {
                is_valid: false,
                message: "no blocks found in chain".into(),
                details: Vec::new(),
                timestamp: Utc::now().timestamp_millis(),
            });
        }

        let details: Vec<ValidationDetail> = blocks
            .iter()
            .enumerate()
            .map(|(i, block)| check_link(block, i.checked_sub(1).map(|p| &blocks[p])))
            .collect();
        let is_valid = details.iter().all(|d| d.status == BlockStatus::Valid);

        info!(
            "validated chain {chain_id}: {} block(s), valid={is_valid}",
            details.len()
        );
        Ok(ChainValidation {
            is_valid,
            message: if is_valid {
                "chain validated, integrity verified".into()
            } else {
                "inconsistencies found in chain".into()
            },
            details,
            timestamp: Utc::now().timestamp_millis(),
        })
    }

    /// Percentage of blocks whose linkage is valid (integer, 0 when empty).
    pub fn calculate_integrity(&self, chain_id: &str) -> Result<u32> {
        Ok(self.integrity_summary(chain_id)?.integrity_percentage)
    }

    pub fn integrity_summary(&self, chain_id: &str) -> Result<IntegritySummary> {
        let validation = self.validate_chain(chain_id)?;
        let total_blocks = validation.details.len();
        let valid_blocks = validation
            .details
            .iter()
            .filter(|d| d.status == BlockStatus::Valid)
            .count();
        let integrity_percentage = if total_blocks == 0 {
            0
        } else {
            (valid_blocks * 100 / total_blocks) as u32
        };
        Ok(IntegritySummary {
            chain_id: chain_id.to_string(),
            integrity_percentage,
            is_valid: validation.is_valid,
            total_blocks,
            valid_blocks,
        })
    }

    /// Structural check of one block: hash and timestamp present, stamped
    /// difficulty prefix, and linkage to the block just before it.
    ///
    /// The hash itself is not recomputed; see [`Validator::verify_block_content`].
    pub fn validate_single_block(&self, block_id: &str) -> Result<bool> {
        let block = self
            .store
            .block(block_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("block not found: {block_id}")))?;
        self.check_single(&block)
    }

    /// Recompute the block hash from its stored content records.
    pub fn verify_block_content(&self, block_id: &str) -> Result<bool> {
        let block = self
            .store
            .block(block_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("block not found: {block_id}")))?;
        if !block.is_mined() || !block.meets_own_difficulty() {
            return Ok(false);
        }

        let text = self.store.content(block_id, ContentType::Text)?;
        let file = self.store.content(block_id, ContentType::FileHash)?;
        let payload = match (block.block_type, text, file) {
            (BlockType::Genesis | BlockType::Text, Some(text), _) => text.content,
            (BlockType::File, _, Some(file)) => file.content,
            (BlockType::Combined, Some(text), Some(file)) => {
                file_payload(&file.content, Some(&text.content))
            }
            _ => {
                warn!("block {block_id} is missing content records");
                return Ok(false);
            }
        };

        let matches = block.compute_hash(&payload) == block.hash;
        if !matches {
            warn!("content of block {block_id} no longer matches its hash");
        }
        Ok(matches)
    }

    /// Overwrite stale validity flags; returns how many changed.
    pub fn repair(&self, chain_id: &str) -> Result<usize> {
        if self.store.find_chain(chain_id)?.is_none() {
            return Err(LedgerError::NotFound(format!("chain not found: {chain_id}")));
        }
        let mut repaired = 0;
        for block in self.store.blocks_ordered(chain_id)? {
            let should_be_valid = self.check_single(&block)?;
            if block.is_valid != should_be_valid {
                debug!(
                    "block #{} of chain {chain_id}: is_valid {} -> {}",
                    block.index, block.is_valid, should_be_valid
                );
                self.store.set_validity(&block.id, should_be_valid)?;
                repaired += 1;
            }
        }
        info!("repair of chain {chain_id} updated {repaired} block(s)");
        Ok(repaired)
    }

    fn check_single(&self, block: &Block) -> Result<bool> {
        if !block.is_mined() || block.timestamp <= 0 {
            return Ok(false);
        }
        if !meets_difficulty(&block.hash, block.difficulty) {
            return Ok(false);
        }
        if block.index == 0 {
            return Ok(block.previous_hash == GENESIS_PREV_HASH);
        }
        Ok(match self.store.block_at(&block.chain_id, block.index - 1)? {
            Some(prev) => prev.hash == block.previous_hash,
            None => false,
        })
    }
}

fn check_link(block: &Block, previous: Option<&Block>) -> ValidationDetail {
    let mut expected_previous_hash = None;
    let (status, message) = if block.index == 0 {
        if block.previous_hash == GENESIS_PREV_HASH {
            (BlockStatus::Valid, "valid genesis block")
        } else {
            (
                BlockStatus::Invalid,
                "genesis block must link to the zero sentinel",
            )
        }
    } else {
        match previous {
            Some(prev) => {
                expected_previous_hash = Some(prev.hash.clone());
                if block.previous_hash == prev.hash {
                    (BlockStatus::Valid, "hash links are correct")
                } else {
                    (BlockStatus::Invalid, "previous hash does not match")
                }
            }
            None => (BlockStatus::Invalid, "previous block not found"),
        }
    };

    ValidationDetail {
        block_index: block.index,
        current_hash: block.hash.clone(),
        previous_hash: block.previous_hash.clone(),
        expected_previous_hash,
        status,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{Chain, Difficulty};
    use crate::ledger::UserLedger;
    use crate::mining::{FlatReward, Miner};
    use crate::service::{ChainBuilder, FileUpload};
    use crate::storage::MemoryStore;

    struct Fixture {
        builder: ChainBuilder,
        validator: Validator,
        store: Arc<MemoryStore>,
        chain: Chain,
    }

    fn fixture(texts: &[&str]) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(UserLedger::new());
        let miner = Miner::new(
            Arc::new(Difficulty::new(1).unwrap()),
            ledger.clone(),
            Box::new(FlatReward { points: 1 }),
            None,
        );
        let builder = ChainBuilder::new(store.clone(), ledger, miner);
        let chain = builder.create_chain("test", "").unwrap();
        for text in texts {
            builder.append_text(&chain.id, text, None).unwrap();
        }
        Fixture {
            builder,
            validator: Validator::new(store.clone()),
            store,
            chain,
        }
    }

    #[test]
    fn untouched_chain_is_fully_valid() {
        let f = fixture(&["a", "b", "c", "d"]);
        let v = f.validator.validate_chain(&f.chain.id).unwrap();
        assert!(v.is_valid);
        assert_eq!(v.details.len(), 5);
        assert!(v.details.iter().all(|d| d.status == BlockStatus::Valid));
        assert!(v.details[0].expected_previous_hash.is_none());
        assert_eq!(f.validator.calculate_integrity(&f.chain.id).unwrap(), 100);
    }

    #[test]
    fn tampered_link_flags_only_that_block() {
        let f = fixture(&["a", "b", "c", "d"]);
        let mut victim = f.store.block_at(&f.chain.id, 2).unwrap().unwrap();
        victim.previous_hash = "f".repeat(64);
        f.store.save_block(victim).unwrap();

        let v = f.validator.validate_chain(&f.chain.id).unwrap();
        assert!(!v.is_valid);
        let invalid: Vec<u64> = v
            .details
            .iter()
            .filter(|d| d.status == BlockStatus::Invalid)
            .map(|d| d.block_index)
            .collect();
        assert_eq!(invalid, vec![2]);

        let summary = f.validator.integrity_summary(&f.chain.id).unwrap();
        assert_eq!(summary.total_blocks, 5);
        assert_eq!(summary.valid_blocks, 4);
        assert_eq!(summary.integrity_percentage, 100 * 4 / 5);
    }

    #[test]
    fn empty_chain_is_not_valid() {
        let store = Arc::new(MemoryStore::new());
        let chain = store.insert_chain(Chain::new("empty", "")).unwrap();
        let validator = Validator::new(store);
        let v = validator.validate_chain(&chain.id).unwrap();
        assert!(!v.is_valid);
        assert!(v.details.is_empty());
        assert_eq!(validator.calculate_integrity(&chain.id).unwrap(), 0);
        assert!(validator.validate_chain("missing").is_err());
    }

    #[test]
    fn hello_on_a_bare_chain_takes_index_zero() {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(UserLedger::new());
        let miner = Miner::new(
            Arc::new(Difficulty::new(2).unwrap()),
            ledger.clone(),
            Box::new(FlatReward { points: 1 }),
            None,
        );
        let builder = ChainBuilder::new(store.clone(), ledger, miner);
        let chain = store.insert_chain(Chain::new("bare", "")).unwrap();

        let block = builder.append_text(&chain.id, "hello", None).unwrap().block;
        assert_eq!(block.index, 0);
        assert_eq!(block.previous_hash, GENESIS_PREV_HASH);
        assert!(block.hash.starts_with("00"));
        assert_eq!(builder.block_content(&block.id).unwrap(), "hello");

        let v = Validator::new(store).validate_chain(&chain.id).unwrap();
        assert!(v.is_valid);
        assert_eq!(v.details.len(), 1);
        assert_eq!(v.details[0].status, BlockStatus::Valid);
    }

    #[test]
    fn genesis_passes_single_block_check() {
        let f = fixture(&[]);
        let genesis = f.store.block_at(&f.chain.id, 0).unwrap().unwrap();
        assert!(f.validator.validate_single_block(&genesis.id).unwrap());

        let mut broken = genesis.clone();
        broken.previous_hash = "null".into();
        f.store.save_block(broken).unwrap();
        assert!(!f.validator.validate_single_block(&genesis.id).unwrap());
    }

    #[test]
    fn single_block_check_needs_prefix_and_link() {
        let f = fixture(&["a", "b"]);
        let mut block = f.store.block_at(&f.chain.id, 2).unwrap().unwrap();
        assert!(f.validator.validate_single_block(&block.id).unwrap());

        block.hash = format!("f{}", &block.hash[1..]);
        f.store.save_block(block.clone()).unwrap();
        assert!(!f.validator.validate_single_block(&block.id).unwrap());
        assert!(matches!(
            f.validator.validate_single_block("missing"),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn repair_is_idempotent() {
        let f = fixture(&["a", "b", "c"]);
        let mut victim = f.store.block_at(&f.chain.id, 1).unwrap().unwrap();
        victim.previous_hash = "0".repeat(64);
        f.store.save_block(victim.clone()).unwrap();

        assert_eq!(f.validator.repair(&f.chain.id).unwrap(), 1);
        assert!(!f.store.block(&victim.id).unwrap().unwrap().is_valid);
        assert_eq!(f.validator.repair(&f.chain.id).unwrap(), 0);
    }

    #[test]
    fn content_verification_catches_edited_records() {
        let f = fixture(&["hello"]);
        let block = f.store.block_at(&f.chain.id, 1).unwrap().unwrap();
        assert!(f.validator.verify_block_content(&block.id).unwrap());

        let genesis = f.store.block_at(&f.chain.id, 0).unwrap().unwrap();
        assert!(f.validator.verify_block_content(&genesis.id).unwrap());

        // Copied hash and nonce on a different index: recomputation disagrees.
        let mut forged = Block::new(&f.chain.id, 9, block.hash.clone(), BlockType::Text);
        forged.hash = block.hash.clone();
        forged.nonce = block.nonce;
        forged.difficulty = block.difficulty;
        f.store
            .commit_block(
                forged.clone(),
                vec![crate::blockchain::BlockContent::text(&forged.id, "hello")],
            )
            .unwrap();
        assert!(!f.validator.verify_block_content(&forged.id).unwrap());
    }

    #[test]
    fn combined_block_content_verifies() {
        let f = fixture(&[]);
        let upload = FileUpload::new("n.txt", "text/plain", b"data".to_vec());
        let appended = f
            .builder
            .append_file(&f.chain.id, &upload, Some("note"), None)
            .unwrap();
        assert!(f.validator.verify_block_content(&appended.block.id).unwrap());
        assert!(f.validator.validate_chain(&f.chain.id).unwrap().is_valid);
    }
}
