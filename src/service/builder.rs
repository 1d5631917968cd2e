use log::{info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::upload::{FileUpload, MAX_FILE_BYTES};
use crate::blockchain::{
    Block, BlockContent, BlockType, Chain, ContentType, DEFAULT_CHAIN_DESCRIPTION,
    DEFAULT_CHAIN_NAME, GENESIS_DATA, GENESIS_PREV_HASH, file_payload, sha256_hex,
};
use crate::error::{LedgerError, Result};
use crate::ledger::RewardLedger;
use crate::mining::{Miner, MiningReport};
use crate::storage::ChainStore;

/// Points credited for an upload on top of the mining reward.
const FILE_UPLOAD_POINTS: u64 = 1;
const COMMENT_UPLOAD_POINTS: u64 = 1;

/// A freshly persisted block and what it took to mine it.
#[derive(Debug, Clone)]
pub struct Appended {
    pub block: Block,
    pub report: MiningReport,
    /// Extra points credited for an upload, if any were paid.
    pub upload_points: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainTip {
    pub chain_id: String,
    pub last_hash: String,
    pub next_index: u64,
}

/// Appends blocks to chains.
///
/// "read tip, allocate index, mine, persist" runs under a per-chain lock, so
/// two appends to the same chain never see the same tip. Appends to
/// different chains proceed in parallel.
#[derive(Debug)]
pub struct ChainBuilder {
    store: Arc<dyn ChainStore>,
    ledger: Arc<dyn RewardLedger>,
    miner: Miner,
    upload_limit: usize,
    chain_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    default_chain_lock: Mutex<()>,
}

impl ChainBuilder {
    pub fn new(store: Arc<dyn ChainStore>, ledger: Arc<dyn RewardLedger>, miner: Miner) -> Self {
        Self {
            store,
            ledger,
            miner,
            upload_limit: MAX_FILE_BYTES,
            chain_locks: Mutex::new(HashMap::new()),
            default_chain_lock: Mutex::new(()),
        }
    }

    pub fn with_upload_limit(mut self, max_bytes: usize) -> Self {
        self.upload_limit = max_bytes;
        self
    }

    pub fn miner(&self) -> &Miner {
        &self.miner
    }

    /// Create a chain and mint its genesis block.
    ///
    /// Genesis is mined before the chain exists in the store; chain and
    /// genesis are then published in one step, so a failed search leaves
    /// nothing behind.
    pub fn create_chain(&self, name: &str, description: &str) -> Result<Chain> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation("chain name must not be empty".into()));
        }
        let chain = Chain::new(name, description.trim());
        let mut genesis = Block::new(
            &chain.id,
            0,
            GENESIS_PREV_HASH.to_string(),
            BlockType::Genesis,
        );
        self.miner.mine_block(&mut genesis, GENESIS_DATA, None)?;
        let records = vec![BlockContent::text(&genesis.id, GENESIS_DATA)];

        let chain = self
            .store
            .insert_chain_with_genesis(chain, genesis, records)?;
        info!("created chain {} ({}) with genesis", chain.id, chain.name);
        Ok(chain)
    }

    pub fn chain(&self, chain_id: &str) -> Result<Chain> {
        self.store
            .find_chain(chain_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("chain not found: {chain_id}")))
    }

    pub fn active_chains(&self) -> Result<Vec<Chain>> {
        self.store.active_chains()
    }

    /// Block content records, in insertion order.
    pub fn content_records(&self, block_id: &str) -> Result<Vec<BlockContent>> {
        self.block(block_id)?;
        self.store.contents(block_id)
    }

    /// First active chain; created on demand if there is none.
    pub fn default_chain(&self) -> Result<Chain> {
        let _guard = self
            .default_chain_lock
            .lock()
            .map_err(|_| LedgerError::Storage("default chain lock poisoned".into()))?;
        if let Some(chain) = self.store.active_chains()?.into_iter().next() {
            return Ok(chain);
        }
        self.create_chain(DEFAULT_CHAIN_NAME, DEFAULT_CHAIN_DESCRIPTION)
    }

    /// Like [`ChainBuilder::resolve_chain`] but never creates anything: with no
    /// id and no active chain this is `NotFound`.
    pub fn lookup_chain(&self, chain_id: Option<&str>) -> Result<Chain> {
        match chain_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => self.chain(id),
            None => self
                .store
                .active_chains()?
                .into_iter()
                .next()
                .ok_or_else(|| LedgerError::NotFound("no active chain".into())),
        }
    }

    /// The requested chain, or the default one when no id is given.
    pub fn resolve_chain(&self, chain_id: Option<&str>) -> Result<Chain> {
        match chain_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => self.chain(id),
            None => self.default_chain(),
        }
    }

    /// Mint index 0 on an existing, still empty chain. Nobody is rewarded.
    pub fn create_genesis(&self, chain_id: &str) -> Result<Block> {
        self.chain(chain_id)?;
        if self.store.next_index(chain_id)? != 0 {
            return Err(LedgerError::Validation(format!(
                "chain {chain_id} already has a genesis block"
            )));
        }
        info!("creating genesis block for chain {chain_id}");
        let appended = self.mint(
            chain_id,
            BlockType::Genesis,
            GENESIS_DATA,
            None,
            |block_id| vec![BlockContent::text(block_id, GENESIS_DATA)],
        )?;
        Ok(appended.block)
    }

    pub fn append_text(
        &self,
        chain_id: &str,
        content: &str,
        user_id: Option<&str>,
    ) -> Result<Appended> {
        if content.trim().is_empty() {
            return Err(LedgerError::Validation(
                "block content must not be empty".into(),
            ));
        }
        self.chain(chain_id)?;
        info!("appending text block to chain {chain_id} (user: {user_id:?})");
        let appended = self.mint(chain_id, BlockType::Text, content, user_id, |block_id| {
            vec![BlockContent::text(block_id, content)]
        })?;
        info!(
            "text block created: index {}, hash {}",
            appended.block.index, appended.block.hash
        );
        Ok(appended)
    }

    /// File hash is SHA-256 over the raw bytes. A non-blank comment turns the
    /// block into COMBINED and is stored as its own TEXT record.
    pub fn append_file(
        &self,
        chain_id: &str,
        upload: &FileUpload,
        comment: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<Appended> {
        upload.validate(self.upload_limit)?;
        self.chain(chain_id)?;

        let comment = comment.map(str::trim).filter(|c| !c.is_empty());
        let file_hash = sha256_hex(&upload.bytes);
        let block_type = if comment.is_some() {
            BlockType::Combined
        } else {
            BlockType::File
        };
        let payload = file_payload(&file_hash, comment);
        info!(
            "appending {:?} block to chain {chain_id} for file {} ({} bytes)",
            block_type,
            upload.filename,
            upload.size()
        );

        let mut appended = self.mint(chain_id, block_type, &payload, user_id, |block_id| {
            let mut records = vec![BlockContent::file_hash(
                block_id,
                &file_hash,
                &upload.filename,
                upload.size(),
                &upload.mime_type,
            )];
            if let Some(text) = comment {
                records.push(BlockContent::text(block_id, text));
            }
            records
        })?;

        if let Some(user) = user_id {
            let points = FILE_UPLOAD_POINTS + comment.map_or(0, |_| COMMENT_UPLOAD_POINTS);
            match self.ledger.credit(user, points) {
                Ok(()) => {
                    info!("upload reward: {points} point(s) to user {user}");
                    appended.upload_points = Some(points);
                }
                Err(e) => warn!("could not credit upload points to user {user}: {e}"),
            }
        }
        Ok(appended)
    }

    pub fn tip(&self, chain_id: &str) -> Result<ChainTip> {
        self.chain(chain_id)?;
        let (next_index, last_hash) = self.next_slot(chain_id)?;
        Ok(ChainTip {
            chain_id: chain_id.to_string(),
            last_hash,
            next_index,
        })
    }

    /// Next index and the previous-hash it must link to.
    ///
    /// Unsynchronised on its own: two callers reading before either persists
    /// get the same answer. [`ChainBuilder::mint`] calls it under the chain lock.
    pub(crate) fn next_slot(&self, chain_id: &str) -> Result<(u64, String)> {
        Ok(match self.store.tip_block(chain_id)? {
            Some(tip) => (tip.index + 1, tip.hash),
            None => (0, GENESIS_PREV_HASH.to_string()),
        })
    }

    /// Text shown for a block: its TEXT record, else its file hash.
    pub fn block_content(&self, block_id: &str) -> Result<String> {
        if let Some(text) = self.store.content(block_id, ContentType::Text)? {
            return Ok(text.content);
        }
        Ok(self
            .store
            .content(block_id, ContentType::FileHash)?
            .map(|c| c.content)
            .unwrap_or_else(|| "No content".to_string()))
    }

    pub fn block(&self, block_id: &str) -> Result<Block> {
        self.store
            .block(block_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("block not found: {block_id}")))
    }

    pub fn blocks(&self, chain_id: &str) -> Result<Vec<Block>> {
        self.chain(chain_id)?;
        self.store.blocks_ordered(chain_id)
    }

    fn chain_lock(&self, chain_id: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .chain_locks
            .lock()
            .map_err(|_| LedgerError::Storage("chain lock table poisoned".into()))?;
        Ok(locks.entry(chain_id.to_string()).or_default().clone())
    }

    fn mint<F>(
        &self,
        chain_id: &str,
        block_type: BlockType,
        payload: &str,
        user_id: Option<&str>,
        records: F,
    ) -> Result<Appended>
    where
        F: FnOnce(&str) -> Vec<BlockContent>,
    {
        let lock = self.chain_lock(chain_id)?;
        let _guard = lock
            .lock()
            .map_err(|_| LedgerError::Storage(format!("chain {chain_id} lock poisoned")))?;

        let (index, previous_hash) = self.next_slot(chain_id)?;
        if block_type == BlockType::Genesis && index != 0 {
            return Err(LedgerError::Validation(format!(
                "chain {chain_id} already has a genesis block"
            )));
        }

        let mut block = Block::new(chain_id, index, previous_hash, block_type);
        let mut report = self.miner.mine_block(&mut block, payload, user_id)?;
        let contents = records(&block.id);
        let block = self.store.commit_block(block, contents)?;

        // Paid only once the block is stored; failures leave the block as is.
        if let (Some(user), Some(points)) = (user_id, report.reward) {
            if let Err(e) = self.miner.pay_reward(user, points) {
                warn!("could not reward user {user}: {e}");
                report.reward = None;
            }
        }

        Ok(Appended {
            block,
            report,
            upload_points: None,
        })
    }
}
