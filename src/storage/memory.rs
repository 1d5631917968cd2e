use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::ChainStore;
use crate::blockchain::{Block, BlockContent, Chain, ContentType};
use crate::error::{LedgerError, Result};

#[derive(Debug, Default)]
struct Inner {
    chains: HashMap<String, Chain>,
    blocks: HashMap<String, Block>,
    // chain id -> block index -> block id
    slots: HashMap<String, BTreeMap<u64, String>>,
    contents: HashMap<String, Vec<BlockContent>>,
}

impl Inner {
    fn put_block(&mut self, block: Block) -> Result<Block> {
        if !self.chains.contains_key(&block.chain_id) {
            return Err(LedgerError::NotFound(format!(
                "chain not found: {}",
                block.chain_id
            )));
        }

        let slots = self.slots.entry(block.chain_id.clone()).or_default();
        if let Some(holder) = slots.get(&block.index) {
            if *holder != block.id {
                return Err(LedgerError::IndexTaken {
                    chain_id: block.chain_id.clone(),
                    index: block.index,
                });
            }
        }

        match self.blocks.get(&block.id) {
            Some(existing) => {
                if existing.index != block.index {
                    slots.remove(&existing.index);
                }
            }
            None => {
                if let Some(chain) = self.chains.get_mut(&block.chain_id) {
                    chain.record_block();
                }
            }
        }

        slots.insert(block.index, block.id.clone());
        self.blocks.insert(block.id.clone(), block.clone());
        Ok(block)
    }
}

/// Process-local store; every operation runs under a single lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| LedgerError::Storage("store mutex poisoned".into()))
    }
}

impl ChainStore for MemoryStore {
    fn insert_chain(&self, chain: Chain) -> Result<Chain> {
        let mut inner = self.lock()?;
        inner.chains.insert(chain.id.clone(), chain.clone());
        Ok(chain)
    }

    fn insert_chain_with_genesis(
        &self,
        chain: Chain,
        genesis: Block,
        contents: Vec<BlockContent>,
    ) -> Result<Chain> {
        if genesis.chain_id != chain.id || genesis.index != 0 {
            return Err(LedgerError::Validation(format!(
                "block {} is not a genesis block of chain {}",
                genesis.id, chain.id
            )));
        }
        if let Some(stray) = contents.iter().find(|c| c.block_id != genesis.id) {
            return Err(LedgerError::Validation(format!(
                "content {} does not belong to block {}",
                stray.id, genesis.id
            )));
        }

        let mut inner = self.lock()?;
        if inner.chains.contains_key(&chain.id) {
            return Err(LedgerError::Validation(format!(
                "chain already exists: {}",
                chain.id
            )));
        }
        let chain_id = chain.id.clone();
        let block_id = genesis.id.clone();
        inner.chains.insert(chain_id.clone(), chain);
        if let Err(e) = inner.put_block(genesis) {
            inner.chains.remove(&chain_id);
            inner.slots.remove(&chain_id);
            return Err(e);
        }
        inner.contents.entry(block_id).or_default().extend(contents);
        inner
            .chains
            .get(&chain_id)
            .cloned()
            .ok_or_else(|| LedgerError::Internal(format!("chain vanished: {chain_id}")))
    }

    fn find_chain(&self, chain_id: &str) -> Result<Option<Chain>> {
        Ok(self.lock()?.chains.get(chain_id).cloned())
    }

    fn active_chains(&self) -> Result<Vec<Chain>> {
        let inner = self.lock()?;
        let mut chains: Vec<Chain> = inner
            .chains
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        chains.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(chains)
    }

    fn tip_block(&self, chain_id: &str) -> Result<Option<Block>> {
        let inner = self.lock()?;
        Ok(inner
            .slots
            .get(chain_id)
            .and_then(|slots| slots.values().next_back())
            .and_then(|id| inner.blocks.get(id))
            .cloned())
    }

    fn save_block(&self, block: Block) -> Result<Block> {
        self.lock()?.put_block(block)
    }

    fn save_content(&self, content: BlockContent) -> Result<BlockContent> {
        let mut inner = self.lock()?;
        if !inner.blocks.contains_key(&content.block_id) {
            return Err(LedgerError::NotFound(format!(
                "block not found: {}",
                content.block_id
            )));
        }
        inner
            .contents
            .entry(content.block_id.clone())
            .or_default()
            .push(content.clone());
        Ok(content)
    }

    fn commit_block(&self, block: Block, contents: Vec<BlockContent>) -> Result<Block> {
        if let Some(stray) = contents.iter().find(|c| c.block_id != block.id) {
            return Err(LedgerError::Validation(format!(
                "content {} does not belong to block {}",
                stray.id, block.id
            )));
        }
        let mut inner = self.lock()?;
        let block_id = block.id.clone();
        let saved = inner.put_block(block)?;
        inner.contents.entry(block_id).or_default().extend(contents);
        Ok(saved)
    }

    fn blocks_ordered(&self, chain_id: &str) -> Result<Vec<Block>> {
        let inner = self.lock()?;
        Ok(inner
            .slots
            .get(chain_id)
            .map(|slots| {
                slots
                    .values()
                    .filter_map(|id| inner.blocks.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn block_at(&self, chain_id: &str, index: u64) -> Result<Option<Block>> {
        let inner = self.lock()?;
        Ok(inner
            .slots
            .get(chain_id)
            .and_then(|slots| slots.get(&index))
            .and_then(|id| inner.blocks.get(id))
            .cloned())
    }

    fn block(&self, block_id: &str) -> Result<Option<Block>> {
        Ok(self.lock()?.blocks.get(block_id).cloned())
    }

    fn content(&self, block_id: &str, kind: ContentType) -> Result<Option<BlockContent>> {
        Ok(self
            .lock()?
            .contents
            .get(block_id)
            .and_then(|records| records.iter().find(|c| c.kind == kind))
            .cloned())
    }

    fn contents(&self, block_id: &str) -> Result<Vec<BlockContent>> {
        Ok(self
            .lock()?
            .contents
            .get(block_id)
            .cloned()
            .unwrap_or_default())
    }

    fn set_validity(&self, block_id: &str, is_valid: bool) -> Result<()> {
        let mut inner = self.lock()?;
        let block = inner
            .blocks
            .get_mut(block_id)
            .ok_or_else(|| LedgerError::NotFound(format!("block not found: {block_id}")))?;
        block.is_valid = is_valid;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::BlockType;

    fn store_with_chain() -> (MemoryStore, Chain) {
        let store = MemoryStore::new();
        let chain = store.insert_chain(Chain::new("test", "")).unwrap();
        (store, chain)
    }

    fn block(chain: &Chain, index: u64) -> Block {
        let mut b = Block::new(&chain.id, index, format!("prev-{index}"), BlockType::Text);
        b.hash = format!("hash-{index}");
        b
    }

    #[test]
    fn tip_and_next_index_follow_highest_index() {
        let (store, chain) = store_with_chain();
        assert!(store.tip_block(&chain.id).unwrap().is_none());
        assert_eq!(store.next_index(&chain.id).unwrap(), 0);

        store.save_block(block(&chain, 0)).unwrap();
        store.save_block(block(&chain, 1)).unwrap();
        assert_eq!(store.tip_block(&chain.id).unwrap().unwrap().index, 1);
        assert_eq!(store.next_index(&chain.id).unwrap(), 2);
        assert_eq!(store.find_chain(&chain.id).unwrap().unwrap().total_blocks, 2);
    }

    #[test]
    fn duplicate_index_is_refused() {
        let (store, chain) = store_with_chain();
        store.save_block(block(&chain, 0)).unwrap();
        let err = store.save_block(block(&chain, 0)).unwrap_err();
        assert!(matches!(err, LedgerError::IndexTaken { index: 0, .. }));
        assert_eq!(store.blocks_ordered(&chain.id).unwrap().len(), 1);
    }

    #[test]
    fn overwrite_by_id_keeps_slot_and_count() {
        let (store, chain) = store_with_chain();
        let mut b = store.save_block(block(&chain, 0)).unwrap();
        b.previous_hash = "tampered".into();
        store.save_block(b.clone()).unwrap();
        let loaded = store.block(&b.id).unwrap().unwrap();
        assert_eq!(loaded.previous_hash, "tampered");
        assert_eq!(store.find_chain(&chain.id).unwrap().unwrap().total_blocks, 1);
    }

    #[test]
    fn commit_is_all_or_nothing() {
        let (store, chain) = store_with_chain();
        let first = block(&chain, 0);
        store
            .commit_block(first.clone(), vec![BlockContent::text(&first.id, "a")])
            .unwrap();

        let clash = block(&chain, 0);
        let err = store
            .commit_block(clash.clone(), vec![BlockContent::text(&clash.id, "b")])
            .unwrap_err();
        assert!(matches!(err, LedgerError::IndexTaken { .. }));
        assert!(store.block(&clash.id).unwrap().is_none());
        assert!(store.contents(&clash.id).unwrap().is_empty());

        let stray = block(&chain, 1);
        assert!(store
            .commit_block(stray.clone(), vec![BlockContent::text("other", "c")])
            .is_err());
        assert!(store.block(&stray.id).unwrap().is_none());
    }

    #[test]
    fn chain_and_genesis_land_together() {
        let store = MemoryStore::new();
        let chain = Chain::new("atomic", "");
        let mut genesis = Block::new(&chain.id, 0, "0".repeat(64), BlockType::Genesis);
        genesis.hash = "h0".into();
        let records = vec![BlockContent::text(&genesis.id, "Genesis Block")];

        let saved = store
            .insert_chain_with_genesis(chain.clone(), genesis.clone(), records)
            .unwrap();
        assert_eq!(saved.total_blocks, 1);
        assert_eq!(store.tip_block(&chain.id).unwrap().unwrap().id, genesis.id);
        assert_eq!(store.contents(&genesis.id).unwrap().len(), 1);

        // A second attempt for the same chain id leaves the first untouched.
        let mut again = Block::new(&chain.id, 0, "0".repeat(64), BlockType::Genesis);
        again.hash = "h1".into();
        assert!(store.insert_chain_with_genesis(chain.clone(), again, vec![]).is_err());
        assert_eq!(store.blocks_ordered(&chain.id).unwrap().len(), 1);
    }

    #[test]
    fn mismatched_genesis_publishes_nothing() {
        let store = MemoryStore::new();
        let chain = Chain::new("atomic", "");
        let mut wrong_index = Block::new(&chain.id, 1, "p".into(), BlockType::Text);
        wrong_index.hash = "h".into();
        assert!(store
            .insert_chain_with_genesis(chain.clone(), wrong_index, vec![])
            .is_err());

        let mut genesis = Block::new(&chain.id, 0, "0".repeat(64), BlockType::Genesis);
        genesis.hash = "h".into();
        let stray = vec![BlockContent::text("elsewhere", "x")];
        assert!(store
            .insert_chain_with_genesis(chain.clone(), genesis, stray)
            .is_err());
        assert!(store.find_chain(&chain.id).unwrap().is_none());
        assert!(store.active_chains().unwrap().is_empty());
    }

    #[test]
    fn content_is_appended_to_existing_blocks_only() {
        let (store, chain) = store_with_chain();
        let b = store.save_block(block(&chain, 0)).unwrap();
        store
            .save_content(BlockContent::text(&b.id, "late note"))
            .unwrap();
        let text = store.content(&b.id, ContentType::Text).unwrap().unwrap();
        assert_eq!(text.content, "late note");

        assert!(matches!(
            store.save_content(BlockContent::text("missing", "x")),
            Err(LedgerError::NotFound(_))
        ));
        assert!(store.contents("missing").unwrap().is_empty());
    }

    #[test]
    fn blocks_require_an_existing_chain() {
        let store = MemoryStore::new();
        let mut b = Block::new("nope", 0, "p".into(), BlockType::Text);
        b.hash = "h".into();
        assert!(matches!(
            store.save_block(b),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn lookups_by_position_and_kind() {
        let (store, chain) = store_with_chain();
        let b = block(&chain, 0);
        store
            .commit_block(
                b.clone(),
                vec![
                    BlockContent::file_hash(&b.id, "fh", "a.txt", 3, "text/plain"),
                    BlockContent::text(&b.id, "comment"),
                ],
            )
            .unwrap();
        assert_eq!(store.block_at(&chain.id, 0).unwrap().unwrap().id, b.id);
        assert!(store.block_at(&chain.id, 1).unwrap().is_none());
        let text = store.content(&b.id, ContentType::Text).unwrap().unwrap();
        assert_eq!(text.content, "comment");
        assert!(store.content(&b.id, ContentType::Metadata).unwrap().is_none());

        store.set_validity(&b.id, false).unwrap();
        assert!(!store.block(&b.id).unwrap().unwrap().is_valid);
        assert!(store.set_validity("missing", true).is_err());
    }
}
