//! Persistence seam for chains, blocks and their content records.

pub mod memory;

pub use memory::MemoryStore;

use std::fmt::Debug;

use crate::blockchain::{Block, BlockContent, Chain, ContentType};
use crate::error::Result;

pub trait ChainStore: Send + Sync + Debug {
    fn insert_chain(&self, chain: Chain) -> Result<Chain>;
    /// Make a chain visible together with its mined genesis block and
    /// content records, or not at all.
    fn insert_chain_with_genesis(
        &self,
        chain: Chain,
        genesis: Block,
        contents: Vec<BlockContent>,
    ) -> Result<Chain>;
    fn find_chain(&self, chain_id: &str) -> Result<Option<Chain>>;
    /// Active chains, oldest first.
    fn active_chains(&self) -> Result<Vec<Chain>>;

    /// Highest-index block of the chain.
    fn tip_block(&self, chain_id: &str) -> Result<Option<Block>>;

    fn next_index(&self, chain_id: &str) -> Result<u64> {
        Ok(self.tip_block(chain_id)?.map_or(0, |b| b.index + 1))
    }

    /// Insert a new block or overwrite an existing one (same id).
    ///
    /// Inserting a block whose (chain, index) slot is already taken by a
    /// different block fails with `IndexTaken`.
    fn save_block(&self, block: Block) -> Result<Block>;
    fn save_content(&self, content: BlockContent) -> Result<BlockContent>;

    /// Insert a freshly mined block together with its content records, or
    /// nothing at all.
    fn commit_block(&self, block: Block, contents: Vec<BlockContent>) -> Result<Block>;

    fn blocks_ordered(&self, chain_id: &str) -> Result<Vec<Block>>;
    fn block_at(&self, chain_id: &str, index: u64) -> Result<Option<Block>>;
    fn block(&self, block_id: &str) -> Result<Option<Block>>;

    fn content(&self, block_id: &str, kind: ContentType) -> Result<Option<BlockContent>>;
    fn contents(&self, block_id: &str) -> Result<Vec<BlockContent>>;

    /// Overwrite the validity flag; the only mutation allowed on a mined block.
    fn set_validity(&self, block_id: &str, is_valid: bool) -> Result<()>;
}
