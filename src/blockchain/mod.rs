pub mod block;
pub mod content;
pub mod difficulty;
pub mod hash;
pub mod model;

pub use block::{Block, BlockType, block_preimage, file_payload, meets_difficulty};
pub use content::{BlockContent, ContentType};
pub use difficulty::Difficulty;
pub use hash::{sha256_hex, sha256_hex_str};
pub use model::Chain;

/// Default Proof-of-Work difficulty (number of leading hex zeros).
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Difficulty bounds accepted by the configuration endpoint.
pub const DIFF_MIN: u32 = 1;
pub const DIFF_MAX: u32 = 10;

/// Points granted per mined block under the flat reward policy.
pub const MINING_REWARD: u64 = 1;

/// Previous-hash stored on every genesis block.
pub const GENESIS_PREV_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Payload mined into the genesis block.
pub const GENESIS_DATA: &str = "Genesis Block";

/// Name of the chain created on demand when no active chain exists.
pub const DEFAULT_CHAIN_NAME: &str = "Main Blockchain";
pub const DEFAULT_CHAIN_DESCRIPTION: &str = "Main application blockchain";
