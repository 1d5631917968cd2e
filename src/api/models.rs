use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::blockchain::{Block, BlockContent, Chain, Difficulty};
use crate::config::Settings;
use crate::error::Result;
use crate::ledger::{LeaderboardEntry, LeaderboardStats, UserLedger};
use crate::mining::{Miner, MiningReport, policy_from_name};
use crate::service::{ChainBuilder, Validator};
use crate::storage::{ChainStore, MemoryStore};

/// Shared application state: in-memory store, user ledger and the services on top.
#[derive(Debug)]
pub struct AppState {
    pub chains: ChainBuilder,
    pub validator: Validator,
    pub users: Arc<UserLedger>,
    pub difficulty: Arc<Difficulty>,
    pub settings: Settings,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self> {
        let store: Arc<dyn ChainStore> = Arc::new(MemoryStore::new());
        let users = Arc::new(UserLedger::new());
        let difficulty = Arc::new(Difficulty::new(settings.default_difficulty)?);
        let policy = policy_from_name(&settings.reward_policy, settings.mining_reward)?;
        let miner = Miner::new(
            difficulty.clone(),
            users.clone(),
            policy,
            settings.mining_timeout,
        );
        let chains = ChainBuilder::new(store.clone(), users.clone(), miner)
            .with_upload_limit(settings.max_upload_bytes);

        Ok(Self {
            chains,
            validator: Validator::new(store),
            users,
            difficulty,
            settings,
        })
    }
}

/* ---------- Shared ---------- */

#[derive(Deserialize, Default)]
pub struct ChainQuery {
    pub chain_id: Option<String>,
}

#[derive(Serialize)]
pub struct MiningInfo {
    pub difficulty: u32,
    pub attempts: u64,
    pub elapsed_ms: u64,
    pub reward: Option<u64>,
}

impl From<&MiningReport> for MiningInfo {
    fn from(report: &MiningReport) -> Self {
        Self {
            difficulty: report.difficulty,
            attempts: report.attempts,
            elapsed_ms: u64::try_from(report.elapsed_ms).unwrap_or(u64::MAX),
            reward: report.reward,
        }
    }
}

/// A block together with the text a reader would see for it.
#[derive(Serialize)]
pub struct BlockView {
    #[serde(flatten)]
    pub block: Block,
    pub content: String,
}

#[derive(Serialize)]
pub struct BlockCreatedResponse {
    pub success: bool,
    pub block: Block,
    pub mining: MiningInfo,
    pub upload_points: Option<u64>,
}

/* ---------- Chain API Models ---------- */

#[derive(Deserialize)]
pub struct CreateChainRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize)]
pub struct ChainDetailResponse {
    pub chain: Chain,
    pub blocks: Vec<BlockView>,
}

#[derive(Deserialize)]
pub struct TextBlockRequest {
    pub content: String,
    pub chain_id: Option<String>,
}

/* ---------- Block API Models ---------- */

#[derive(Serialize)]
pub struct BlockContentResponse {
    pub block_id: String,
    pub records: Vec<BlockContent>,
}

#[derive(Serialize)]
pub struct BlockCheckResponse {
    pub block_id: String,
    pub is_valid: bool,
    pub timestamp: i64,
}

/* ---------- Mining API Models ---------- */

#[derive(Deserialize, Default)]
pub struct MineRequest {
    pub content: Option<String>,
    pub chain_id: Option<String>,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub success: bool,
    pub block: Block,
    pub mining: MiningInfo,
    pub user_points: u64,
    pub blocks_mined: u64,
}

#[derive(Serialize)]
pub struct MiningStatsResponse {
    pub user_id: String,
    pub total_points: u64,
    pub blocks_mined: u64,
    pub average_points_per_block: f64,
    pub current_difficulty: u32,
    pub target_prefix: String,
}

#[derive(Serialize)]
pub struct DifficultyResponse {
    pub current: u32,
    pub default: u32,
    pub target_prefix: String,
    pub reward_policy: &'static str,
    pub mining_reward: u64,
}

#[derive(Deserialize)]
pub struct SetDifficultyRequest {
    pub difficulty: u32,
}

/* ---------- Validation API Models ---------- */

#[derive(Serialize)]
pub struct RepairResponse {
    pub success: bool,
    pub chain_id: String,
    pub repaired_blocks: usize,
    pub timestamp: i64,
}

/* ---------- File API Models ---------- */

#[derive(Deserialize)]
pub struct UploadQuery {
    pub filename: String,
    pub comment: Option<String>,
    pub chain_id: Option<String>,
}

#[derive(Serialize)]
pub struct SupportedTypesResponse {
    pub types: Vec<&'static str>,
    pub max_bytes: usize,
}

/* ---------- User API Models ---------- */

#[derive(Deserialize)]
pub struct RegisterUserRequest {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
    pub stats: LeaderboardStats,
}
