pub mod pow;
pub mod reward;

pub use pow::{PowSolution, mine, mine_until};
pub use reward::{DifficultyReward, FlatReward, RewardContext, RewardPolicy, policy_from_name};

use log::{info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::blockchain::{Block, Difficulty};
use crate::error::{LedgerError, Result};
use crate::ledger::RewardLedger;

/// Outcome of a sealed block, as reported to callers.
#[derive(Debug, Clone)]
pub struct MiningReport {
    pub difficulty: u32,
    pub attempts: u64,
    pub elapsed_ms: u128,
    /// Points owed to the miner; settled by [`Miner::pay_reward`].
    pub reward: Option<u64>,
}

/// Seals blocks with proof-of-work and pays the miner.
#[derive(Debug)]
pub struct Miner {
    difficulty: Arc<Difficulty>,
    ledger: Arc<dyn RewardLedger>,
    policy: Box<dyn RewardPolicy>,
    timeout: Option<Duration>,
}

impl Miner {
    pub fn new(
        difficulty: Arc<Difficulty>,
        ledger: Arc<dyn RewardLedger>,
        policy: Box<dyn RewardPolicy>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            difficulty,
            ledger,
            policy,
            timeout,
        }
    }

    pub fn difficulty(&self) -> &Difficulty {
        &self.difficulty
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Mine `block` over `content`, stamping hash, nonce and difficulty.
    ///
    /// Difficulty is snapshotted once before the search. When `user_id` is
    /// given and may be rewarded, the block is attributed to them and the
    /// report carries the points owed. Nothing is paid here: the caller pays
    /// with [`Miner::pay_reward`] once the block is persisted.
    pub fn mine_block(
        &self,
        block: &mut Block,
        content: &str,
        user_id: Option<&str>,
    ) -> Result<MiningReport> {
        if block.chain_id.is_empty() {
            return Err(LedgerError::Validation("block has no chain".into()));
        }
        if content.is_empty() {
            return Err(LedgerError::Validation("mining content must not be empty".into()));
        }

        let difficulty = self.difficulty.current();
        info!(
            "mining block #{} for chain {} at difficulty {}",
            block.index, block.chain_id, difficulty
        );

        let started = Instant::now();
        let solution = match self.timeout {
            Some(limit) => mine_until(
                block.index,
                Some(&block.previous_hash),
                block.timestamp,
                content,
                difficulty,
                started + limit,
            )?,
            None => mine(
                block.index,
                Some(&block.previous_hash),
                block.timestamp,
                content,
                difficulty,
            ),
        };
        let elapsed = started.elapsed();

        block.hash = solution.hash;
        block.nonce = solution.nonce;
        block.difficulty = difficulty;

        info!(
            "block #{} mined in {}ms with {} attempts (hash={}, nonce={})",
            block.index,
            elapsed.as_millis(),
            solution.attempts,
            block.hash,
            block.nonce
        );

        let reward = user_id.and_then(|user| {
            let ctx = RewardContext {
                difficulty,
                attempts: solution.attempts,
                elapsed,
            };
            self.attribute(user, block, &ctx)
        });

        Ok(MiningReport {
            difficulty,
            attempts: solution.attempts,
            elapsed_ms: elapsed.as_millis(),
            reward,
        })
    }

    /// Credit the points owed for a persisted block and count it as mined.
    pub fn pay_reward(&self, user_id: &str, points: u64) -> Result<()> {
        self.ledger.credit(user_id, points)?;
        self.ledger.increment_mined_count(user_id)?;
        info!("rewarded user {user_id} with {points} point(s)");
        Ok(())
    }

    fn attribute(&self, user_id: &str, block: &mut Block, ctx: &RewardContext) -> Option<u64> {
        if let Err(e) = self.ledger.ensure_rewardable(user_id) {
            warn!("no reward for user {user_id}: {e}");
            return None;
        }
        let points = self.policy.points(ctx);
        block.mined_by = Some(user_id.to_string());
        block.mining_reward = Some(points);
        Some(points)
    }
}
