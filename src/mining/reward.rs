use std::fmt::Debug;
use std::time::Duration;

use crate::error::{LedgerError, Result};

/// What the policy knows about the search that just finished.
#[derive(Debug, Clone, Copy)]
pub struct RewardContext {
    pub difficulty: u32,
    pub attempts: u64,
    pub elapsed: Duration,
}

/// Decides how many points a successful mining call is worth.
pub trait RewardPolicy: Send + Sync + Debug {
    fn points(&self, ctx: &RewardContext) -> u64;
    fn name(&self) -> &'static str;
}

/// Fixed amount per block.
#[derive(Debug, Clone, Copy)]
pub struct FlatReward {
    pub points: u64,
}

impl RewardPolicy for FlatReward {
    fn points(&self, _ctx: &RewardContext) -> u64 {
        self.points
    }

    fn name(&self) -> &'static str {
        "flat"
    }
}

/// Scales with difficulty, plus one bonus point for searches that took at
/// least a million attempts.
#[derive(Debug, Clone, Copy)]
pub struct DifficultyReward {
    pub per_level: u64,
}

const LONG_SEARCH_ATTEMPTS: u64 = 1_000_000;

impl RewardPolicy for DifficultyReward {
    fn points(&self, ctx: &RewardContext) -> u64 {
        let base = self.per_level.max(1) * u64::from(ctx.difficulty.max(1));
        let bonus = u64::from(ctx.attempts >= LONG_SEARCH_ATTEMPTS);
        base + bonus
    }

    fn name(&self) -> &'static str {
        "difficulty"
    }
}

/// Build a policy from its configuration name.
pub fn policy_from_name(name: &str, points: u64) -> Result<Box<dyn RewardPolicy>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "flat" => Ok(Box::new(FlatReward { points })),
        "difficulty" => Ok(Box::new(DifficultyReward { per_level: points })),
        other => Err(LedgerError::Config(format!(
            "unknown reward policy '{other}' (expected 'flat' or 'difficulty')"
        ))),
    }
}
