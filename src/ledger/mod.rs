//! User registry and points bookkeeping.
//!
//! The mining core only sees [`RewardLedger`]; the HTTP layer also reads the
//! leaderboard and per-user totals from [`UserLedger`].

use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{LedgerError, Result};

/// Capability the miner uses to pay out rewards.
pub trait RewardLedger: Send + Sync + Debug {
    /// Ok when `user_id` may currently receive rewards.
    fn ensure_rewardable(&self, user_id: &str) -> Result<()>;
    fn credit(&self, user_id: &str, points: u64) -> Result<()>;
    fn increment_mined_count(&self, user_id: &str) -> Result<()>;
}

#[derive(Debug, Clone, Serialize)]
pub struct UserAccount {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub total_points: u64,
    pub blocks_mined: u64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointsStatus {
    Low,
    Medium,
    High,
}

impl PointsStatus {
    pub fn for_points(points: u64) -> Self {
        if points >= 10 {
            PointsStatus::High
        } else if points >= 5 {
            PointsStatus::Medium
        } else {
            PointsStatus::Low
        }
    }
}

/// Efficiency percentage shown on the leaderboard (10% per point, capped).
pub fn efficiency(points: u64) -> f64 {
    (points as f64 * 10.0).min(100.0)
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub name: String,
    pub surname: String,
    pub points: u64,
    pub blocks_mined: u64,
    pub status: PointsStatus,
    pub efficiency: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardStats {
    pub total_users: usize,
    pub average_points: u64,
    pub max_points: u64,
    pub total_points: u64,
}

/// In-memory user registry implementing [`RewardLedger`].
#[derive(Debug, Default)]
pub struct UserLedger {
    users: Mutex<HashMap<String, UserAccount>>,
}

impl UserLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, UserAccount>>> {
        self.users
            .lock()
            .map_err(|_| LedgerError::Storage("user ledger mutex poisoned".into()))
    }

    pub fn register(&self, first_name: &str, last_name: &str) -> Result<UserAccount> {
        let first_name = first_name.trim();
        if first_name.is_empty() {
            return Err(LedgerError::Validation("first_name required".into()));
        }
        let account = UserAccount {
            id: Uuid::new_v4().to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.trim().to_string(),
            is_active: true,
            total_points: 0,
            blocks_mined: 0,
            created_at: Utc::now().timestamp_millis(),
        };
        self.lock()?.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    pub fn get(&self, user_id: &str) -> Result<UserAccount> {
        self.lock()?
            .get(user_id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("user not found: {user_id}")))
    }

    pub fn deactivate(&self, user_id: &str) -> Result<UserAccount> {
        let mut users = self.lock()?;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::NotFound(format!("user not found: {user_id}")))?;
        user.is_active = false;
        Ok(user.clone())
    }

    /// Accounts ordered by points (desc), ties broken by id for stable output.
    pub fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let users = self.lock()?;
        let mut entries: Vec<LeaderboardEntry> = users
            .values()
            .map(|u| LeaderboardEntry {
                user_id: u.id.clone(),
                name: u.first_name.clone(),
                surname: u.last_name.clone(),
                points: u.total_points,
                blocks_mined: u.blocks_mined,
                status: PointsStatus::for_points(u.total_points),
                efficiency: efficiency(u.total_points),
            })
            .collect();
        entries.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(entries)
    }

    pub fn stats(&self) -> Result<LeaderboardStats> {
        let users = self.lock()?;
        let total_users = users.len();
        let total_points: u64 = users.values().map(|u| u.total_points).sum();
        let max_points = users.values().map(|u| u.total_points).max().unwrap_or(0);
        let average_points = if total_users > 0 {
            total_points / total_users as u64
        } else {
            0
        };
        Ok(LeaderboardStats {
            total_users,
            average_points,
            max_points,
            total_points,
        })
    }

    fn with_active<F>(&self, user_id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut UserAccount),
    {
        let mut users = self.lock()?;
        match users.get_mut(user_id) {
            Some(user) if user.is_active => {
                f(user);
                Ok(())
            }
            Some(_) => Err(LedgerError::Validation(format!("user inactive: {user_id}"))),
            None => Err(LedgerError::NotFound(format!("user not found: {user_id}"))),
        }
    }
}

impl RewardLedger for UserLedger {
    fn ensure_rewardable(&self, user_id: &str) -> Result<()> {
        self.with_active(user_id, |_| ())
    }

    fn credit(&self, user_id: &str, points: u64) -> Result<()> {
        self.with_active(user_id, |u| u.total_points += points)
    }

    fn increment_mined_count(&self, user_id: &str) -> Result<()> {
        self.with_active(user_id, |u| u.blocks_mined += 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_and_count_accumulate() {
        let ledger = UserLedger::new();
        let u = ledger.register("Ada", "Lovelace").unwrap();
        ledger.credit(&u.id, 2).unwrap();
        ledger.credit(&u.id, 1).unwrap();
        ledger.increment_mined_count(&u.id).unwrap();
        let u = ledger.get(&u.id).unwrap();
        assert_eq!(u.total_points, 3);
        assert_eq!(u.blocks_mined, 1);
    }

    #[test]
    fn unknown_and_inactive_users_are_rejected() {
        let ledger = UserLedger::new();
        assert!(matches!(
            ledger.credit("ghost", 1),
            Err(LedgerError::NotFound(_))
        ));
        let u = ledger.register("Bob", "").unwrap();
        ledger.deactivate(&u.id).unwrap();
        assert!(matches!(
            ledger.credit(&u.id, 1),
            Err(LedgerError::Validation(_))
        ));
        assert_eq!(ledger.get(&u.id).unwrap().total_points, 0);
        assert!(ledger.ensure_rewardable(&u.id).is_err());
        assert!(ledger.ensure_rewardable("ghost").is_err());
    }

    #[test]
    fn blank_first_name_is_rejected() {
        let ledger = UserLedger::new();
        assert!(ledger.register("   ", "x").is_err());
    }

    #[test]
    fn leaderboard_orders_by_points_with_status_and_efficiency() {
        let ledger = UserLedger::new();
        let a = ledger.register("A", "").unwrap();
        let b = ledger.register("B", "").unwrap();
        let c = ledger.register("C", "").unwrap();
        ledger.credit(&a.id, 3).unwrap();
        ledger.credit(&b.id, 12).unwrap();
        ledger.credit(&c.id, 6).unwrap();

        let board = ledger.leaderboard().unwrap();
        let points: Vec<u64> = board.iter().map(|e| e.points).collect();
        assert_eq!(points, vec![12, 6, 3]);
        assert_eq!(board[0].status, PointsStatus::High);
        assert_eq!(board[1].status, PointsStatus::Medium);
        assert_eq!(board[2].status, PointsStatus::Low);
        assert_eq!(board[0].efficiency, 100.0);
        assert_eq!(board[2].efficiency, 30.0);

        let stats = ledger.stats().unwrap();
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.total_points, 21);
        assert_eq!(stats.max_points, 12);
        assert_eq!(stats.average_points, 7);
    }

    #[test]
    fn empty_stats_are_zero() {
        let stats = UserLedger::new().stats().unwrap();
        assert_eq!(stats.total_users, 0);
        assert_eq!(stats.average_points, 0);
    }
}
