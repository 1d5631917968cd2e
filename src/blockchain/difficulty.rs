use std::sync::atomic::{AtomicU32, Ordering};

use super::{DIFF_MAX, DIFF_MIN};
use crate::error::{LedgerError, Result};

/// Process-wide difficulty setting.
///
/// Readers take a snapshot with [`Difficulty::current`]; a mining call holds on
/// to that snapshot for its whole search, so later updates only affect blocks
/// minted afterwards.
#[derive(Debug)]
pub struct Difficulty {
    current: AtomicU32,
    default: u32,
}

impl Difficulty {
    pub fn new(default: u32) -> Result<Self> {
        check_range(default)?;
        Ok(Self {
            current: AtomicU32::new(default),
            default,
        })
    }

    pub fn current(&self) -> u32 {
        self.current.load(Ordering::Acquire)
    }

    pub fn default_value(&self) -> u32 {
        self.default
    }

    /// Update difficulty (affects future blocks only).
    pub fn set(&self, difficulty: u32) -> Result<()> {
        check_range(difficulty)?;
        self.current.store(difficulty, Ordering::Release);
        Ok(())
    }

    pub fn reset(&self) {
        self.current.store(self.default, Ordering::Release);
    }

    pub fn target_prefix(&self) -> String {
        "0".repeat(self.current() as usize)
    }
}

fn check_range(difficulty: u32) -> Result<()> {
    if !(DIFF_MIN..=DIFF_MAX).contains(&difficulty) {
        return Err(LedgerError::Validation(format!(
            "difficulty must be between {DIFF_MIN} and {DIFF_MAX}"
        )));
    }
    Ok(())
}
