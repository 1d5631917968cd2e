use log::debug;
use std::convert::Infallible;
use std::time::Instant;

use crate::blockchain::{block_preimage, meets_difficulty, sha256_hex_str};
use crate::error::{LedgerError, Result};

/// How often (in attempts) the search logs progress and checks its deadline.
const PROGRESS_INTERVAL: u64 = 100_000;
const DEADLINE_CHECK_INTERVAL: u64 = 1_024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowSolution {
    pub hash: String,
    pub nonce: u64,
    pub attempts: u64,
}

/// Search for a nonce whose hash starts with `difficulty` hex zeros.
///
/// The nonce is incremented before every trial, so the first nonce tried is 1.
/// There is no upper bound: at high difficulty this blocks the calling thread
/// for as long as it takes. Use [`mine_until`] to bound it.
pub fn mine(
    index: u64,
    previous_hash: Option<&str>,
    timestamp: i64,
    content: &str,
    difficulty: u32,
) -> PowSolution {
    let Ok(solution) = search(index, previous_hash, timestamp, content, difficulty, |_| {
        Ok::<(), Infallible>(())
    });
    solution
}

/// Same search as [`mine`], giving up once `deadline` has passed.
pub fn mine_until(
    index: u64,
    previous_hash: Option<&str>,
    timestamp: i64,
    content: &str,
    difficulty: u32,
    deadline: Instant,
) -> Result<PowSolution> {
    search(index, previous_hash, timestamp, content, difficulty, |attempts| {
        if attempts % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
            return Err(LedgerError::MiningTimeout {
                attempts,
                difficulty,
            });
        }
        Ok(())
    })
}

fn search<E, F>(
    index: u64,
    previous_hash: Option<&str>,
    timestamp: i64,
    content: &str,
    difficulty: u32,
    mut keep_going: F,
) -> std::result::Result<PowSolution, E>
where
    F: FnMut(u64) -> std::result::Result<(), E>,
{
    let mut nonce: u64 = 0;
    let mut attempts: u64 = 0;
    loop {
        nonce = nonce.wrapping_add(1);
        attempts += 1;
        let hash = sha256_hex_str(&block_preimage(
            index,
            previous_hash,
            timestamp,
            content,
            nonce,
        ));
        if meets_difficulty(&hash, difficulty) {
            return Ok(PowSolution {
                hash,
                nonce,
                attempts,
            });
        }
        if attempts % PROGRESS_INTERVAL == 0 {
            debug!("attempt {attempts}: current hash = {hash}");
        }
        keep_going(attempts)?;
    }
}
