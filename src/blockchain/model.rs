use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named, independently ordered chain of blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: i64, // epoch millis
    pub updated_at: i64,
    pub is_active: bool,
    pub total_blocks: u64,
}

impl Chain {
    pub fn new(name: &str, description: &str) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
            is_active: true,
            total_blocks: 0,
        }
    }

    /// Bookkeeping after a block was appended.
    pub fn record_block(&mut self) {
        self.total_blocks += 1;
        self.updated_at = Utc::now().timestamp_millis();
    }
}
