use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::hash::sha256_hex_str;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    Text,
    FileHash,
    Metadata,
}

/// Payload record attached to a block. Written once alongside the block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockContent {
    pub id: String,
    pub block_id: String,
    pub kind: ContentType,
    pub content: String,
    pub content_hash: String,
    pub original_filename: Option<String>,
    pub file_size: Option<u64>,
    pub mime_type: Option<String>,
    pub created_at: i64,
}

impl BlockContent {
    /// Text record; its hash covers the raw text only, not the mining preimage.
    pub fn text(block_id: &str, text: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            block_id: block_id.to_string(),
            kind: ContentType::Text,
            content: text.to_string(),
            content_hash: sha256_hex_str(text),
            original_filename: None,
            file_size: None,
            mime_type: None,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// File record: the content *is* the file hash.
    pub fn file_hash(
        block_id: &str,
        file_hash: &str,
        filename: &str,
        size: u64,
        mime_type: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            block_id: block_id.to_string(),
            kind: ContentType::FileHash,
            content: file_hash.to_string(),
            content_hash: file_hash.to_string(),
            original_filename: Some(filename.to_string()),
            file_size: Some(size),
            mime_type: Some(mime_type.to_string()),
            created_at: Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_record_hashes_raw_text() {
        let c = BlockContent::text("b1", "hello");
        assert_eq!(c.kind, ContentType::Text);
        assert_eq!(c.content_hash, sha256_hex_str("hello"));
    }

    #[test]
    fn file_record_reuses_file_hash() {
        let c = BlockContent::file_hash("b1", "abcd", "notes.txt", 12, "text/plain");
        assert_eq!(c.content, "abcd");
        assert_eq!(c.content_hash, "abcd");
        assert_eq!(c.file_size, Some(12));
    }
}
