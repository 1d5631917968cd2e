use log::{debug, warn};

use crate::error::{LedgerError, Result};

pub const ALLOWED_MIME_TYPES: [&str; 2] = ["application/pdf", "text/plain"];

/// Default upload ceiling (10 MiB).
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

/// An uploaded file, treated as an opaque blob.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(filename: &str, mime_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.trim().to_string(),
            mime_type: normalize_mime(mime_type),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Reject empty, oversized, unsupported or suspiciously named files.
    pub fn validate(&self, max_bytes: usize) -> Result<()> {
        if self.bytes.is_empty() {
            return Err(LedgerError::Validation("file is required".into()));
        }
        if self.bytes.len() > max_bytes {
            warn!(
                "file rejected by size: {} bytes (max {})",
                self.bytes.len(),
                max_bytes
            );
            return Err(LedgerError::Validation(format!(
                "file exceeds the maximum allowed size ({max_bytes} bytes)"
            )));
        }
        if !is_supported_type(&self.mime_type) {
            warn!("file type rejected: {}", self.mime_type);
            return Err(LedgerError::Validation(format!(
                "file type not allowed: '{}' (allowed: {})",
                self.mime_type,
                ALLOWED_MIME_TYPES.join(", ")
            )));
        }
        if self.filename.is_empty() {
            return Err(LedgerError::Validation("file must have a name".into()));
        }
        if self.filename.contains("..") || self.filename.contains('/') || self.filename.contains('\\')
        {
            return Err(LedgerError::Validation("invalid file name".into()));
        }
        debug!("file validated: {} ({} bytes)", self.filename, self.bytes.len());
        Ok(())
    }
}

pub fn is_supported_type(mime_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&normalize_mime(mime_type).as_str())
}

// "Text/Plain; charset=utf-8" -> "text/plain"
fn normalize_mime(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_text_with_charset() {
        let f = FileUpload::new("notes.txt", "Text/Plain; charset=utf-8", b"hi".to_vec());
        assert_eq!(f.mime_type, "text/plain");
        assert!(f.validate(MAX_FILE_BYTES).is_ok());
    }

    #[test]
    fn rejects_empty_oversized_and_unsupported() {
        assert!(FileUpload::new("a.txt", "text/plain", vec![]).validate(10).is_err());
        assert!(FileUpload::new("a.txt", "text/plain", vec![0; 11]).validate(10).is_err());
        assert!(FileUpload::new("a.png", "image/png", vec![1]).validate(10).is_err());
    }

    #[test]
    fn rejects_path_like_names() {
        for name in ["../etc", "dir/a.txt", "dir\\a.txt", "   "] {
            let f = FileUpload::new(name, "text/plain", vec![1]);
            assert!(f.validate(10).is_err(), "{name} should be rejected");
        }
    }
}
