//! Chain building, validation and reporting on top of a [`ChainStore`].
//!
//! [`ChainStore`]: crate::storage::ChainStore

pub mod builder;
pub mod stats;
pub mod upload;
pub mod validator;

pub use builder::{Appended, ChainBuilder, ChainTip};
pub use stats::ChainStats;
pub use upload::{ALLOWED_MIME_TYPES, FileUpload, MAX_FILE_BYTES, is_supported_type};
pub use validator::{BlockStatus, ChainValidation, IntegritySummary, ValidationDetail, Validator};
