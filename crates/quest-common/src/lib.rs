//! Quest Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the Rearc Quest pipeline.
//!
//! # Overview
//!
//! This crate provides common functionality used across all workspace members:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Checksums**: MD5 digests used for upload deduplication
//! - **Types**: Shared domain types (artifact keys, BLS rows, population rows)
//!
//! # Example
//!
//! ```no_run
//! use quest_common::{Result, QuestError};
//! use quest_common::checksum::md5_hex;
//!
//! fn fingerprint(blob: &[u8]) -> Result<String> {
//!     Ok(md5_hex(blob))
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{QuestError, Result};
