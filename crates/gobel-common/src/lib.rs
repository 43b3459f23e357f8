//! Gobel Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities and error handling for the gobel workspace.
//!
//! # Overview
//!
//! This crate provides functionality used across all gobel workspace members:
//!
//! - **Error Handling**: the shared error and result types
//! - **Checksums**: SHA-256 integrity helpers for downloaded documents
//! - **Logging**: tracing subscriber configuration and initialization
//!
//! # Example
//!
//! ```no_run
//! use gobel_common::{Result, checksum};
//!
//! fn report_digest(path: &str) -> Result<()> {
//!     let digest = checksum::compute_file_sha256(path)?;
//!     tracing::info!(%digest, "document fingerprint");
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{GobelError, Result};
