//! AWS Identity Manager — a local registry of named AWS credential sets.
//!
//! Provides the [`Identity`] record, the file-backed [`IdentityStore`]
//! that persists identities to a protected `identities.json`, and
//! importers that turn vendor-exported files into identity records.

pub mod config;
pub mod error;
pub mod identity;
pub mod import;
pub mod storage;

// Re-export primary types
pub use error::{IdentityError, Result};
pub use identity::{Identity, IdentityChange, IdentityField, IdentityFields};
pub use import::{IamCsvParser, IdentityParser};
pub use storage::{IdentityInput, IdentityStore};
