//! Storage layer for the identity registry.
//!
//! All identities live in a single protected JSON file inside the
//! configuration directory:
//!
//! ```text
//! ~/.aws-identity-manager/
//! └── identities.json      (mode 0600)
//! ```
//!
//! File format:
//! ```json
//! {
//!     "alice": {
//!         "id": "alice",
//!         "name": "alice",
//!         "access_key_id": "AKIA...",
//!         "secret_access_key": "..."
//!     }
//! }
//! ```
//!
//! Object keys are informational only; on load the index is re-derived
//! from each record's `id`.
//!
//! # Modules
//!
//! - [`identity_store`] — the in-memory registry and its persistence.
//! - [`protected_file`] — owner-only file writes.

pub mod identity_store;
pub mod protected_file;

pub use identity_store::{IdentityInput, IdentityStore};
