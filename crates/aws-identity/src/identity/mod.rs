//! Identity records — one named AWS credential set each.
//!
//! The identity module provides the `Identity` type, the typed
//! `IdentityFields` mapping it is built from, and the `IdentityChange`
//! events its keyed setters return.

pub mod change;
pub mod record;

pub use change::{IdentityChange, IdentityField};
pub use record::{Identity, IdentityFields};
