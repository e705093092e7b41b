//! Change events emitted when a keyed identity field is mutated.

use std::fmt;

use super::record::Identity;

/// The identity fields whose mutation is reported to the owning store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityField {
    /// The key the store indexes the identity under.
    Id,
    /// The human-readable label.
    Name,
}

impl IdentityField {
    /// Field name as it appears in the persisted JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityField::Id => "id",
            IdentityField::Name => "name",
        }
    }
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured record of one field mutation.
///
/// `identity` is a snapshot of the record *after* the change, so a store
/// consuming the event can re-index it without holding a reference to the
/// caller's copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityChange {
    pub identity: Identity,
    pub field: IdentityField,
    pub old: String,
    pub new: String,
}

impl IdentityChange {
    /// Return `true` if the change moves the identity to a different key.
    pub fn is_rekey(&self) -> bool {
        self.field == IdentityField::Id && self.old != self.new
    }
}
