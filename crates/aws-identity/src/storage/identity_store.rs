//! Identity registry — the in-memory index of identities and its
//! persistence to `identities.json`.
//!
//! The store is the sole writer of the identities file. Every mutation
//! made outside of [`IdentityStore::load`] is flushed to disk before the
//! call returns.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_json::{Map, Value};

use super::protected_file::write_protected;
use crate::config::{default_config_dir, IDENTITIES_FILE};
use crate::error::{IdentityError, Result};
use crate::identity::{Identity, IdentityChange, IdentityFields};

// ── IdentityInput ─────────────────────────────────────────────────────────────

/// Anything `add_identity` can register.
#[derive(Debug, Clone)]
pub enum IdentityInput {
    /// An already-constructed record.
    Record(Identity),
    /// A typed field mapping, as produced by importers.
    Fields(IdentityFields),
    /// An untyped JSON mapping, as read from `identities.json`.
    Raw(Value),
}

impl IdentityInput {
    /// Convert into an `Identity`, validating raw input.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::MalformedRecord` if raw input is missing a
    /// required field.
    pub fn into_identity(self) -> Result<Identity> {
        match self {
            IdentityInput::Record(identity) => Ok(identity),
            IdentityInput::Fields(fields) => Ok(Identity::from_fields(fields)),
            IdentityInput::Raw(value) => Identity::from_value(&value),
        }
    }
}

impl From<Identity> for IdentityInput {
    fn from(identity: Identity) -> Self {
        IdentityInput::Record(identity)
    }
}

impl From<IdentityFields> for IdentityInput {
    fn from(fields: IdentityFields) -> Self {
        IdentityInput::Fields(fields)
    }
}

impl From<Value> for IdentityInput {
    fn from(value: Value) -> Self {
        IdentityInput::Raw(value)
    }
}

// ── IdentityStore ─────────────────────────────────────────────────────────────

/// File-backed registry of identities keyed by `id`.
///
/// Every key in the registry equals the `id` of the identity stored under
/// it, and no two different identities share a key. Iteration is always
/// in ascending key order.
///
/// The store is safe for single-process use; concurrent writes from
/// multiple processes are not coordinated and the last writer wins.
#[derive(Debug)]
pub struct IdentityStore {
    config_dir: PathBuf,
    identities: BTreeMap<String, Identity>,
    /// Suppresses saves while hydrating from disk.
    loading: bool,
}

impl IdentityStore {
    /// Open the store rooted at `config_dir`, loading any persisted
    /// identities.
    ///
    /// A missing directory or identities file yields an empty store; the
    /// directory is only created by the first save.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidFileFormat` or
    /// `IdentityError::MalformedRecord` if the persisted file is corrupt,
    /// `IdentityError::Conflict` if it holds two different records with the
    /// same id, or `IdentityError::Io` for filesystem errors.
    pub fn open(config_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self {
            config_dir: config_dir.into(),
            identities: BTreeMap::new(),
            loading: false,
        };
        store.load()?;
        Ok(store)
    }

    /// Open the store at the default configuration directory.
    ///
    /// # Errors
    ///
    /// See [`default_config_dir`] and [`IdentityStore::open`].
    pub fn open_default() -> Result<Self> {
        Self::open(default_config_dir()?)
    }

    /// The directory holding `identities.json`.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Full path of the persisted identities file.
    pub fn identities_path(&self) -> PathBuf {
        self.config_dir.join(IDENTITIES_FILE)
    }

    // ── Persistence ───────────────────────────────────────────────────────────

    /// Read the identities file and register every record in it.
    ///
    /// Saving is suppressed for the duration of the load. Nested loads are
    /// not supported.
    ///
    /// # Errors
    ///
    /// See [`IdentityStore::open`].
    pub fn load(&mut self) -> Result<()> {
        let path = self.identities_path();
        if !path.exists() {
            debug!("no identities file at {}", path.display());
            return Ok(());
        }

        let bytes = std::fs::read(&path)?;
        let data: Map<String, Value> = serde_json::from_slice(&bytes).map_err(|e| {
            IdentityError::InvalidFileFormat(format!(
                "failed to parse identities file {}: {e}",
                path.display()
            ))
        })?;

        self.loading = true;
        let loaded = self.add_identities(data.into_iter().map(|(_, value)| value));
        self.loading = false;
        let count = loaded?;

        debug!("loaded {count} identities from {}", path.display());
        Ok(())
    }

    /// Write every identity to the identities file and restrict it to the
    /// owner.
    ///
    /// Creates the configuration directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::SerializationError` if JSON serialization
    /// fails, or `IdentityError::Io` for filesystem errors.
    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;

        let json = serde_json::to_string_pretty(&self.identities)
            .map_err(|e| IdentityError::SerializationError(e.to_string()))?;

        let path = self.identities_path();
        write_protected(&path, json.as_bytes())?;

        debug!("saved {} identities to {}", self.len(), path.display());
        Ok(())
    }

    // ── Registration ──────────────────────────────────────────────────────────

    /// Register one identity.
    ///
    /// Re-adding a record equal to the one already stored under its id is a
    /// no-op that returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Conflict` if a different record is already
    /// stored under the same id (the store is left unchanged),
    /// `IdentityError::MalformedRecord` for invalid raw input, or any error
    /// from [`IdentityStore::save`].
    pub fn add_identity(&mut self, input: impl Into<IdentityInput>) -> Result<&Identity> {
        let input: IdentityInput = input.into();
        let identity = input.into_identity()?;
        let (key, inserted) = self.insert(identity)?;

        if inserted && !self.loading {
            self.save()?;
        }

        self.identities
            .get(&key)
            .ok_or(IdentityError::NotFound(key))
    }

    /// Register several identities in order, saving once at the end.
    ///
    /// Returns how many identities were newly registered. If an item fails,
    /// the items registered before it are kept and saved, and the error is
    /// returned.
    ///
    /// # Errors
    ///
    /// See [`IdentityStore::add_identity`].
    pub fn add_identities<I, T>(&mut self, items: I) -> Result<usize>
    where
        I: IntoIterator<Item = T>,
        T: Into<IdentityInput>,
    {
        let mut inserted = 0;
        let mut outcome = Ok(());

        for item in items {
            let input: IdentityInput = item.into();
            match input
                .into_identity()
                .and_then(|identity| self.insert(identity))
            {
                Ok((_, true)) => inserted += 1,
                Ok((_, false)) => {}
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        if !self.loading {
            self.save()?;
        }

        outcome.map(|()| inserted)
    }

    /// Apply a change event produced by one of the record's setters.
    ///
    /// An `id` change moves the record from its old key to the new one; any
    /// other change replaces the stored record with the event's snapshot.
    /// The store is saved afterwards.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Conflict` if the new id is already held by a
    /// different record, or any error from [`IdentityStore::save`].
    ///
    /// A non-key change (a new name, or an id set to its current value) for
    /// an id this store does not hold is rejected with
    /// `IdentityError::NotFound` instead of silently registering the
    /// record; only `add_identity` registers new records.
    pub fn on_identity_change(&mut self, change: IdentityChange) -> Result<()> {
        let rekey = change.is_rekey();
        let IdentityChange {
            identity,
            field,
            old,
            new,
        } = change;

        if rekey {
            if let Some(existing) = self.identities.get(&new) {
                if *existing != identity {
                    return Err(IdentityError::Conflict {
                        identity: Box::new(identity),
                        existing: Box::new(existing.clone()),
                    });
                }
            }
            self.identities.remove(&old);
            info!("re-keyed identity {old} -> {new}");
        } else if !self.contains_key(&identity.id) {
            return Err(IdentityError::NotFound(identity.id));
        } else {
            debug!("identity {} changed {field}: {old} -> {new}", identity.id);
        }

        self.identities.insert(identity.id.clone(), identity);
        self.save()
    }

    /// Change the id of a stored identity.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::NotFound` if `old_id` is not registered, or
    /// any error from [`IdentityStore::on_identity_change`].
    pub fn rename(&mut self, old_id: &str, new_id: impl Into<String>) -> Result<&Identity> {
        let mut identity = self
            .identities
            .get(old_id)
            .cloned()
            .ok_or_else(|| IdentityError::NotFound(old_id.to_string()))?;

        let change = identity.set_id(new_id);
        let key = change.new.clone();
        self.on_identity_change(change)?;

        self.identities
            .get(&key)
            .ok_or(IdentityError::NotFound(key))
    }

    /// Remove an identity and save.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::NotFound` if `key` is not registered, or any
    /// error from [`IdentityStore::save`].
    pub fn remove(&mut self, key: &str) -> Result<Identity> {
        let removed = self
            .identities
            .remove(key)
            .ok_or_else(|| IdentityError::NotFound(key.to_string()))?;

        info!("removed identity {key}");
        self.save()?;
        Ok(removed)
    }

    // ── Lookup ────────────────────────────────────────────────────────────────

    /// Look up an identity by key.
    pub fn get(&self, key: &str) -> Option<&Identity> {
        self.identities.get(key)
    }

    /// Return `true` if an identity is registered under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.identities.contains_key(key)
    }

    /// Registered keys in ascending lexicographic order.
    pub fn keys(&self) -> Vec<&str> {
        self.identities.keys().map(String::as_str).collect()
    }

    /// Identities in ascending key order.
    pub fn values(&self) -> impl Iterator<Item = &Identity> + '_ {
        self.identities.values()
    }

    /// `(key, identity)` pairs in ascending key order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &Identity)> + '_ {
        self.identities.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of registered identities.
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// Return `true` if no identities are registered.
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// Insert without saving. Returns the key and whether a new record was
    /// added.
    fn insert(&mut self, identity: Identity) -> Result<(String, bool)> {
        match self.identities.entry(identity.id.clone()) {
            Entry::Occupied(entry) => {
                if *entry.get() == identity {
                    Ok((entry.key().clone(), false))
                } else {
                    Err(IdentityError::Conflict {
                        identity: Box::new(identity),
                        existing: Box::new(entry.get().clone()),
                    })
                }
            }
            Entry::Vacant(entry) => {
                let key = entry.key().clone();
                if !self.loading {
                    info!("registered identity {key}");
                }
                entry.insert(identity);
                Ok((key, true))
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
