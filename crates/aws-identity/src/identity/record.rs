//! The identity record — one named AWS credential set.
//!
//! An identity is keyed by `id`, which defaults to its `name`. The
//! keyed fields (`id` and `name`) can only be changed through setters
//! that return an [`IdentityChange`], which the owning store consumes
//! to keep its index correct.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use super::change::{IdentityChange, IdentityField};
use crate::error::{IdentityError, Result};

// ── Field names ───────────────────────────────────────────────────────────────

const FIELD_ID: &str = "id";
const FIELD_NAME: &str = "name";
const FIELD_ACCESS_KEY_ID: &str = "access_key_id";
const FIELD_SECRET_ACCESS_KEY: &str = "secret_access_key";

/// Number of trailing secret characters left visible when masking.
const VISIBLE_SECRET_CHARS: usize = 4;

// ── IdentityFields ────────────────────────────────────────────────────────────

/// Typed field mapping an identity is constructed from.
///
/// This is what importers produce. `id` is optional; when absent the
/// identity is keyed by `name`.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityFields {
    pub name: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub id: Option<String>,
}

impl IdentityFields {
    /// Build a field mapping without an explicit id.
    pub fn new(
        name: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            id: None,
        }
    }

    /// Set an explicit id distinct from the name.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl fmt::Debug for IdentityFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityFields")
            .field("name", &self.name)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &mask_secret(&self.secret_access_key))
            .field("id", &self.id)
            .finish()
    }
}

// ── Identity ──────────────────────────────────────────────────────────────────

/// A named AWS credential set.
///
/// Equality is structural over all four fields. The `Debug` output masks
/// the secret access key. Records are read back through
/// [`Identity::from_value`], which validates each field.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Key the identity is stored under.
    pub id: String,
    /// Human-readable label.
    pub name: String,
    /// AWS access key id.
    pub access_key_id: String,
    /// AWS secret access key.
    pub secret_access_key: String,
}

impl Identity {
    /// Create an identity keyed by its name.
    pub fn new(
        name: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self::from_fields(IdentityFields::new(name, access_key_id, secret_access_key))
    }

    /// Create an identity from a typed field mapping.
    ///
    /// If `fields.id` is `None` the id is set equal to the name.
    pub fn from_fields(fields: IdentityFields) -> Self {
        let id = fields.id.unwrap_or_else(|| fields.name.clone());
        Self {
            id,
            name: fields.name,
            access_key_id: fields.access_key_id,
            secret_access_key: fields.secret_access_key,
        }
    }

    /// Reconstruct an identity from an untyped JSON mapping.
    ///
    /// The value must be an object carrying string `name`,
    /// `access_key_id` and `secret_access_key` fields, plus an optional
    /// string `id`. Unknown fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::MalformedRecord` naming the first field
    /// that is missing or not a string.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            IdentityError::MalformedRecord(format!(
                "expected a JSON object, found {}",
                json_kind(value)
            ))
        })?;

        let fields = IdentityFields {
            name: required_str(object, FIELD_NAME)?,
            access_key_id: required_str(object, FIELD_ACCESS_KEY_ID)?,
            secret_access_key: required_str(object, FIELD_SECRET_ACCESS_KEY)?,
            id: optional_str(object, FIELD_ID)?,
        };

        Ok(Self::from_fields(fields))
    }

    /// Serialize to the plain JSON mapping used in `identities.json`.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::SerializationError` if encoding fails.
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| IdentityError::SerializationError(e.to_string()))
    }

    /// Change the id, returning the event the owning store must consume.
    pub fn set_id(&mut self, id: impl Into<String>) -> IdentityChange {
        let new = id.into();
        let old = std::mem::replace(&mut self.id, new.clone());
        self.change(IdentityField::Id, old, new)
    }

    /// Change the name, returning the event the owning store must consume.
    ///
    /// The id is left untouched: once registered, an identity keeps its
    /// key until `set_id` is called.
    pub fn set_name(&mut self, name: impl Into<String>) -> IdentityChange {
        let new = name.into();
        let old = std::mem::replace(&mut self.name, new.clone());
        self.change(IdentityField::Name, old, new)
    }

    /// Replace the access key id.
    pub fn set_access_key_id(&mut self, access_key_id: impl Into<String>) {
        self.access_key_id = access_key_id.into();
    }

    /// Replace the secret access key.
    pub fn set_secret_access_key(&mut self, secret_access_key: impl Into<String>) {
        self.secret_access_key = secret_access_key.into();
    }

    /// The secret access key with all but its last few characters hidden.
    pub fn masked_secret(&self) -> String {
        mask_secret(&self.secret_access_key)
    }

    fn change(&self, field: IdentityField, old: String, new: String) -> IdentityChange {
        IdentityChange {
            identity: self.clone(),
            field,
            old,
            new,
        }
    }
}

impl From<IdentityFields> for Identity {
    fn from(fields: IdentityFields) -> Self {
        Self::from_fields(fields)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.masked_secret())
            .finish()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.id == self.name {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.id, self.name)
        }
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn required_str(object: &Map<String, Value>, field: &str) -> Result<String> {
    match object.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(IdentityError::MalformedRecord(format!(
            "field `{field}` must be a string, found {}",
            json_kind(other)
        ))),
        None => Err(IdentityError::MalformedRecord(format!(
            "missing required field `{field}`"
        ))),
    }
}

fn optional_str(object: &Map<String, Value>, field: &str) -> Result<Option<String>> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(IdentityError::MalformedRecord(format!(
            "field `{field}` must be a string, found {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn mask_secret(secret: &str) -> String {
    let len = secret.chars().count();
    if len <= VISIBLE_SECRET_CHARS {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(len - VISIBLE_SECRET_CHARS).collect();
    format!("****{tail}")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
