//! # Document Model
//!
//! The shape of what a document store holds and the field-level write
//! operations it accepts. Backends share [`Document::apply`] so every store
//! gives identical semantics for `ArrayUnion`, `Increment`, etc.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// A stored document: server-assigned id, a version bumped on every write,
/// and schemaless JSON fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    /// Starts at 1 on creation; incremented once per applied update request.
    pub version: u64,
    pub fields: Map<String, Value>,
}

/// Address of a (possibly nested) field, e.g. `features` -> `<userId>`.
///
/// Segments are kept separate so user ids containing dots never need escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new(root: impl Into<String>) -> Self {
        Self(vec![root.into()])
    }

    pub fn child(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for FieldPath {
    fn from(root: &str) -> Self {
        Self::new(root)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// A single field-level write primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Replace the value wholesale.
    Set(Value),
    /// Set to the store's current time (RFC 3339, UTC).
    ServerTimestamp,
    /// Append each element not already present.
    ArrayUnion(Vec<Value>),
    /// Append every element, duplicates included.
    ArrayAppend(Vec<Value>),
    /// Remove every occurrence of each element.
    ArrayRemove(Vec<Value>),
    /// Add to an integer field; a missing field counts as zero.
    Increment(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub path: FieldPath,
    pub op: FieldOp,
}

impl FieldUpdate {
    pub fn new(path: impl Into<FieldPath>, op: FieldOp) -> Self {
        Self { path: path.into(), op }
    }

    pub fn set(path: impl Into<FieldPath>, value: Value) -> Self {
        Self::new(path, FieldOp::Set(value))
    }

    pub fn server_timestamp(path: impl Into<FieldPath>) -> Self {
        Self::new(path, FieldOp::ServerTimestamp)
    }

    pub fn array_union(path: impl Into<FieldPath>, values: Vec<Value>) -> Self {
        Self::new(path, FieldOp::ArrayUnion(values))
    }

    pub fn array_append(path: impl Into<FieldPath>, values: Vec<Value>) -> Self {
        Self::new(path, FieldOp::ArrayAppend(values))
    }

    pub fn array_remove(path: impl Into<FieldPath>, values: Vec<Value>) -> Self {
        Self::new(path, FieldOp::ArrayRemove(values))
    }

    pub fn increment(path: impl Into<FieldPath>, by: i64) -> Self {
        Self::new(path, FieldOp::Increment(by))
    }
}

/// One atomic write: all updates apply or none do.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateRequest {
    pub updates: Vec<FieldUpdate>,
    /// When set, the write is rejected unless the document is at exactly this version.
    pub expected_version: Option<u64>,
}

impl UpdateRequest {
    pub fn new(updates: Vec<FieldUpdate>) -> Self {
        Self { updates, expected_version: None }
    }

    pub fn if_version(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }
}

impl Document {
    /// Builds a fresh document (version 1) from creation writes.
    pub fn create(id: impl Into<String>, updates: &[FieldUpdate], now: DateTime<Utc>) -> Result<Self, StoreError> {
        let mut fields = Map::new();
        apply_all(&mut fields, updates, now)?;
        Ok(Self { id: id.into(), version: 1, fields })
    }

    /// Applies `updates` all-or-nothing and bumps the version.
    pub fn apply(&mut self, updates: &[FieldUpdate], now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut next = self.fields.clone();
        apply_all(&mut next, updates, now)?;
        self.fields = next;
        self.version += 1;
        Ok(())
    }
}

fn apply_all(fields: &mut Map<String, Value>, updates: &[FieldUpdate], now: DateTime<Utc>) -> Result<(), StoreError> {
    for update in updates {
        let slot = slot_mut(fields, &update.path)?;
        apply_one(slot, update, now)?;
    }
    Ok(())
}

/// Walks to the addressed slot, creating intermediate maps. A fresh slot holds `Null`.
fn slot_mut<'a>(fields: &'a mut Map<String, Value>, path: &FieldPath) -> Result<&'a mut Value, StoreError> {
    let (last, parents) = path
        .segments()
        .split_last()
        .ok_or_else(|| invalid(path, "empty field path"))?;

    let mut map = fields;
    for segment in parents {
        let next = map.entry(segment.clone()).or_insert_with(|| Value::Object(Map::new()));
        if next.is_null() {
            *next = Value::Object(Map::new());
        }
        map = match next {
            Value::Object(inner) => inner,
            _ => return Err(invalid(path, format!("'{segment}' is not a map"))),
        };
    }
    Ok(map.entry(last.clone()).or_insert(Value::Null))
}

fn apply_one(slot: &mut Value, update: &FieldUpdate, now: DateTime<Utc>) -> Result<(), StoreError> {
    match &update.op {
        FieldOp::Set(value) => *slot = value.clone(),
        FieldOp::ServerTimestamp => {
            *slot = Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true));
        }
        FieldOp::ArrayUnion(values) => {
            let mut items = take_array(slot, &update.path)?;
            for value in values {
                if !items.contains(value) {
                    items.push(value.clone());
                }
            }
            *slot = Value::Array(items);
        }
        FieldOp::ArrayAppend(values) => {
            let mut items = take_array(slot, &update.path)?;
            items.extend(values.iter().cloned());
            *slot = Value::Array(items);
        }
        FieldOp::ArrayRemove(values) => {
            let mut items = take_array(slot, &update.path)?;
            items.retain(|item| !values.contains(item));
            *slot = Value::Array(items);
        }
        FieldOp::Increment(by) => {
            let current = match slot {
                Value::Null => 0,
                Value::Number(n) => n
                    .as_i64()
                    .ok_or_else(|| invalid(&update.path, "not an integer"))?,
                _ => return Err(invalid(&update.path, "not a number")),
            };
            let next = current
                .checked_add(*by)
                .ok_or_else(|| invalid(&update.path, "integer overflow"))?;
            *slot = Value::from(next);
        }
    }
    Ok(())
}

fn take_array(slot: &mut Value, path: &FieldPath) -> Result<Vec<Value>, StoreError> {
    match slot.take() {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items),
        _ => Err(invalid(path, "not an array")),
    }
}

fn invalid(path: &FieldPath, reason: impl Into<String>) -> StoreError {
    StoreError::InvalidField { path: path.to_string(), reason: reason.into() }
}
