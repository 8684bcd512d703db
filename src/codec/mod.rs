//! Wire shape <-> form shape translation
//!
//! Each collection gets an [`EntityCodec`]. The stock [`FlatteningCodec`]
//! covers what the backend needs today: identifier normalization, structural
//! defaults for new records, and nested objects that the form edits as
//! separate inputs.

pub mod envelope;

use crate::core::record::id_value;
use crate::core::{FieldMap, ID_FIELD, LEGACY_ID_FIELD, Record};
use serde_json::{Map, Value};
use std::fmt;

pub use envelope::{EnvelopeRejection, check_status_payload, decode_collection, decode_upload};

/// Per-collection translation between wire records and form drafts.
pub trait EntityCodec: Send + Sync + fmt::Debug {
    /// Guarantees the canonical `id` field when the record carries any identifier.
    fn normalize_identifier(&self, record: Record) -> Record {
        normalize_identifier(record)
    }

    /// Draft for a new record (`None`) or for editing an existing one.
    fn to_form_values(&self, record: Option<&Record>) -> FieldMap;

    /// Request body built from a draft. Never contains an identifier.
    fn to_wire_payload(&self, values: &FieldMap) -> Record;
}

/// Copies `_id` into `id` when `id` is missing or blank.
///
/// Mongo-style `{"$oid": "..."}` identifiers are unwrapped. A record with
/// neither field is returned untouched and stays identifier-less.
pub fn normalize_identifier(mut record: Record) -> Record {
    if record.get(ID_FIELD).and_then(id_value).is_some() {
        return record;
    }

    let legacy = record.get(LEGACY_ID_FIELD).and_then(|value| match value {
        Value::Object(inner) => inner.get("$oid").and_then(id_value),
        other => id_value(other),
    });

    if let Some(id) = legacy {
        record.insert(ID_FIELD.to_string(), Value::String(id));
    }
    record
}

/// A nested wire object edited as independent flat fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeField {
    /// Field name on the wire, e.g. `cookingTime`.
    pub wire: String,
    /// `(nested key, flat form field)` pairs, e.g. `("prep", "cookingTimePrep")`.
    pub parts: Vec<(String, String)>,
}

impl CompositeField {
    pub fn new(wire: impl Into<String>) -> Self {
        Self {
            wire: wire.into(),
            parts: Vec::new(),
        }
    }

    pub fn part(mut self, nested: impl Into<String>, flat: impl Into<String>) -> Self {
        self.parts.push((nested.into(), flat.into()));
        self
    }

    pub fn flat_fields(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(_, flat)| flat.as_str())
    }

    fn flatten_into(&self, values: &mut FieldMap) {
        let Some(Value::Object(nested)) = values.get(&self.wire) else {
            // Non-object values stay under the wire key untouched.
            return;
        };
        if !self.parts.iter().any(|(key, _)| nested.contains_key(key)) {
            // Nothing to split out; the object itself stays on the wire key.
            return;
        }
        let nested = nested.clone();
        values.remove(&self.wire);

        for (key, flat) in &self.parts {
            if let Some(value) = nested.get(key) {
                values.insert(flat.clone(), value.clone());
            }
        }
    }

    fn unflatten_into(&self, payload: &mut Record) {
        let mut nested = Map::new();
        for (key, flat) in &self.parts {
            if let Some(value) = payload.remove(flat) {
                nested.insert(key.clone(), value);
            }
        }

        if !nested.is_empty() {
            payload.insert(self.wire.clone(), Value::Object(nested));
        }
    }
}

/// Stock codec: defaults for new drafts plus composite flattening.
#[derive(Debug, Clone, Default)]
pub struct FlatteningCodec {
    defaults: FieldMap,
    composites: Vec<CompositeField>,
}

impl FlatteningCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Structural default applied when a draft lacks the field.
    pub fn default_value(mut self, field: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(field.into(), value);
        self
    }

    pub fn composite(mut self, composite: CompositeField) -> Self {
        self.composites.push(composite);
        self
    }

    pub fn composites(&self) -> &[CompositeField] {
        &self.composites
    }
}

impl EntityCodec for FlatteningCodec {
    fn to_form_values(&self, record: Option<&Record>) -> FieldMap {
        let mut values = record.cloned().unwrap_or_default();

        for composite in &self.composites {
            composite.flatten_into(&mut values);
        }

        for (field, value) in &self.defaults {
            values.entry(field.clone()).or_insert_with(|| value.clone());
        }

        values
    }

    fn to_wire_payload(&self, values: &FieldMap) -> Record {
        let mut payload = values.clone();
        payload.remove(ID_FIELD);
        payload.remove(LEGACY_ID_FIELD);

        for composite in &self.composites {
            composite.unflatten_into(&mut payload);
        }

        payload
    }
}
