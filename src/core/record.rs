use serde_json::{Map, Value};

/// Canonical identifier field exposed after normalization.
pub const ID_FIELD: &str = "id";
/// Identifier field used by document-store backends.
pub const LEGACY_ID_FIELD: &str = "_id";

/// A record as the backend returns it (or as the list displays it).
pub type Record = Map<String, Value>;

/// Flat field values edited by a form.
pub type FieldMap = Map<String, Value>;

/// Returns the normalized identifier of a record, if it has one.
///
/// Only the canonical `id` field is consulted; run the record through
/// `EntityCodec::normalize_identifier` first. Numeric ids are rendered as
/// strings, empty strings count as absent.
pub fn record_id(record: &Record) -> Option<String> {
    id_value(record.get(ID_FIELD)?)
}

pub(crate) fn id_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// True for values the form treats as "not filled in".
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}
