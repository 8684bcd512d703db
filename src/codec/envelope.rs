//! Response envelope decoding
//!
//! Collections arrive either wrapped as `{ "success": true, "data": [...] }`
//! or, from older endpoints, as a bare array. Status payloads may report a
//! rejection with a 2xx code and `"success": false`.

use crate::core::Record;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// A body that parsed as JSON but does not describe a success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvelopeRejection {
    /// Server-provided `message`, if any.
    pub message: Option<String>,
}

impl EnvelopeRejection {
    fn from_body(body: &Value) -> Self {
        Self {
            message: body
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
                .map(str::to_string),
        }
    }

    pub fn message_or(&self, fallback: &str) -> String {
        self.message.clone().unwrap_or_else(|| fallback.to_string())
    }
}

fn reports_failure(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool) == Some(false)
}

/// Extracts the rows of a collection listing.
pub fn decode_collection(body: Value) -> Result<Vec<Record>, EnvelopeRejection> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let envelope = Value::Object(map.clone());
            if reports_failure(&envelope) {
                return Err(EnvelopeRejection::from_body(&envelope));
            }
            match map.remove("data") {
                Some(Value::Array(items)) => items,
                _ => return Err(EnvelopeRejection::from_body(&envelope)),
            }
        }
        _ => return Err(EnvelopeRejection::default()),
    };

    let total = items.len();
    let rows: Vec<Record> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    if rows.len() != total {
        warn!(skipped = total - rows.len(), "dropped non-object rows from collection");
    }

    Ok(rows)
}

/// Passes through a create/update/delete response unless it reports failure.
pub fn check_status_payload(body: Value) -> Result<Value, EnvelopeRejection> {
    if reports_failure(&body) {
        return Err(EnvelopeRejection::from_body(&body));
    }
    Ok(body)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadReceipt {
    #[serde(default)]
    success: bool,
    file_path: Option<String>,
}

/// Extracts `filePath` from an upload response.
pub fn decode_upload(body: &Value) -> Result<String, EnvelopeRejection> {
    let receipt =
        UploadReceipt::deserialize(body).map_err(|_| EnvelopeRejection::from_body(body))?;

    match receipt.file_path.filter(|p| !p.trim().is_empty()) {
        Some(path) if receipt.success => Ok(path),
        _ => Err(EnvelopeRejection::from_body(body)),
    }
}
