use crate::codec::{decode_collection, normalize_identifier};
use crate::core::{Record, record_id};
use crate::resource::{ResourceDescriptor, SelectOption};
use crate::transport::{SharedTransport, Transport};
use futures::future::join_all;
use serde_json::Value;
use tracing::warn;

/// Fetch of the collections feeding select inputs.
#[derive(Debug, Clone)]
pub struct OptionsRequest {
    sources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionsResult {
    pub loaded: Vec<(String, Vec<SelectOption>)>,
    pub failures: Vec<String>,
}

impl OptionsRequest {
    pub fn new(descriptor: &ResourceDescriptor) -> Self {
        let mut sources: Vec<String> = Vec::new();
        for field in &descriptor.fields {
            if let Some(source) = field.kind.option_source() {
                if !sources.iter().any(|s| s == source) {
                    sources.push(source.to_string());
                }
            }
        }
        Self { sources }
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub async fn run(self, transport: SharedTransport) -> OptionsResult {
        self.execute(transport.as_ref()).await
    }

    /// Fetches every source concurrently; results keep source order.
    pub async fn execute(self, transport: &dyn Transport) -> OptionsResult {
        let fetches = self.sources.into_iter().map(|source| async move {
            let rows = match transport.get(&source).await {
                Ok(body) => decode_collection(body).map_err(|r| r.message),
                Err(err) => Err(err.server_message().map(str::to_string)),
            };
            (source, rows)
        });

        let mut result = OptionsResult::default();
        for (source, rows) in join_all(fetches).await {
            match rows {
                Ok(rows) => {
                    let options = rows.into_iter().filter_map(to_option).collect();
                    result.loaded.push((source, options));
                }
                Err(message) => {
                    warn!(source = %source, "failed to load select options");
                    result
                        .failures
                        .push(message.unwrap_or_else(|| format!("Failed to fetch {}", source)));
                }
            }
        }

        result
    }
}

fn to_option(row: Record) -> Option<SelectOption> {
    let row = normalize_identifier(row);
    let id = record_id(&row)?;
    let label = ["name", "title", "username"]
        .iter()
        .find_map(|key| row.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| id.clone());
    Some(SelectOption { id, label })
}
