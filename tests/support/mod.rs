/// Scripted in-memory transport for integration tests
///
/// Every request is recorded. Responses are queued per `(method, path)`;
/// an unscripted GET answers `[]`, anything else `{"success": true}`.
use admin_console::core::Record;
use admin_console::transport::{Transport, TransportError, TransportResult};
use admin_console::upload::StagedAsset;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
    pub file_name: Option<String>,
}

#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    scripted: Mutex<HashMap<(String, String), VecDeque<TransportResult<Value>>>>,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: &str, path: &str, response: TransportResult<Value>) {
        self.scripted
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back(response);
    }

    pub fn respond_ok(&self, method: &str, path: &str, body: Value) {
        self.respond(method, path, Ok(body));
    }

    pub fn respond_status(&self, method: &str, path: &str, status: u16, message: Option<&str>) {
        self.respond(
            method,
            path,
            Err(TransportError::Status {
                status,
                message: message.map(str::to_string),
            }),
        );
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|c| c.method == method).count()
    }

    pub fn calls_to(&self, method: &str, path: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn answer(&self, call: Call) -> TransportResult<Value> {
        let key = (call.method.to_string(), call.path.clone());
        let method = call.method;
        self.calls.lock().unwrap().push(call);

        let scripted = self
            .scripted
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);

        scripted.unwrap_or_else(|| match method {
            "GET" => Ok(json!([])),
            _ => Ok(json!({"success": true})),
        })
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn get(&self, path: &str) -> TransportResult<Value> {
        self.answer(Call {
            method: "GET",
            path: path.to_string(),
            body: None,
            file_name: None,
        })
    }

    async fn post(&self, path: &str, body: &Value) -> TransportResult<Value> {
        self.answer(Call {
            method: "POST",
            path: path.to_string(),
            body: Some(body.clone()),
            file_name: None,
        })
    }

    async fn put(&self, path: &str, body: &Value) -> TransportResult<Value> {
        self.answer(Call {
            method: "PUT",
            path: path.to_string(),
            body: Some(body.clone()),
            file_name: None,
        })
    }

    async fn delete(&self, path: &str) -> TransportResult<Value> {
        self.answer(Call {
            method: "DELETE",
            path: path.to_string(),
            body: None,
            file_name: None,
        })
    }

    async fn upload(&self, path: &str, _field: &str, asset: &StagedAsset) -> TransportResult<Value> {
        self.answer(Call {
            method: "UPLOAD",
            path: path.to_string(),
            body: None,
            file_name: Some(asset.file_name.clone()),
        })
    }
}

#[allow(dead_code)]
pub fn record(value: Value) -> Record {
    value.as_object().cloned().expect("record literal must be an object")
}
