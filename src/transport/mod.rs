//! HTTP transport seam
//!
//! The form and list never talk to `reqwest` directly. They go through the
//! [`Transport`] trait so that every request is a single round trip with a
//! JSON (or multipart) body and a JSON response, and so tests can count calls.

pub mod http;

use crate::upload::StagedAsset;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

pub use http::HttpTransport;

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Shared handle used by spawned request futures.
pub type SharedTransport = Arc<dyn Transport>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("server responded with status {status}")]
    Status {
        status: u16,
        message: Option<String>,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// The `message` field of the server's error body, when it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        }
    }

    /// Server message if present, otherwise `fallback`.
    pub fn message_or(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }
}

/// Minimal REST client contract consumed by forms and lists.
///
/// Paths are relative to the configured API root (`roles`, `roles/r1`,
/// `menus/upload`).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> TransportResult<Value>;

    async fn post(&self, path: &str, body: &Value) -> TransportResult<Value>;

    async fn put(&self, path: &str, body: &Value) -> TransportResult<Value>;

    async fn delete(&self, path: &str) -> TransportResult<Value>;

    /// Multipart upload of one file under `field`.
    async fn upload(&self, path: &str, field: &str, asset: &StagedAsset) -> TransportResult<Value>;
}
