//! Pending asset staging
//!
//! A form session holds at most one file the user picked. Nothing is sent
//! until the submission's upload phase; a failed upload leaves the staged
//! file where it was so the user can retry.

use crate::codec::decode_upload;
use crate::core::{ConsoleError, Result};
use crate::resource::AssetSlot;
use crate::transport::Transport;
use std::path::Path;
use tracing::{debug, warn};

pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload image";

/// A file picked by the user, held in memory until upload.
#[derive(Clone, PartialEq, Eq)]
pub struct StagedAsset {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for StagedAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedAsset")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl StagedAsset {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk, inferring the content type from its extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = content_type_for(path).to_string();

        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// At most one pending asset per form session.
#[derive(Debug, Default)]
pub struct UploadStaging {
    pending: Option<StagedAsset>,
}

impl UploadStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was staged before. No network traffic.
    pub fn stage(&mut self, asset: StagedAsset) {
        if let Some(previous) = self.pending.replace(asset) {
            debug!(file = %previous.file_name, "replaced staged asset");
        }
    }

    /// Reads `path` and stages it.
    pub async fn stage_file(&mut self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let asset = StagedAsset::from_path(path).await?;
        self.stage(asset);
        Ok(())
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&StagedAsset> {
        self.pending.as_ref()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Uploads the staged asset and returns the server's reference.
    ///
    /// Staging is left untouched on failure. On success the caller decides
    /// when to clear it (after the owning record is persisted).
    pub async fn commit(&self, transport: &dyn Transport, slot: &AssetSlot) -> Result<String> {
        match &self.pending {
            Some(asset) => upload_asset(transport, slot, asset).await,
            None => Err(ConsoleError::UploadFailed(UPLOAD_FAILED_MESSAGE.to_string())),
        }
    }
}

/// One multipart request; `filePath` of a successful response is the reference.
pub async fn upload_asset(transport: &dyn Transport, slot: &AssetSlot, asset: &StagedAsset) -> Result<String> {
    debug!(path = %slot.upload_path, file = %asset.file_name, "uploading asset");

    let body = transport
        .upload(&slot.upload_path, &slot.multipart_field, asset)
        .await
        .map_err(|e| {
            warn!(error = %e, "asset upload failed");
            ConsoleError::UploadFailed(e.message_or(UPLOAD_FAILED_MESSAGE))
        })?;

    decode_upload(&body).map_err(|rejection| {
        warn!("asset upload rejected by server");
        ConsoleError::UploadFailed(rejection.message_or(UPLOAD_FAILED_MESSAGE))
    })
}
