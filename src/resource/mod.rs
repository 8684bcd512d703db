//! Resource descriptors
//!
//! A [`ResourceDescriptor`] is everything the generic list and form need to
//! manage one collection: endpoint, labels, codec, field table and the
//! optional asset slot.

pub mod catalog;
pub mod field;

use crate::codec::{EntityCodec, FlatteningCodec};
use std::fmt;
use std::sync::Arc;

pub use field::{FieldKind, FieldSpec, SelectOption};

/// Binary asset owned by the records of a collection (menu image).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSlot {
    /// Record field holding the asset reference.
    pub field: String,
    /// Upload endpoint relative to the API root.
    pub upload_path: String,
    /// Multipart form field name.
    pub multipart_field: String,
    /// Message when submitting without any asset.
    pub missing_message: String,
}

impl AssetSlot {
    pub fn image(collection: &str) -> Self {
        Self {
            field: "image".to_string(),
            upload_path: format!("{}/upload", collection),
            multipart_field: "image".to_string(),
            missing_message: "Please upload an image!".to_string(),
        }
    }
}

/// Table column shown by the list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub field: String,
    pub title: String,
}

impl Column {
    pub fn new(field: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            title: title.into(),
        }
    }
}

pub struct ResourceDescriptor {
    /// Collection path segment, e.g. `roles`.
    pub collection: String,
    /// Singular display name, e.g. `Role`.
    pub label: String,
    pub codec: Arc<dyn EntityCodec>,
    pub fields: Vec<FieldSpec>,
    pub columns: Vec<Column>,
    pub asset: Option<AssetSlot>,
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("collection", &self.collection)
            .field("label", &self.label)
            .field("fields", &self.fields.len())
            .field("asset", &self.asset)
            .finish()
    }
}

impl ResourceDescriptor {
    pub fn new(collection: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            label: label.into(),
            codec: Arc::new(FlatteningCodec::new()),
            fields: Vec::new(),
            columns: vec![Column::new("id", "ID")],
            asset: None,
        }
    }

    pub fn codec(mut self, codec: impl EntityCodec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn column(mut self, field: impl Into<String>, title: impl Into<String>) -> Self {
        self.columns.push(Column::new(field, title));
        self
    }

    pub fn asset(mut self, slot: AssetSlot) -> Self {
        self.asset = Some(slot);
        self
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields shown for the given form mode.
    pub fn visible_fields(&self, editing: bool) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(move |f| !(editing && f.create_only))
    }

    pub fn collection_path(&self) -> String {
        self.collection.clone()
    }

    /// Path of one record. The id is percent-encoded as a single segment.
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.collection, encode_segment(id))
    }

    pub fn fetch_failed_message(&self) -> String {
        format!("Failed to fetch {}", self.collection)
    }

    pub fn delete_failed_message(&self) -> String {
        format!("Failed to delete {}", self.label.to_lowercase())
    }

    pub fn created_message(&self) -> String {
        format!("{} added successfully", self.label)
    }

    pub fn updated_message(&self) -> String {
        format!("{} updated successfully", self.label)
    }

    pub fn deleted_message(&self) -> String {
        format!("{} deleted successfully", self.label)
    }

    pub fn delete_prompt(&self) -> String {
        format!("Are you sure you want to delete this {}?", self.label.to_lowercase())
    }
}

fn encode_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
