// ============================================================================
// Admin Console Library
// ============================================================================

pub mod codec;
pub mod config;
pub mod core;
pub mod form;
pub mod list;
pub mod resource;
pub mod transport;
pub mod upload;
pub mod validation;

// Re-export main types for convenience
pub use config::ConsoleConfig;
pub use crate::core::{ConsoleError, FieldError, Notice, NoticeLevel, Record, Result, ValidationErrors};
pub use form::{FormEvent, FormPhase, ResourceForm};
pub use list::ResourceList;
pub use resource::{ResourceDescriptor, catalog};
pub use transport::{HttpTransport, SharedTransport, Transport, TransportError};
pub use upload::{StagedAsset, UploadStaging};

use std::sync::Arc;

// ============================================================================
// High-level Console API
// ============================================================================

/// One list per managed collection, sharing a single transport
///
/// # Examples
///
/// ```no_run
/// use admin_console::{AdminConsole, ConsoleConfig};
///
/// # async fn run() -> admin_console::Result<()> {
/// let console = AdminConsole::connect(ConsoleConfig::new("http://localhost:5000/api"))?;
/// let mut roles = console.list("roles").expect("roles are built in");
/// roles.load().await?;
/// println!("{} roles", roles.rows().len());
/// # Ok(())
/// # }
/// ```
pub struct AdminConsole {
    transport: SharedTransport,
    descriptors: Vec<Arc<ResourceDescriptor>>,
}

impl AdminConsole {
    /// HTTP transport with the built-in collections
    pub fn connect(config: ConsoleConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Any transport with the built-in collections
    pub fn with_transport(transport: SharedTransport) -> Self {
        Self {
            transport,
            descriptors: catalog::builtin(),
        }
    }

    /// Adds or replaces a collection
    pub fn register(&mut self, descriptor: ResourceDescriptor) {
        self.descriptors
            .retain(|d| d.collection != descriptor.collection);
        self.descriptors.push(Arc::new(descriptor));
    }

    pub fn descriptors(&self) -> &[Arc<ResourceDescriptor>] {
        &self.descriptors
    }

    pub fn transport(&self) -> &SharedTransport {
        &self.transport
    }

    /// A fresh list view for `collection`
    pub fn list(&self, collection: &str) -> Option<ResourceList> {
        self.descriptors
            .iter()
            .find(|d| d.collection == collection)
            .map(|d| ResourceList::new(Arc::clone(d), Arc::clone(&self.transport)))
    }

    /// Fresh list views for every collection, in registration order
    pub fn lists(&self) -> Vec<ResourceList> {
        self.descriptors
            .iter()
            .map(|d| ResourceList::new(Arc::clone(d), Arc::clone(&self.transport)))
            .collect()
    }
}
