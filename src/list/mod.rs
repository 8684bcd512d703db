//! Collection list view
//!
//! Owns the displayed snapshot and exactly one form. The snapshot is only
//! ever replaced by a fresh fetch; mutations go to the server and are
//! followed by a reload instead of local patching.

use crate::codec::{check_status_payload, decode_collection};
use crate::core::{ConsoleError, FieldError, Notice, Notices, Record, Result, record_id};
use crate::form::{FormEvent, MISSING_IDENTIFIER_MESSAGE, ResourceForm};
use crate::resource::ResourceDescriptor;
use crate::transport::SharedTransport;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One collection fetch, detached from the list so it can be spawned.
#[derive(Clone)]
pub struct SnapshotRequest {
    descriptor: Arc<ResourceDescriptor>,
    transport: SharedTransport,
}

impl SnapshotRequest {
    pub async fn run(self) -> Result<Vec<Record>> {
        let descriptor = self.descriptor;
        let body = self.transport.get(&descriptor.collection_path()).await.map_err(|e| {
            warn!(collection = %descriptor.collection, error = %e, "collection fetch failed");
            ConsoleError::FetchFailed(e.message_or(&descriptor.fetch_failed_message()))
        })?;

        let rows = decode_collection(body).map_err(|rejection| {
            warn!(collection = %descriptor.collection, "unexpected collection payload");
            ConsoleError::FetchFailed(rejection.message_or(&descriptor.fetch_failed_message()))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| descriptor.codec.normalize_identifier(row))
            .collect())
    }
}

/// A confirmed delete, detached from the list so it can be spawned.
#[derive(Clone)]
pub struct DeleteRequest {
    descriptor: Arc<ResourceDescriptor>,
    transport: SharedTransport,
    id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    pub id: String,
    pub result: std::result::Result<(), String>,
}

impl DeleteRequest {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn run(self) -> DeleteResult {
        let descriptor = self.descriptor;
        debug!(collection = %descriptor.collection, id = %self.id, "deleting record");

        let result = match self.transport.delete(&descriptor.item_path(&self.id)).await {
            Ok(body) => check_status_payload(body)
                .map(|_| ())
                .map_err(|r| r.message_or(&descriptor.delete_failed_message())),
            Err(err) => Err(err.message_or(&descriptor.delete_failed_message())),
        };

        DeleteResult { id: self.id, result }
    }
}

/// Row awaiting the user's delete confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDelete {
    pub id: String,
    pub row: Record,
}

pub struct ResourceList {
    descriptor: Arc<ResourceDescriptor>,
    transport: SharedTransport,
    rows: Vec<Record>,
    in_flight: usize,
    form: ResourceForm,
    pending_delete: Option<PendingDelete>,
    notices: Notices,
}

impl ResourceList {
    pub fn new(descriptor: Arc<ResourceDescriptor>, transport: SharedTransport) -> Self {
        Self {
            form: ResourceForm::new(Arc::clone(&descriptor)),
            descriptor,
            transport,
            rows: Vec::new(),
            in_flight: 0,
            pending_delete: None,
            notices: Notices::new(),
        }
    }

    pub fn descriptor(&self) -> &Arc<ResourceDescriptor> {
        &self.descriptor
    }

    pub fn transport(&self) -> &SharedTransport {
        &self.transport
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn form(&self) -> &ResourceForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ResourceForm {
        &mut self.form
    }

    pub fn pending_delete(&self) -> Option<&PendingDelete> {
        self.pending_delete.as_ref()
    }

    /// Notices from the list and its form, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        let mut notices = self.notices.drain();
        notices.extend(self.form.take_notices());
        notices
    }

    /// Starts a fetch. Pair with [`ResourceList::apply_snapshot`].
    pub fn snapshot_request(&mut self) -> SnapshotRequest {
        self.in_flight += 1;
        SnapshotRequest {
            descriptor: Arc::clone(&self.descriptor),
            transport: Arc::clone(&self.transport),
        }
    }

    /// Replaces the snapshot, or keeps the old one and reports the failure.
    ///
    /// Overlapping fetches are not coalesced: whichever result is applied
    /// last is what the list shows.
    pub fn apply_snapshot(&mut self, result: Result<Vec<Record>>) -> Result<usize> {
        self.in_flight = self.in_flight.saturating_sub(1);

        match result {
            Ok(rows) => {
                debug!(collection = %self.descriptor.collection, rows = rows.len(), "snapshot replaced");
                self.rows = rows;
                Ok(self.rows.len())
            }
            Err(err) => {
                self.notices.push(Notice::error(err.user_message()));
                Err(err)
            }
        }
    }

    /// Fetches the whole collection and replaces the snapshot.
    pub async fn load(&mut self) -> Result<usize> {
        let request = self.snapshot_request();
        let result = request.run().await;
        self.apply_snapshot(result)
    }

    /// Opens the form for a new record. No-op while a form is open.
    pub fn open_create(&mut self) -> bool {
        self.form.open_create()
    }

    /// Opens the form for `row`. Identifier-less rows are refused.
    pub fn open_edit(&mut self, row: &Record) -> Result<bool> {
        self.form.open_edit(row).inspect_err(|err| {
            self.notices.push(Notice::error(err.user_message()));
        })
    }

    pub fn open_edit_at(&mut self, index: usize) -> Result<bool> {
        match self.rows.get(index).cloned() {
            Some(row) => self.open_edit(&row),
            None => Ok(false),
        }
    }

    pub fn cancel_form(&mut self) {
        self.form.cancel();
    }

    /// Closes the form and re-derives the snapshot from the server.
    pub async fn on_form_succeeded(&mut self) -> Result<usize> {
        self.form.cancel();
        self.load().await
    }

    /// Submits the open form; a successful mutation triggers one reload.
    pub async fn submit_form(&mut self) -> Result<FormEvent> {
        let transport = Arc::clone(&self.transport);
        let event = self.form.submit(transport.as_ref()).await?;

        if matches!(event, FormEvent::Succeeded { .. }) {
            // A failed reload is already reported as a notice; the mutation
            // itself succeeded.
            let _ = self.on_form_succeeded().await;
        }
        Ok(event)
    }

    /// First step of a delete: remember the row and wait for confirmation.
    pub fn request_delete(&mut self, row: &Record) -> Result<()> {
        let Some(id) = record_id(row) else {
            let err = ConsoleError::validation(FieldError::form(MISSING_IDENTIFIER_MESSAGE));
            self.notices.push(Notice::error(err.user_message()));
            return Err(err);
        };

        self.pending_delete = Some(PendingDelete {
            id,
            row: row.clone(),
        });
        Ok(())
    }

    pub fn request_delete_at(&mut self, index: usize) -> Result<()> {
        match self.rows.get(index).cloned() {
            Some(row) => self.request_delete(&row),
            None => Ok(()),
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Consumes the pending confirmation. `None` when nothing was requested.
    pub fn begin_delete(&mut self) -> Option<DeleteRequest> {
        let pending = self.pending_delete.take()?;
        Some(DeleteRequest {
            descriptor: Arc::clone(&self.descriptor),
            transport: Arc::clone(&self.transport),
            id: pending.id,
        })
    }

    /// Reports a delete outcome. `Ok(())` means the caller should reload.
    pub fn finish_delete(&mut self, result: DeleteResult) -> Result<()> {
        match result.result {
            Ok(()) => {
                info!(collection = %self.descriptor.collection, id = %result.id, "record deleted");
                self.notices.push(Notice::success(self.descriptor.deleted_message()));
                Ok(())
            }
            Err(message) => {
                self.notices.push(Notice::error(message.clone()));
                Err(ConsoleError::MutationRejected(message))
            }
        }
    }

    /// Deletes the confirmed row, then reloads on success.
    ///
    /// Without a prior [`ResourceList::request_delete`] nothing is sent.
    pub async fn confirm_delete(&mut self) -> Result<bool> {
        let Some(request) = self.begin_delete() else {
            return Ok(false);
        };

        let result = request.run().await;
        self.finish_delete(result)?;
        let _ = self.load().await;
        Ok(true)
    }
}

impl std::fmt::Debug for ResourceList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceList")
            .field("collection", &self.descriptor.collection)
            .field("rows", &self.rows.len())
            .field("in_flight", &self.in_flight)
            .field("form", &self.form.phase())
            .field("pending_delete", &self.pending_delete)
            .finish()
    }
}
