//! Create/edit form state machine
//!
//! `Closed -> Open -> Submitting -> Closed`, with `Submitting -> Open` on any
//! upload or server failure. Each `open_*` starts a new session; results of a
//! submission from an older session, or arriving after the form was closed,
//! are discarded.

pub mod options;
pub mod submission;

use crate::core::{
    ConsoleError, FieldError, FieldMap, Notice, Notices, Record, Result, ValidationErrors, is_blank,
    record_id,
};
use crate::resource::{FieldKind, ResourceDescriptor, SelectOption};
use crate::transport::Transport;
use crate::upload::{StagedAsset, UploadStaging};
use crate::validation::validate_draft;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub use options::{OptionsRequest, OptionsResult};
pub use submission::{
    OPERATION_FAILED_MESSAGE, SubmissionOutcome, SubmissionResult, SubmitTarget, Submission,
    changed_fields,
};

pub const MISSING_IDENTIFIER_MESSAGE: &str = "This record has no identifier";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Closed,
    Open,
    Submitting,
}

/// Result of applying a submission to the form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    /// Record persisted; the form is closed and the owner should reload.
    Succeeded { created: bool, response: Value },
    /// Stale result from a closed or replaced session; nothing changed.
    Discarded,
}

#[derive(Debug)]
pub struct ResourceForm {
    descriptor: Arc<ResourceDescriptor>,
    phase: FormPhase,
    target: SubmitTarget,
    draft: FieldMap,
    staging: UploadStaging,
    errors: ValidationErrors,
    error: Option<String>,
    options: HashMap<String, Vec<SelectOption>>,
    session: u64,
    notices: Notices,
}

impl ResourceForm {
    pub fn new(descriptor: Arc<ResourceDescriptor>) -> Self {
        Self {
            descriptor,
            phase: FormPhase::Closed,
            target: SubmitTarget::Create,
            draft: FieldMap::new(),
            staging: UploadStaging::new(),
            errors: ValidationErrors::new(),
            error: None,
            options: HashMap::new(),
            session: 0,
            notices: Notices::new(),
        }
    }

    pub fn descriptor(&self) -> &Arc<ResourceDescriptor> {
        &self.descriptor
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// Open or submitting.
    pub fn is_open(&self) -> bool {
        self.phase != FormPhase::Closed
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.target, SubmitTarget::Update { .. })
    }

    pub fn target(&self) -> &SubmitTarget {
        &self.target
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn draft(&self) -> &FieldMap {
        &self.draft
    }

    pub fn field_errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Last upload or server error of this session.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn staging(&self) -> &UploadStaging {
        &self.staging
    }

    pub fn options_for(&self, source: &str) -> &[SelectOption] {
        self.options.get(source).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn title(&self) -> String {
        if self.is_editing() {
            format!("Edit {}", self.descriptor.label)
        } else {
            format!("Add New {}", self.descriptor.label)
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    fn start_session(&mut self, target: SubmitTarget, draft: FieldMap) {
        self.session += 1;
        self.phase = FormPhase::Open;
        self.target = target;
        self.draft = draft;
        self.staging.clear();
        self.errors = ValidationErrors::new();
        self.error = None;
    }

    /// Opens an empty draft. No-op when a session is already open.
    pub fn open_create(&mut self) -> bool {
        if self.is_open() {
            return false;
        }

        let draft = self.descriptor.codec.to_form_values(None);
        self.start_session(SubmitTarget::Create, draft);
        debug!(collection = %self.descriptor.collection, session = self.session, "form opened for create");
        true
    }

    /// Opens a draft pre-filled from `record`.
    ///
    /// Records without an identifier cannot be targeted and are refused.
    pub fn open_edit(&mut self, record: &Record) -> Result<bool> {
        if self.is_open() {
            return Ok(false);
        }

        let Some(id) = record_id(record) else {
            return Err(ConsoleError::validation(FieldError::form(MISSING_IDENTIFIER_MESSAGE)));
        };

        let draft = self.edit_values(record);

        self.start_session(
            SubmitTarget::Update {
                id: id.clone(),
                original: record.clone(),
            },
            draft,
        );
        debug!(collection = %self.descriptor.collection, id = %id, session = self.session, "form opened for edit");
        Ok(true)
    }

    // Draft shape of an existing record: flattened, with references collapsed.
    fn edit_values(&self, record: &Record) -> FieldMap {
        let mut values = self.descriptor.codec.to_form_values(Some(record));
        self.collapse_references(&mut values);
        values
    }

    // Create-only fields never leave an edit session.
    fn submittable(&self, values: &FieldMap, editing: bool) -> FieldMap {
        values
            .iter()
            .filter(|(name, _)| {
                !(editing
                    && self
                        .descriptor
                        .field_spec(name)
                        .is_some_and(|spec| spec.create_only))
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    // Populated references (`{"_id": .., "name": ..}`) become plain ids so
    // select inputs and payloads carry the id only.
    fn collapse_references(&self, draft: &mut FieldMap) {
        for field in &self.descriptor.fields {
            let Some(value) = draft.get_mut(&field.name) else { continue };
            match &field.kind {
                FieldKind::Select { .. } => {
                    if let Some(id) = reference_id(value) {
                        *value = Value::String(id);
                    }
                }
                FieldKind::MultiSelect { .. } => {
                    if let Value::Array(items) = value {
                        for item in items.iter_mut() {
                            if let Some(id) = reference_id(item) {
                                *item = Value::String(id);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Sets or clears (`None`) one draft value. Ignored unless open.
    pub fn set_field(&mut self, name: &str, value: Option<Value>) {
        if self.phase != FormPhase::Open {
            return;
        }
        match value {
            Some(value) => {
                self.draft.insert(name.to_string(), value);
            }
            None => {
                self.draft.remove(name);
            }
        }
    }

    /// Sets a field from typed text, parsed according to its declared kind.
    pub fn set_input(&mut self, name: &str, raw: &str) {
        let value = match self.descriptor.field_spec(name) {
            Some(spec) => spec.parse_input(raw),
            None if raw.trim().is_empty() => None,
            None => Some(Value::String(raw.to_string())),
        };
        self.set_field(name, value);
    }

    /// Stages a file for the asset slot, replacing any previous one.
    pub fn stage_asset(&mut self, asset: StagedAsset) {
        if self.phase == FormPhase::Open && self.descriptor.asset.is_some() {
            self.staging.stage(asset);
        }
    }

    pub async fn stage_file(&mut self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let asset = StagedAsset::from_path(path).await?;
        self.stage_asset(asset);
        Ok(())
    }

    /// Discards the draft and staged asset. Emits no signal.
    pub fn cancel(&mut self) {
        if self.phase == FormPhase::Closed {
            return;
        }
        debug!(collection = %self.descriptor.collection, session = self.session, "form cancelled");
        self.reset();
    }

    fn reset(&mut self) {
        self.phase = FormPhase::Closed;
        self.target = SubmitTarget::Create;
        self.draft = FieldMap::new();
        self.staging.clear();
        self.errors = ValidationErrors::new();
        self.error = None;
    }

    /// Local half of a submission.
    ///
    /// Runs field validation and the asset policy. On success the form moves
    /// to `Submitting` and the returned [`Submission`] carries everything the
    /// network phases need. On failure no request is possible and the form
    /// stays open with the messages recorded.
    pub fn begin_submit(&mut self) -> Result<Submission> {
        match self.phase {
            FormPhase::Open => {}
            FormPhase::Submitting => {
                return Err(ConsoleError::validation(FieldError::form(
                    "A submission is already in progress",
                )));
            }
            FormPhase::Closed => {
                return Err(ConsoleError::validation(FieldError::form("The form is not open")));
            }
        }

        let editing = self.is_editing();
        let mut errors = match validate_draft(&self.descriptor.fields, &self.draft, editing) {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if let Some(slot) = &self.descriptor.asset {
            if !self.staging.has_pending() && is_blank(self.draft.get(&slot.field)) {
                errors.push(FieldError::form(slot.missing_message.clone()));
            }
        }

        if !errors.is_empty() {
            if let Some(message) = errors.first_message() {
                self.notices.push(Notice::error(message));
            }
            self.errors = errors.clone();
            return Err(ConsoleError::ValidationFailed(errors));
        }

        self.errors = ValidationErrors::new();
        self.error = None;
        self.phase = FormPhase::Submitting;

        let draft = self.submittable(&self.draft, editing);
        let baseline = match &self.target {
            SubmitTarget::Update { original, .. } => {
                self.submittable(&self.edit_values(original), editing)
            }
            SubmitTarget::Create => FieldMap::new(),
        };

        Ok(Submission {
            session: self.session,
            descriptor: Arc::clone(&self.descriptor),
            target: self.target.clone(),
            draft,
            baseline,
            asset: self.staging.pending().cloned(),
        })
    }

    /// Applies the network outcome of a submission.
    pub fn finish(&mut self, result: SubmissionResult) -> Result<FormEvent> {
        if self.phase != FormPhase::Submitting || result.session != self.session {
            debug!(
                collection = %self.descriptor.collection,
                result_session = result.session,
                session = self.session,
                "discarding stale submission result"
            );
            return Ok(FormEvent::Discarded);
        }

        match result.outcome {
            SubmissionOutcome::Persisted { response, .. } => {
                let created = !self.is_editing();
                let message = if created {
                    self.descriptor.created_message()
                } else {
                    self.descriptor.updated_message()
                };
                info!(collection = %self.descriptor.collection, created, "record persisted");
                self.notices.push(Notice::success(message));
                self.reset();
                Ok(FormEvent::Succeeded { created, response })
            }
            SubmissionOutcome::UploadFailed { message } => {
                self.phase = FormPhase::Open;
                self.error = Some(message.clone());
                self.notices.push(Notice::error(message.clone()));
                Err(ConsoleError::UploadFailed(message))
            }
            SubmissionOutcome::Rejected {
                message,
                asset_reference,
            } => {
                // The uploaded file already lives on the server; keep its
                // reference so a resubmit does not upload it again.
                if let (Some(reference), Some(slot)) = (asset_reference, &self.descriptor.asset) {
                    self.draft.insert(slot.field.clone(), Value::String(reference));
                    self.staging.clear();
                }
                self.phase = FormPhase::Open;
                self.error = Some(message.clone());
                self.notices.push(Notice::error(message.clone()));
                Err(ConsoleError::MutationRejected(message))
            }
        }
    }

    /// Validate, upload (if staged), then create or update.
    pub async fn submit(&mut self, transport: &dyn Transport) -> Result<FormEvent> {
        let submission = self.begin_submit()?;
        let result = submission.execute(transport).await;
        self.finish(result)
    }

    /// Request for the option lists of every select field.
    pub fn options_request(&self) -> OptionsRequest {
        OptionsRequest::new(&self.descriptor)
    }

    pub fn apply_options(&mut self, result: OptionsResult) {
        for (source, options) in result.loaded {
            self.options.insert(source, options);
        }
        for message in result.failures {
            self.notices.push(Notice::error(message));
        }
    }

    /// Fetches the option lists of every select field.
    pub async fn load_options(&mut self, transport: &dyn Transport) {
        let result = self.options_request().execute(transport).await;
        self.apply_options(result);
    }
}

fn reference_id(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    map.get("_id")
        .or_else(|| map.get("id"))
        .and_then(|id| match id {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}
