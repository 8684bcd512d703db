use crate::codec::check_status_payload;
use crate::core::{FieldMap, Record};
use crate::resource::ResourceDescriptor;
use crate::transport::{SharedTransport, Transport};
use crate::upload::{StagedAsset, upload_asset};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub const OPERATION_FAILED_MESSAGE: &str = "Operation failed";

/// Create or update target of a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitTarget {
    Create,
    Update { id: String, original: Record },
}

/// Network half of a form submission, detached from the form.
///
/// Owns everything it needs so it can be spawned. The upload phase (if any)
/// finishes before the create/update request is built.
#[derive(Debug)]
pub struct Submission {
    pub(crate) session: u64,
    pub(crate) descriptor: Arc<ResourceDescriptor>,
    pub(crate) target: SubmitTarget,
    pub(crate) draft: FieldMap,
    /// Draft-shaped values of the record being edited. Empty for creates.
    pub(crate) baseline: FieldMap,
    pub(crate) asset: Option<StagedAsset>,
}

/// What happened on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Persisted {
        response: Value,
        asset_reference: Option<String>,
    },
    UploadFailed {
        message: String,
    },
    Rejected {
        message: String,
        /// Reference of an asset uploaded before the rejection.
        asset_reference: Option<String>,
    },
}

/// Outcome tagged with the form session it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionResult {
    pub session: u64,
    pub outcome: SubmissionOutcome,
}

impl Submission {
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn target(&self) -> &SubmitTarget {
        &self.target
    }

    pub fn has_asset(&self) -> bool {
        self.asset.is_some()
    }

    /// Spawn-friendly wrapper around [`Submission::execute`].
    pub async fn run(self, transport: SharedTransport) -> SubmissionResult {
        self.execute(transport.as_ref()).await
    }

    pub async fn execute(self, transport: &dyn Transport) -> SubmissionResult {
        let session = self.session;
        let outcome = self.perform(transport).await;
        SubmissionResult { session, outcome }
    }

    async fn perform(self, transport: &dyn Transport) -> SubmissionOutcome {
        let descriptor = self.descriptor;
        let mut values = self.draft;

        let mut asset_reference = None;
        if let (Some(slot), Some(asset)) = (descriptor.asset.as_ref(), self.asset.as_ref()) {
            match upload_asset(transport, slot, asset).await {
                Ok(reference) => {
                    values.insert(slot.field.clone(), Value::String(reference.clone()));
                    asset_reference = Some(reference);
                }
                Err(err) => {
                    return SubmissionOutcome::UploadFailed {
                        message: err.user_message(),
                    };
                }
            }
        }

        let payload = descriptor.codec.to_wire_payload(&values);

        let response = match &self.target {
            SubmitTarget::Create => {
                debug!(collection = %descriptor.collection, "creating record");
                transport
                    .post(&descriptor.collection_path(), &Value::Object(payload))
                    .await
            }
            SubmitTarget::Update { id, .. } => {
                let baseline = descriptor.codec.to_wire_payload(&self.baseline);
                let changes = changed_fields(&payload, &baseline);
                debug!(collection = %descriptor.collection, id = %id, fields = changes.len(), "updating record");
                transport
                    .put(&descriptor.item_path(id), &Value::Object(changes))
                    .await
            }
        };

        let rejected = |message: String| SubmissionOutcome::Rejected {
            message,
            asset_reference: asset_reference.clone(),
        };

        match response {
            Ok(body) => match check_status_payload(body) {
                Ok(response) => SubmissionOutcome::Persisted {
                    response,
                    asset_reference: asset_reference.clone(),
                },
                Err(rejection) => {
                    warn!(collection = %descriptor.collection, "mutation reported failure");
                    rejected(rejection.message_or(OPERATION_FAILED_MESSAGE))
                }
            },
            Err(err) => {
                warn!(collection = %descriptor.collection, error = %err, "mutation rejected");
                rejected(err.message_or(OPERATION_FAILED_MESSAGE))
            }
        }
    }
}

/// Wire fields whose value differs from the original record.
///
/// Composite fields compare as whole objects, so a change to one part sends
/// the full nested value. Fields the user cleared are sent as `null`.
pub fn changed_fields(payload: &Record, baseline: &Record) -> Record {
    let mut changes: Record = payload
        .iter()
        .filter(|(key, value)| baseline.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    for key in baseline.keys() {
        if !payload.contains_key(key) {
            changes.insert(key.clone(), Value::Null);
        }
    }

    changes
}
