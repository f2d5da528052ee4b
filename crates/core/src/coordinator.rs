//! Submits a computed changeset to the remote profile.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::changeset::ChangeSet;
use crate::error::CoreError;
use crate::gateway::{GatewayError, ProfileGateway, RemoteAck};
use crate::types::Credentials;
use crate::validation::validate_changes;

/// Protocol discriminator the remote service requires on every write.
pub const MESSAGING_PRODUCT: &str = "whatsapp";

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("No changed fields to submit")]
    EmptyChangeSet,

    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error(transparent)]
    Remote(#[from] GatewayError),
}

/// Wrap `changes` in the remote write envelope.
pub fn envelope(changes: &ChangeSet) -> Value {
    let mut body = Map::new();
    body.insert(
        "messaging_product".to_string(),
        Value::String(MESSAGING_PRODUCT.to_string()),
    );
    for (field, value) in changes.iter() {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        body.insert(field.as_str().to_string(), value);
    }
    Value::Object(body)
}

/// Sends non-empty changesets to the remote profile in a single write.
#[derive(Clone)]
pub struct ProfileUpdateCoordinator {
    gateway: Arc<dyn ProfileGateway>,
}

impl ProfileUpdateCoordinator {
    pub fn new(gateway: Arc<dyn ProfileGateway>) -> Self {
        Self { gateway }
    }

    /// Submit `changes` for `entity_id`.
    ///
    /// Rejects an empty or invalid changeset before any remote call.
    /// Otherwise performs exactly one write; a remote failure is returned
    /// as-is and never retried.
    pub async fn submit(
        &self,
        entity_id: &str,
        credentials: &Credentials,
        changes: &ChangeSet,
    ) -> Result<RemoteAck, UpdateError> {
        if changes.is_empty() {
            return Err(UpdateError::EmptyChangeSet);
        }
        validate_changes(changes)?;

        let fields: Vec<&str> = changes.fields().map(|f| f.as_str()).collect();
        tracing::info!(entity_id, ?fields, "Submitting profile changes");

        let ack = self
            .gateway
            .apply_fields(entity_id, credentials, &envelope(changes))
            .await
            .map_err(|e| {
                tracing::warn!(entity_id, error = %e, "Profile update rejected");
                e
            })?;

        tracing::info!(entity_id, status = ack.status, "Profile changes applied");
        Ok(ack)
    }
}
