//! Wire codec for the command channel.
//!
//! A command travels as a JSON envelope tagged by `kind`:
//!
//! ```json
//! { "kind": "create", "correlation_id": "…", "payload": { "name": "Potato", "kcal": 73.0,
//!   "type": "FRUITS_AND_VEGETABLES", "properties": { "KCAL_AFTER_BOILED": "66.0" } } }
//! ```
//!
//! Decoding happens in two steps so that a payload error can still be
//! attributed to a command kind.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::ProductType;
use crate::domain::commands::{
    CommandKind, CreateProduct, DeleteProduct, ProductCommand, UpdateProduct,
};

/// Failure to turn a raw message into a [`ProductCommand`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The envelope itself is unreadable or names an unknown kind.
    #[error("malformed command envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The kind is known but the rest of the envelope does not fit it.
    #[error("invalid {kind} command: {source}")]
    InvalidPayload {
        /// The command kind named by the envelope.
        kind: CommandKind,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// Tagged envelope carried on the command channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Which command the payload holds.
    pub kind: CommandKind,
    /// Optional caller-supplied correlation ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
    /// Kind-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Payload of a `create` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductPayload {
    /// Product name.
    pub name: String,
    /// Energy per 100 g.
    pub kcal: f64,
    /// Product category.
    #[serde(rename = "type")]
    pub product_type: ProductType,
    /// Custom properties.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Payload of an `update` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProductPayload {
    /// The product identifier.
    pub id: Uuid,
    /// New product name.
    pub name: String,
    /// New energy per 100 g.
    pub kcal: f64,
    /// New product category.
    #[serde(rename = "type")]
    pub product_type: ProductType,
    /// Replacement custom properties.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Payload of a `delete` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteProductPayload {
    /// The product identifier.
    pub id: Uuid,
}

/// The part of an envelope that must be readable for a message to count as
/// a command at all.
#[derive(Debug, Deserialize)]
struct EnvelopeKind {
    kind: CommandKind,
}

/// Decodes a raw command message.
///
/// The `kind` is read first; once it is known, any other defect in the
/// envelope is reported against that kind. A fresh correlation ID is
/// generated when the envelope carries none.
///
/// # Errors
///
/// Returns `DecodeError::Malformed` if no known `kind` can be read and
/// `DecodeError::InvalidPayload` if the rest of the envelope does not fit
/// that kind.
pub fn decode_command(raw: &[u8]) -> Result<ProductCommand, DecodeError> {
    let EnvelopeKind { kind } = serde_json::from_slice(raw).map_err(DecodeError::Malformed)?;
    let invalid = |source| DecodeError::InvalidPayload { kind, source };

    let envelope: CommandEnvelope = serde_json::from_slice(raw).map_err(invalid)?;
    let correlation_id = envelope.correlation_id.unwrap_or_else(Uuid::new_v4);

    let command = match kind {
        CommandKind::Create => {
            let payload: CreateProductPayload =
                serde_json::from_value(envelope.payload).map_err(invalid)?;
            ProductCommand::Create(CreateProduct {
                correlation_id,
                name: payload.name,
                kcal: payload.kcal,
                product_type: payload.product_type,
                properties: payload.properties,
            })
        }
        CommandKind::Update => {
            let payload: UpdateProductPayload =
                serde_json::from_value(envelope.payload).map_err(invalid)?;
            ProductCommand::Update(UpdateProduct {
                correlation_id,
                product_id: payload.id,
                name: payload.name,
                kcal: payload.kcal,
                product_type: payload.product_type,
                properties: payload.properties,
            })
        }
        CommandKind::Delete => {
            let payload: DeleteProductPayload =
                serde_json::from_value(envelope.payload).map_err(invalid)?;
            ProductCommand::Delete(DeleteProduct {
                correlation_id,
                product_id: payload.id,
            })
        }
    };
    Ok(command)
}
