//! Commands for the Product Catalog context.

use std::collections::BTreeMap;
use std::fmt;

use pantry_core::command::Command;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregates::ProductType;

/// Command to create a product.
#[derive(Debug, Clone)]
pub struct CreateProduct {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Product name.
    pub name: String,
    /// Energy per 100 g.
    pub kcal: f64,
    /// Product category.
    pub product_type: ProductType,
    /// Custom properties as a flat name-to-value map.
    pub properties: BTreeMap<String, String>,
}

/// Command to replace a product's fields and properties.
#[derive(Debug, Clone)]
pub struct UpdateProduct {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The product identifier.
    pub product_id: Uuid,
    /// New product name.
    pub name: String,
    /// New energy per 100 g.
    pub kcal: f64,
    /// New product category.
    pub product_type: ProductType,
    /// Replacement property set as a flat name-to-value map.
    pub properties: BTreeMap<String, String>,
}

/// Command to delete a product and all of its properties.
#[derive(Debug, Clone)]
pub struct DeleteProduct {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The product identifier.
    pub product_id: Uuid,
}

/// The discriminant of a [`ProductCommand`], also used as the wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// See [`CreateProduct`].
    Create,
    /// See [`UpdateProduct`].
    Update,
    /// See [`DeleteProduct`].
    Delete,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Every command accepted on the command channel.
#[derive(Debug, Clone)]
pub enum ProductCommand {
    /// Create a product.
    Create(CreateProduct),
    /// Update a product.
    Update(UpdateProduct),
    /// Delete a product.
    Delete(DeleteProduct),
}

impl ProductCommand {
    /// Returns the command's discriminant.
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Create(_) => CommandKind::Create,
            Self::Update(_) => CommandKind::Update,
            Self::Delete(_) => CommandKind::Delete,
        }
    }
}

impl Command for ProductCommand {
    fn command_type(&self) -> &'static str {
        match self {
            Self::Create(_) => "catalog.create_product",
            Self::Update(_) => "catalog.update_product",
            Self::Delete(_) => "catalog.delete_product",
        }
    }

    fn correlation_id(&self) -> Uuid {
        match self {
            Self::Create(command) => command.correlation_id,
            Self::Update(command) => command.correlation_id,
            Self::Delete(command) => command.correlation_id,
        }
    }

    fn target_id(&self) -> Option<Uuid> {
        match self {
            Self::Create(_) => None,
            Self::Update(command) => Some(command.product_id),
            Self::Delete(command) => Some(command.product_id),
        }
    }
}
