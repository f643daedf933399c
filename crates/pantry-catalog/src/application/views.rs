//! Read-only views of the product aggregate.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::{Product, ProductType};

/// Serializable snapshot of a product, used in notifications and responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    /// The product identifier.
    pub id: Uuid,
    /// Product name.
    pub name: String,
    /// Energy per 100 g.
    pub kcal: f64,
    /// Product category.
    #[serde(rename = "type")]
    pub product_type: ProductType,
    /// Custom properties as a flat name-to-value map.
    pub properties: BTreeMap<String, String>,
    /// Creation timestamp.
    pub created_date: DateTime<Utc>,
    /// Last update timestamp.
    pub last_updated_date: DateTime<Utc>,
    /// Optimistic concurrency version.
    pub version: i64,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            kcal: product.kcal,
            product_type: product.product_type,
            properties: product.property_map(),
            created_date: product.created_date,
            last_updated_date: product.last_updated_date,
            version: product.version,
        }
    }
}
