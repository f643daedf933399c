//! Property reconciliation.
//!
//! Turns the flat name-to-value map carried by commands into the child
//! collection of a product. The result never reuses identifiers of
//! previously persisted properties: on update it replaces the existing set
//! wholesale.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use super::aggregates::CustomProperty;

/// Computes the target property set for `owner` from a flat mapping.
///
/// `owner` is `None` when the owning product has not been inserted yet; the
/// store binds the properties when it assigns the product identifier.
#[must_use]
pub fn reconcile(
    properties: &BTreeMap<String, String>,
    owner: Option<Uuid>,
) -> BTreeSet<CustomProperty> {
    properties
        .iter()
        .map(|(name, value)| CustomProperty {
            id: None,
            product_id: owner,
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}
