//! Command handlers for the Product Catalog context.
//!
//! Each handler performs exactly one mutating store call, so the product row
//! and its property rows change inside a single transaction or not at all.

use pantry_core::aggregate::AggregateRoot;
use pantry_core::error::DomainError;
use tracing::info;

use crate::domain::aggregates::{NewProduct, Product};
use crate::domain::commands::{CreateProduct, DeleteProduct, UpdateProduct};
use crate::domain::repository::ProductStore;

/// Handles the `CreateProduct` command: validates the input, reconciles the
/// properties and inserts the product at version 0.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the input violates an invariant, or
/// any error raised by the store.
pub async fn handle_create_product(
    command: &CreateProduct,
    store: &dyn ProductStore,
) -> Result<Product, DomainError> {
    info!(
        name = %command.name,
        kcal = command.kcal,
        product_type = %command.product_type,
        "saving new product"
    );
    let draft = NewProduct::new(
        command.name.clone(),
        command.kcal,
        command.product_type,
        &command.properties,
    )?;

    let created = store.insert(&draft).await?;
    info!(product_id = %created.id, name = %created.name, "product saved");
    Ok(created)
}

/// Handles the `UpdateProduct` command: loads the product, overwrites its
/// fields, replaces its property set and persists it against the loaded
/// version.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the product does not exist,
/// `DomainError::ConcurrentModification` if another writer got there first,
/// or `DomainError::Validation` if the input violates an invariant.
pub async fn handle_update_product(
    command: &UpdateProduct,
    store: &dyn ProductStore,
) -> Result<Product, DomainError> {
    info!(product_id = %command.product_id, name = %command.name, "updating product");
    let mut product = store.find_by_id(command.product_id).await?;

    product.revise(
        command.name.clone(),
        command.kcal,
        command.product_type,
        &command.properties,
    )?;

    let updated = store.update(&product).await?;
    info!(
        product_id = %updated.aggregate_id(),
        version = updated.version(),
        "product updated"
    );
    Ok(updated)
}

/// Handles the `DeleteProduct` command: removes the product together with
/// its properties and returns the removed product's name.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the product does not exist.
pub async fn handle_delete_product(
    command: &DeleteProduct,
    store: &dyn ProductStore,
) -> Result<String, DomainError> {
    info!(product_id = %command.product_id, "removing product");
    if !store.exists_by_id(command.product_id).await? {
        return Err(DomainError::NotFound(command.product_id));
    }

    let name = store.delete(command.product_id).await?;
    info!(product_id = %command.product_id, name = %name, "product removed");
    Ok(name)
}
