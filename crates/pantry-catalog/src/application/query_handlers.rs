//! Query handlers for the Product Catalog context.
//!
//! Reads go straight to the store and bypass the command pipeline.

use pantry_core::error::DomainError;
use uuid::Uuid;

use crate::application::views::ProductView;
use crate::domain::repository::{Page, PageRequest, ProductStore};

/// Retrieves a product by its ID.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no product exists for the ID.
pub async fn get_product_by_id(
    product_id: Uuid,
    store: &dyn ProductStore,
) -> Result<ProductView, DomainError> {
    let product = store.find_by_id(product_id).await?;
    Ok(ProductView::from(&product))
}

/// Lists one page of products.
///
/// # Errors
///
/// Returns any error raised by the store.
pub async fn list_products(
    page: PageRequest,
    store: &dyn ProductStore,
) -> Result<Page<ProductView>, DomainError> {
    let products = store.find_page(page).await?;
    Ok(products.map(|product| ProductView::from(&product)))
}
