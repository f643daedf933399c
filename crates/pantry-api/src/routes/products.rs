//! Read API for the product catalog.
//!
//! Queries go straight to the store; they never pass through the command
//! pipeline.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::{Json, Router, routing::get};
use chrono::{DateTime, Utc};
use pantry_catalog::application::query_handlers;
use pantry_catalog::application::views::ProductView;
use pantry_catalog::domain::aggregates::ProductType;
use pantry_catalog::domain::repository::{DEFAULT_PAGE_SIZE, Page, PageRequest};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Query string of the list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    /// Zero-based page index.
    pub page_number: Option<u32>,
    /// Products per page.
    pub page_size: Option<u32>,
}

/// A product as returned by the read API.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponse {
    /// Store-assigned product identifier.
    pub id: Uuid,
    /// Product name.
    pub name: String,
    /// Energy per 100 g.
    pub kcal: f64,
    /// Product category, serialized as `type`.
    #[serde(rename = "type")]
    pub product_type: ProductType,
    /// Custom properties as a flat name-to-value map.
    pub properties: BTreeMap<String, String>,
    /// When the product was created.
    pub created_date: DateTime<Utc>,
    /// When the product was last changed.
    pub last_updated_date: DateTime<Utc>,
}

impl From<ProductView> for ProductResponse {
    fn from(view: ProductView) -> Self {
        Self {
            id: view.id,
            name: view.name,
            kcal: view.kcal,
            product_type: view.product_type,
            properties: view.properties,
            created_date: view.created_date,
            last_updated_date: view.last_updated_date,
        }
    }
}

/// One page of products.
#[derive(Debug, Serialize)]
pub struct PageResponse {
    /// Products on this page, oldest first.
    pub content: Vec<ProductResponse>,
    /// Zero-based index of this page.
    pub page_number: u32,
    /// Requested products per page.
    pub page_size: u32,
    /// Products across all pages.
    pub total_elements: u64,
    /// Number of pages at this page size.
    pub total_pages: u64,
}

impl From<Page<ProductView>> for PageResponse {
    fn from(page: Page<ProductView>) -> Self {
        let total_pages = page.total_pages();
        Self {
            page_number: page.page_number,
            page_size: page.page_size,
            total_elements: page.total_elements,
            total_pages,
            content: page.content.into_iter().map(ProductResponse::from).collect(),
        }
    }
}

/// GET /api/v1/products
#[instrument(skip(state))]
async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse>, ApiError> {
    let request = PageRequest::new(
        params.page_number.unwrap_or(0),
        params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    )?;
    let page = query_handlers::list_products(request, state.product_store.as_ref()).await?;
    Ok(Json(PageResponse::from(page)))
}

/// GET /api/v1/products/{id}
#[instrument(skip(state))]
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ApiError> {
    let view = query_handlers::get_product_by_id(id, state.product_store.as_ref()).await?;
    Ok(Json(ProductResponse::from(view)))
}

/// Returns the product read router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/{id}", get(get_product))
}
