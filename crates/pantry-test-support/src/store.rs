//! Test stores — `ProductStore` implementations for tests.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use pantry_catalog::domain::aggregates::{CustomProperty, NewProduct, Product};
use pantry_catalog::domain::repository::{Page, PageRequest, ProductStore};
use pantry_core::clock::{Clock, SystemClock};
use pantry_core::error::DomainError;
use uuid::Uuid;

/// A product store kept in memory behind a single lock.
///
/// Honors the full store contract: store-assigned ids and timestamps,
/// optimistic version checks, replace-all property updates and cascading
/// deletes. `last_updated_date` strictly increases even when the clock does
/// not move.
pub struct InMemoryProductStore {
    products: Mutex<HashMap<Uuid, Product>>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for InMemoryProductStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryProductStore")
            .field("products", &self.products)
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryProductStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl InMemoryProductStore {
    /// Create an empty store reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            products: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Number of stored products.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn product_count(&self) -> usize {
        self.products.lock().unwrap().len()
    }

    /// Number of stored property rows across all products.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn property_count(&self) -> usize {
        self.products
            .lock()
            .unwrap()
            .values()
            .map(|product| product.properties.len())
            .sum()
    }
}

fn persist_properties(
    properties: &BTreeSet<CustomProperty>,
    owner: Uuid,
) -> BTreeSet<CustomProperty> {
    properties
        .iter()
        .map(|property| CustomProperty {
            id: Some(Uuid::new_v4()),
            product_id: Some(owner),
            name: property.name.clone(),
            value: property.value.clone(),
        })
        .collect()
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Product, DomainError> {
        self.products
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(DomainError::NotFound(id))
    }

    async fn find_page(&self, page: PageRequest) -> Result<Page<Product>, DomainError> {
        let products = self.products.lock().unwrap();
        let mut ordered: Vec<&Product> = products.values().collect();
        ordered.sort_by_key(|product| (product.created_date, product.id));

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let content = ordered
            .into_iter()
            .skip(offset)
            .take(page.page_size as usize)
            .cloned()
            .collect();

        Ok(Page {
            content,
            page_number: page.page_number,
            page_size: page.page_size,
            total_elements: products.len() as u64,
        })
    }

    async fn insert(&self, draft: &NewProduct) -> Result<Product, DomainError> {
        draft.validate()?;
        let id = Uuid::new_v4();
        let now = self.clock.now();
        let product = Product {
            id,
            name: draft.name.clone(),
            kcal: draft.kcal,
            product_type: draft.product_type,
            properties: persist_properties(&draft.properties, id),
            version: 0,
            created_date: now,
            last_updated_date: now,
        };
        self.products.lock().unwrap().insert(id, product.clone());
        Ok(product)
    }

    async fn update(&self, product: &Product) -> Result<Product, DomainError> {
        product.validate()?;
        let mut products = self.products.lock().unwrap();
        let current = products
            .get_mut(&product.id)
            .ok_or(DomainError::NotFound(product.id))?;
        if current.version != product.version {
            return Err(DomainError::ConcurrentModification {
                aggregate_id: product.id,
                expected: product.version,
                actual: current.version,
            });
        }

        let now = self
            .clock
            .now()
            .max(current.last_updated_date + Duration::microseconds(1));
        current.name.clone_from(&product.name);
        current.kcal = product.kcal;
        current.product_type = product.product_type;
        current.properties = persist_properties(&product.properties, product.id);
        current.version += 1;
        current.last_updated_date = now;
        Ok(current.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<String, DomainError> {
        self.products
            .lock()
            .unwrap()
            .remove(&id)
            .map(|product| product.name)
            .ok_or(DomainError::NotFound(id))
    }

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.products.lock().unwrap().contains_key(&id))
    }
}

/// A product store that always loses the race to another writer.
///
/// Every `update` is preceded by a competing update of the same product, so
/// the caller's write arrives with a stale version and fails with
/// `DomainError::ConcurrentModification`. All other calls go straight to the
/// wrapped in-memory store.
#[derive(Debug, Default)]
pub struct ContendedProductStore {
    inner: InMemoryProductStore,
}

impl ContendedProductStore {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: InMemoryProductStore) -> Self {
        Self { inner }
    }

    /// The wrapped store, for inspecting persisted state.
    #[must_use]
    pub fn inner(&self) -> &InMemoryProductStore {
        &self.inner
    }
}

#[async_trait]
impl ProductStore for ContendedProductStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Product, DomainError> {
        self.inner.find_by_id(id).await
    }

    async fn find_page(&self, page: PageRequest) -> Result<Page<Product>, DomainError> {
        self.inner.find_page(page).await
    }

    async fn insert(&self, draft: &NewProduct) -> Result<Product, DomainError> {
        self.inner.insert(draft).await
    }

    async fn update(&self, product: &Product) -> Result<Product, DomainError> {
        let competing = self.inner.find_by_id(product.id).await?;
        self.inner.update(&competing).await?;
        self.inner.update(product).await
    }

    async fn delete(&self, id: Uuid) -> Result<String, DomainError> {
        self.inner.delete(id).await
    }

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, DomainError> {
        self.inner.exists_by_id(id).await
    }
}

/// A product store that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingProductStore;

#[async_trait]
impl ProductStore for FailingProductStore {
    async fn find_by_id(&self, _id: Uuid) -> Result<Product, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn find_page(&self, _page: PageRequest) -> Result<Page<Product>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn insert(&self, _draft: &NewProduct) -> Result<Product, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn update(&self, _product: &Product) -> Result<Product, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn delete(&self, _id: Uuid) -> Result<String, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn exists_by_id(&self, _id: Uuid) -> Result<bool, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
