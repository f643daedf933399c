//! Product store abstraction.

use async_trait::async_trait;
use pantry_core::error::DomainError;
use uuid::Uuid;

use super::aggregates::{NewProduct, Product};

/// Page size used when a caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// A zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page_number: u32,
    /// Maximum number of elements per page. Never zero.
    pub page_size: u32,
}

impl PageRequest {
    /// Creates a page request.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `page_size` is zero.
    pub fn new(page_number: u32, page_size: u32) -> Result<Self, DomainError> {
        if page_size == 0 {
            return Err(DomainError::Validation(
                "page size must be greater than zero".to_owned(),
            ));
        }
        Ok(Self {
            page_number,
            page_size,
        })
    }

    /// Number of elements to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number) * u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the totals needed for navigation.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Elements on this page.
    pub content: Vec<T>,
    /// Zero-based page index.
    pub page_number: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Number of elements across all pages.
    pub total_elements: u64,
}

impl<T> Page<T> {
    /// Number of pages needed to hold `total_elements`.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(u64::from(self.page_size))
    }

    /// Maps the page content, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_elements: self.total_elements,
        }
    }
}

/// Persistence contract for the product aggregate and its properties.
///
/// Every mutating operation is atomic: the product row and its entire
/// property set change together or not at all.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Loads a product with its properties.
    ///
    /// Returns `DomainError::NotFound` if the id does not exist.
    async fn find_by_id(&self, id: Uuid) -> Result<Product, DomainError>;

    /// Loads one page of products ordered by creation date, then id.
    async fn find_page(&self, page: PageRequest) -> Result<Page<Product>, DomainError>;

    /// Inserts a draft. Assigns the id, version 0 and both timestamps.
    async fn insert(&self, draft: &NewProduct) -> Result<Product, DomainError>;

    /// Persists mutated fields and the full replacement property set.
    ///
    /// Succeeds only if the stored version still equals `product.version`;
    /// bumps the version by one and refreshes `last_updated_date`. Returns
    /// `DomainError::ConcurrentModification` on a stale version and
    /// `DomainError::NotFound` if the product is gone.
    async fn update(&self, product: &Product) -> Result<Product, DomainError>;

    /// Removes a product and all of its properties, returning its name.
    async fn delete(&self, id: Uuid) -> Result<String, DomainError>;

    /// Returns whether a product with this id exists.
    async fn exists_by_id(&self, id: Uuid) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_rejects_zero_page_size() {
        assert!(matches!(
            PageRequest::new(0, 0),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_page_request_offset() {
        let page = PageRequest::new(3, 25).unwrap();

        assert_eq!(page.offset(), 75);
    }

    #[test]
    fn test_default_page_request() {
        let page = PageRequest::default();

        assert_eq!(page.page_number, 0);
        assert_eq!(page.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page: Page<()> = Page {
            content: Vec::new(),
            page_number: 0,
            page_size: 10,
            total_elements: 21,
        };

        assert_eq!(page.total_pages(), 3);
    }

    #[test]
    fn test_total_pages_of_empty_result_is_zero() {
        let page: Page<()> = Page {
            content: Vec::new(),
            page_number: 0,
            page_size: 10,
            total_elements: 0,
        };

        assert_eq!(page.total_pages(), 0);
    }

    #[test]
    fn test_map_keeps_paging_metadata() {
        let page = Page {
            content: vec![1, 2],
            page_number: 1,
            page_size: 2,
            total_elements: 4,
        };

        let mapped = page.map(|n| n * 10);

        assert_eq!(mapped.content, vec![10, 20]);
        assert_eq!(mapped.page_number, 1);
        assert_eq!(mapped.total_elements, 4);
    }
}
