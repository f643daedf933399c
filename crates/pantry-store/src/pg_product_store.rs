//! `PostgreSQL` implementation of the `ProductStore` trait.
//!
//! Every mutating call runs in its own transaction. Optimistic concurrency
//! is a conditional update (`WHERE id = $1 AND version = $2`); when it
//! touches no row the current version decides between `NotFound` and
//! `ConcurrentModification`. Properties are replaced wholesale on update and
//! deleted ahead of their product on removal.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::error::{DatabaseError, ErrorKind};
use sqlx::postgres::PgConnection;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use pantry_catalog::domain::aggregates::{CustomProperty, NewProduct, Product, ProductType};
use pantry_catalog::domain::repository::{Page, PageRequest, ProductStore};
use pantry_core::error::DomainError;

const PRODUCT_COLUMNS: &str =
    "id, name, kcal, product_type, version, created_date, last_updated_date";

const SET_READ_SNAPSHOT_SQL: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ";

const INSERT_PROPERTY_SQL: &str =
    "INSERT INTO custom_properties (id, product_id, name, value) VALUES ($1, $2, $3, $4)";

const SELECT_PROPERTIES_SQL: &str = "SELECT id, product_id, name, value FROM custom_properties \
     WHERE product_id = ANY($1) ORDER BY product_id, name";

const DELETE_PROPERTIES_SQL: &str = "DELETE FROM custom_properties WHERE product_id = $1";

const SELECT_VERSION_SQL: &str = "SELECT version FROM products WHERE id = $1";

const DELETE_PRODUCT_SQL: &str = "DELETE FROM products WHERE id = $1 RETURNING name";

const EXISTS_PRODUCT_SQL: &str = "SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)";

const COUNT_PRODUCTS_SQL: &str = "SELECT COUNT(*) FROM products";

fn select_product_sql() -> String {
    format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1")
}

fn select_product_page_sql() -> String {
    format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_date, id LIMIT $1 OFFSET $2")
}

fn insert_product_sql() -> String {
    format!(
        "INSERT INTO products (id, name, kcal, product_type, version, created_date, last_updated_date) \
         VALUES ($1, $2, $3, $4, 0, now(), now()) RETURNING {PRODUCT_COLUMNS}"
    )
}

fn update_product_sql() -> String {
    format!(
        "UPDATE products SET name = $3, kcal = $4, product_type = $5, version = version + 1, \
         last_updated_date = GREATEST(now(), last_updated_date + INTERVAL '1 microsecond') \
         WHERE id = $1 AND version = $2 RETURNING {PRODUCT_COLUMNS}"
    )
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    kcal: f64,
    product_type: String,
    version: i64,
    created_date: DateTime<Utc>,
    last_updated_date: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, properties: BTreeSet<CustomProperty>) -> Result<Product, DomainError> {
        let product_type = self.product_type.parse::<ProductType>().map_err(|_| {
            DomainError::Infrastructure(format!(
                "unknown product type in storage: {}",
                self.product_type
            ))
        })?;
        Ok(Product {
            id: self.id,
            name: self.name,
            kcal: self.kcal,
            product_type,
            properties,
            version: self.version,
            created_date: self.created_date,
            last_updated_date: self.last_updated_date,
        })
    }
}

#[derive(Debug, FromRow)]
struct PropertyRow {
    id: Uuid,
    product_id: Uuid,
    name: String,
    value: String,
}

/// Maps a `sqlx` error onto the domain error kinds.
///
/// Constraint violations mean the input broke an invariant; everything else
/// is an infrastructure failure.
#[must_use]
pub fn map_sqlx_error(error: sqlx::Error) -> DomainError {
    match error.as_database_error().map(DatabaseError::kind) {
        Some(ErrorKind::UniqueViolation) => {
            DomainError::Validation(format!("duplicate value: {error}"))
        }
        Some(ErrorKind::CheckViolation | ErrorKind::NotNullViolation) => {
            DomainError::Validation(format!("constraint violated: {error}"))
        }
        _ => DomainError::Infrastructure(error.to_string()),
    }
}

/// PostgreSQL-backed product store.
#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Creates a new `PgProductStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DomainError> {
        self.pool.begin().await.map_err(map_sqlx_error)
    }

    /// Begins a transaction whose statements all see one snapshot, so a
    /// product and its properties are read consistently.
    async fn begin_read(&self) -> Result<Transaction<'static, Postgres>, DomainError> {
        let mut tx = self.begin().await?;
        sqlx::query(SET_READ_SNAPSHOT_SQL)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(tx)
    }
}

async fn load_properties(
    conn: &mut PgConnection,
    product_ids: &[Uuid],
) -> Result<HashMap<Uuid, BTreeSet<CustomProperty>>, DomainError> {
    let rows: Vec<PropertyRow> = sqlx::query_as(SELECT_PROPERTIES_SQL)
        .bind(product_ids)
        .fetch_all(conn)
        .await
        .map_err(map_sqlx_error)?;

    let mut by_product: HashMap<Uuid, BTreeSet<CustomProperty>> = HashMap::new();
    for row in rows {
        by_product
            .entry(row.product_id)
            .or_default()
            .insert(CustomProperty {
                id: Some(row.id),
                product_id: Some(row.product_id),
                name: row.name,
                value: row.value,
            });
    }
    Ok(by_product)
}

async fn insert_properties(
    conn: &mut PgConnection,
    product_id: Uuid,
    properties: &BTreeSet<CustomProperty>,
) -> Result<BTreeSet<CustomProperty>, DomainError> {
    let mut persisted = BTreeSet::new();
    for property in properties {
        let id = Uuid::new_v4();
        sqlx::query(INSERT_PROPERTY_SQL)
            .bind(id)
            .bind(product_id)
            .bind(&property.name)
            .bind(&property.value)
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;
        persisted.insert(CustomProperty {
            id: Some(id),
            product_id: Some(product_id),
            name: property.name.clone(),
            value: property.value.clone(),
        });
    }
    Ok(persisted)
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Product, DomainError> {
        let mut tx = self.begin_read().await?;
        let row: Option<ProductRow> = sqlx::query_as(&select_product_sql())
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let row = row.ok_or(DomainError::NotFound(id))?;

        let mut properties = load_properties(&mut tx, &[id]).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        row.into_product(properties.remove(&id).unwrap_or_default())
    }

    async fn find_page(&self, page: PageRequest) -> Result<Page<Product>, DomainError> {
        let offset = i64::try_from(page.offset())
            .map_err(|_| DomainError::Validation("page number out of range".to_owned()))?;

        let mut tx = self.begin_read().await?;
        let total: i64 = sqlx::query_scalar(COUNT_PRODUCTS_SQL)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let rows: Vec<ProductRow> = sqlx::query_as(&select_product_page_sql())
            .bind(i64::from(page.page_size))
            .bind(offset)
            .fetch_all(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut properties = load_properties(&mut tx, &ids).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        let content = rows
            .into_iter()
            .map(|row| {
                let owned = properties.remove(&row.id).unwrap_or_default();
                row.into_product(owned)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            content,
            page_number: page.page_number,
            page_size: page.page_size,
            total_elements: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn insert(&self, draft: &NewProduct) -> Result<Product, DomainError> {
        draft.validate()?;

        let mut tx = self.begin().await?;
        let row: ProductRow = sqlx::query_as(&insert_product_sql())
            .bind(Uuid::new_v4())
            .bind(&draft.name)
            .bind(draft.kcal)
            .bind(draft.product_type.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let properties = insert_properties(&mut tx, row.id, &draft.properties).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(product_id = %row.id, "product row inserted");
        row.into_product(properties)
    }

    async fn update(&self, product: &Product) -> Result<Product, DomainError> {
        product.validate()?;

        let mut tx = self.begin().await?;
        let row: Option<ProductRow> = sqlx::query_as(&update_product_sql())
            .bind(product.id)
            .bind(product.version)
            .bind(&product.name)
            .bind(product.kcal)
            .bind(product.product_type.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            let actual: Option<i64> = sqlx::query_scalar(SELECT_VERSION_SQL)
                .bind(product.id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            return Err(match actual {
                Some(actual) => DomainError::ConcurrentModification {
                    aggregate_id: product.id,
                    expected: product.version,
                    actual,
                },
                None => DomainError::NotFound(product.id),
            });
        };

        sqlx::query(DELETE_PROPERTIES_SQL)
            .bind(product.id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let properties = insert_properties(&mut tx, product.id, &product.properties).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(product_id = %row.id, version = row.version, "product row updated");
        row.into_product(properties)
    }

    async fn delete(&self, id: Uuid) -> Result<String, DomainError> {
        let mut tx = self.begin().await?;
        sqlx::query(DELETE_PROPERTIES_SQL)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let name: Option<String> = sqlx::query_scalar(DELETE_PRODUCT_SQL)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        // Dropping the transaction rolls the property delete back.
        let name = name.ok_or(DomainError::NotFound(id))?;
        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(product_id = %id, "product row deleted");
        Ok(name)
    }

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, DomainError> {
        sqlx::query_scalar(EXISTS_PRODUCT_SQL)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}
