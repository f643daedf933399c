//! Pantry Store — `PostgreSQL` persistence for the product catalog.

pub mod pg_product_store;
