//! Product persistence operations on the `products` table.
//!
//! The store's product back-link is not stored separately; it is
//! rebuilt from `products.store_id` when stores are loaded.

use chrono::{DateTime, Utc};
use mart_core::{ProductId, ProductRecord, StoreId, UserId};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Insert a new product.
pub async fn insert<'e>(
    exec: impl PgExecutor<'e>,
    record: &ProductRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO products (id, name, description, image_url, price, store_id, created_by, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(record.id.as_uuid())
    .bind(&record.name)
    .bind(&record.description)
    .bind(&record.image_url)
    .bind(record.price)
    .bind(record.store_id.as_uuid())
    .bind(record.created_by.as_uuid())
    .bind(record.created_at)
    .execute(exec)
    .await?;

    Ok(())
}

/// Persist the mutable product fields.
pub async fn update<'e>(
    exec: impl PgExecutor<'e>,
    record: &ProductRecord,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE products SET name = $1, description = $2, image_url = $3, price = $4 WHERE id = $5",
    )
    .bind(&record.name)
    .bind(&record.description)
    .bind(&record.image_url)
    .bind(record.price)
    .bind(record.id.as_uuid())
    .execute(exec)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a product.
pub async fn delete<'e>(exec: impl PgExecutor<'e>, id: ProductId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id.as_uuid())
        .execute(exec)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all products on startup, oldest first.
pub async fn load_all(pool: &PgPool) -> Result<Vec<ProductRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, description, image_url, price, store_id, created_by, created_at
         FROM products ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ProductRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    image_url: Option<String>,
    price: i64,
    store_id: Uuid,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_record(self) -> ProductRecord {
        ProductRecord {
            id: ProductId::from_uuid(self.id),
            name: self.name,
            description: self.description,
            image_url: self.image_url,
            price: self.price,
            store_id: StoreId::from_uuid(self.store_id),
            created_by: UserId::from_uuid(self.created_by),
            created_at: self.created_at,
        }
    }
}
