//! Store persistence operations on the `stores` and `store_staff` tables.
//!
//! Store creation, staff assignment, and store deletion each change a
//! user's role too, so they run in one transaction. A role update that
//! matches no user aborts the transaction with `RowNotFound`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mart_core::{ProductId, Role, StoreId, StoreRecord, UserId};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::users;

/// Insert the store row only. The manager's role is left untouched.
pub async fn insert<'e>(exec: impl PgExecutor<'e>, record: &StoreRecord) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO stores (id, name, manager_id, created_at) VALUES ($1, $2, $3, $4)")
        .bind(record.id.as_uuid())
        .bind(&record.name)
        .bind(record.manager.as_uuid())
        .bind(record.created_at)
        .execute(exec)
        .await?;

    Ok(())
}

/// Insert a store and promote its manager.
pub async fn create(pool: &PgPool, record: &StoreRecord) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    insert(&mut *tx, record).await?;
    if !users::set_role(&mut *tx, record.manager, Role::Manager).await? {
        return Err(sqlx::Error::RowNotFound);
    }

    tx.commit().await
}

/// Add `user` to the store's staff and mark them as staff.
pub async fn add_staff(pool: &PgPool, store: StoreId, user: UserId) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO store_staff (store_id, user_id) VALUES ($1, $2)")
        .bind(store.as_uuid())
        .bind(user.as_uuid())
        .execute(&mut *tx)
        .await?;
    if !users::set_role(&mut *tx, user, Role::Staff).await? {
        return Err(sqlx::Error::RowNotFound);
    }

    tx.commit().await
}

/// Delete a store with its products and staff rows, then apply the
/// re-derived roles of its former members.
pub async fn delete_cascade(
    pool: &PgPool,
    store: StoreId,
    roles: &[(UserId, Role)],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM products WHERE store_id = $1")
        .bind(store.as_uuid())
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM stores WHERE id = $1")
        .bind(store.as_uuid())
        .execute(&mut *tx)
        .await?;
    for (user, role) in roles {
        if !users::set_role(&mut *tx, *user, *role).await? {
            return Err(sqlx::Error::RowNotFound);
        }
    }

    tx.commit().await
}

/// Load all stores on startup with their staff and product back-links.
pub async fn load_all(pool: &PgPool) -> Result<Vec<StoreRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StoreRow>(
        "SELECT id, name, manager_id, created_at FROM stores ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let mut staff: HashMap<Uuid, Vec<UserId>> = HashMap::new();
    let staff_rows: Vec<(Uuid, Uuid)> =
        sqlx::query_as("SELECT store_id, user_id FROM store_staff ORDER BY added_at")
            .fetch_all(pool)
            .await?;
    for (store_id, user_id) in staff_rows {
        staff.entry(store_id).or_default().push(UserId::from_uuid(user_id));
    }

    let mut products: HashMap<Uuid, Vec<ProductId>> = HashMap::new();
    let product_rows: Vec<(Uuid, Uuid)> =
        sqlx::query_as("SELECT store_id, id FROM products ORDER BY created_at")
            .fetch_all(pool)
            .await?;
    for (store_id, product_id) in product_rows {
        products
            .entry(store_id)
            .or_default()
            .push(ProductId::from_uuid(product_id));
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let staff = staff.remove(&row.id).unwrap_or_default();
            let products = products.remove(&row.id).unwrap_or_default();
            row.into_record(staff, products)
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct StoreRow {
    id: Uuid,
    name: String,
    manager_id: Uuid,
    created_at: DateTime<Utc>,
}

impl StoreRow {
    fn into_record(self, staff: Vec<UserId>, products: Vec<ProductId>) -> StoreRecord {
        StoreRecord {
            id: StoreId::from_uuid(self.id),
            name: self.name,
            manager: UserId::from_uuid(self.manager_id),
            staff,
            products,
            created_at: self.created_at,
        }
    }
}
