//! # Database Persistence Layer
//!
//! Optional Postgres persistence via SQLx. When `DATABASE_URL` is set,
//! users, stores, staff membership, and products are written through to
//! Postgres and reloaded at startup. When absent, the API runs in
//! in-memory-only mode (development and tests).
//!
//! Single-row writes are generic over [`sqlx::PgExecutor`] so they run
//! either on the pool or inside a transaction. Writes that touch several
//! tables open their own transaction.

pub mod products;
pub mod stores;
pub mod users;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => url,
        _ => {
            tracing::warn!(
                "DATABASE_URL not set; running in-memory only. State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Wrap a column that failed domain validation as a decode error.
fn decode_error(column: &'static str, err: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    tracing::error!(column, error = %err, "stored value failed validation");
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(err),
    }
}
