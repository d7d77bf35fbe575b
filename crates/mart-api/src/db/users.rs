//! User persistence operations on the `users` table.

use chrono::{DateTime, Utc};
use mart_core::{Email, Role, UserId, UserRecord};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::decode_error;

/// Insert a newly registered user.
pub async fn insert<'e>(exec: impl PgExecutor<'e>, record: &UserRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, email, name, password_hash, role, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(record.id.as_uuid())
    .bind(record.email.as_str())
    .bind(&record.name)
    .bind(&record.password_hash)
    .bind(record.role.as_str())
    .bind(record.created_at)
    .execute(exec)
    .await?;

    Ok(())
}

/// Set a user's role. Returns whether a row was updated.
pub async fn set_role<'e>(
    exec: impl PgExecutor<'e>,
    id: UserId,
    role: Role,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
        .bind(role.as_str())
        .bind(id.as_uuid())
        .execute(exec)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all users on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<UserRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, name, password_hash, role, created_at FROM users ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(UserRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_record(self) -> Result<UserRecord, sqlx::Error> {
        Ok(UserRecord {
            id: UserId::from_uuid(self.id),
            email: Email::parse(&self.email).map_err(|e| decode_error("email", e))?,
            name: self.name,
            password_hash: self.password_hash,
            role: self.role.parse::<Role>().map_err(|e| decode_error("role", e))?,
            created_at: self.created_at,
        })
    }
}
