//! # Demo Data Bootstrap
//!
//! Seeds a small dataset into an empty deployment so the API can be
//! exercised right away:
//!
//! | Account            | Name        | Password | Role    |
//! |--------------------|-------------|----------|---------|
//! | `gerente@mail.com` | Gerente 1   | `123456` | manager of "Loja 1" |
//! | `usuario@mail.com` | Usuario 1   | `123456` | user    |
//!
//! Seeding only runs when `MART_SEED_DEMO` is on, outside production, and
//! while the user store is empty. The rows are written in one transaction,
//! so a failed seed leaves nothing behind and is retried on the next start.

use mart_core::{Email, Role, StoreRecord, UserRecord};
use mart_crypto::CryptoError;

use crate::state::AppState;

const DEMO_PASSWORD: &str = "123456";
const DEMO_STORE: &str = "Loja 1";

/// Errors during demo seeding.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// A demo password could not be hashed.
    #[error("password hashing failed: {0}")]
    Hashing(#[from] CryptoError),

    /// A demo email failed validation.
    #[error("invalid demo email: {0}")]
    Email(#[from] mart_core::ValidationError),

    /// Persisting the demo data failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Seed demo users and a store. Returns whether anything was written.
pub async fn seed_demo_data(state: &AppState) -> Result<bool, BootstrapError> {
    if !state.config.seed_demo || state.config.environment.is_production() {
        return Ok(false);
    }

    let _guard = state.mutation_lock.lock().await;
    if !state.users.is_empty() {
        tracing::debug!("users present; skipping demo seed");
        return Ok(false);
    }

    let mut manager = demo_user(state, "gerente@mail.com", "Gerente 1")?;
    manager.role = Role::Manager;
    let user = demo_user(state, "usuario@mail.com", "Usuario 1")?;
    let store = StoreRecord::new(DEMO_STORE, manager.id);

    if let Some(pool) = &state.db_pool {
        let mut tx = pool.begin().await?;
        crate::db::users::insert(&mut *tx, &manager).await?;
        crate::db::users::insert(&mut *tx, &user).await?;
        crate::db::stores::insert(&mut *tx, &store).await?;
        tx.commit().await?;
    }

    state.users.insert(manager.id, manager.clone());
    state.users.insert(user.id, user);
    state.stores.insert(store.id, store.clone());

    tracing::info!(
        manager = %manager.email,
        store_id = %store.id,
        "seeded demo data"
    );
    Ok(true)
}

fn demo_user(state: &AppState, email: &str, name: &str) -> Result<UserRecord, BootstrapError> {
    let hash = state.passwords.hash_password(DEMO_PASSWORD)?;
    Ok(UserRecord::new(Email::parse(email)?, name, hash))
}
