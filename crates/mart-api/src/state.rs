//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! Users, stores, and products live in in-memory [`Store`]s. When a
//! database pool is configured they are hydrated from Postgres at
//! startup and every mutation is written through before it is applied
//! in memory, so reads never touch the database.
//!
//! Mutations that touch more than one record (registration, store
//! creation, staff assignment, store and product create/delete) hold
//! [`AppState::mutation_lock`] for their whole validate-persist-apply
//! sequence. Single-record updates rely on the store's own lock.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use mart_core::{
    Directory, Email, ProductId, ProductRecord, StoreId, StoreRecord, UserId, UserRecord,
};
use mart_crypto::{PasswordHasher, TokenIssuer};
use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;
use secrecy::ExposeSecret;
use sqlx::PgPool;

use crate::config::AppConfig;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// The lock is `parking_lot` and is never held across `.await` points.
#[derive(Debug)]
pub struct Store<K, T> {
    data: Arc<RwLock<HashMap<K, T>>>,
}

impl<K, T> Clone for Store<K, T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K, T> Store<K, T>
where
    K: Eq + Hash + Copy,
    T: Clone,
{
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: K, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &K) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records, in no particular order.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// First record matching `predicate`.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.data.read().values().find(|v| predicate(v)).cloned()
    }

    /// Update a record in place. Returns the updated record, or `None` if not found.
    pub fn update(&self, id: &K, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        let entry = guard.get_mut(id)?;
        f(entry);
        Some(entry.clone())
    }

    /// Read-validate-update a record under a single write lock.
    ///
    /// Returns `None` if the record doesn't exist, or `Some(result)` with
    /// the closure's `Result`.
    pub fn try_update<R, E>(
        &self,
        id: &K,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Remove a record by ID.
    pub fn remove(&self, id: &K) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Remove every record matching `predicate`, returning the removed records.
    pub fn remove_where(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        let mut guard = self.data.write();
        let keys: Vec<K> = guard
            .iter()
            .filter(|(_, v)| predicate(v))
            .map(|(k, _)| *k)
            .collect();
        keys.iter().filter_map(|k| guard.remove(k)).collect()
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &K) -> bool {
        self.data.read().contains_key(id)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, T> Default for Store<K, T>
where
    K: Eq + Hash + Copy,
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

// -- Application State --------------------------------------------------------

/// Shared application state accessible to all route handlers.
///
/// Clone-friendly: every field is reference-counted or cheap to copy.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Registered users.
    pub users: Store<UserId, UserRecord>,
    /// Stores with their membership and product back-links.
    pub stores: Store<StoreId, StoreRecord>,
    /// Products.
    pub products: Store<ProductId, ProductRecord>,

    /// Serializes multi-record mutations.
    pub mutation_lock: Arc<tokio::sync::Mutex<()>>,

    /// Identity token issuer built from the configured secret.
    pub tokens: TokenIssuer,
    /// Password hasher.
    pub passwords: PasswordHasher,

    /// PostgreSQL pool. `None` runs the API in in-memory-only mode.
    pub db_pool: Option<PgPool>,

    /// Prometheus render handle, installed by the binary.
    pub metrics: Option<PrometheusHandle>,

    /// Loaded configuration.
    pub config: AppConfig,
}

impl AppState {
    /// In-memory state with the default development configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// State for `config`, optionally backed by a database pool.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        let tokens = TokenIssuer::new(
            config.jwt_secret.expose_secret().as_bytes(),
            chrono::Duration::hours(config.token_ttl_hours),
        );
        Self {
            users: Store::new(),
            stores: Store::new(),
            products: Store::new(),
            mutation_lock: Arc::new(tokio::sync::Mutex::new(())),
            tokens,
            passwords: PasswordHasher::new(),
            db_pool,
            metrics: None,
            config,
        }
    }

    /// Attach a Prometheus handle for the `/metrics` route.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Look up a user by normalized email.
    pub fn user_by_email(&self, email: &Email) -> Option<UserRecord> {
        self.users.find(|u| &u.email == email)
    }

    /// Hydrate in-memory stores from the database.
    ///
    /// Called once on startup when a database pool is available.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let Some(pool) = &self.db_pool else {
            return Ok(());
        };

        let users = crate::db::users::load_all(pool)
            .await
            .map_err(|e| format!("failed to load users: {e}"))?;
        let user_count = users.len();
        for record in users {
            self.users.insert(record.id, record);
        }

        let stores = crate::db::stores::load_all(pool)
            .await
            .map_err(|e| format!("failed to load stores: {e}"))?;
        let store_count = stores.len();
        for record in stores {
            self.stores.insert(record.id, record);
        }

        let products = crate::db::products::load_all(pool)
            .await
            .map_err(|e| format!("failed to load products: {e}"))?;
        let product_count = products.len();
        for record in products {
            self.products.insert(record.id, record);
        }

        tracing::info!(
            users = user_count,
            stores = store_count,
            products = product_count,
            "Hydrated in-memory stores from database"
        );

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl Directory for AppState {
    fn user(&self, id: &UserId) -> Option<UserRecord> {
        self.users.get(id)
    }

    fn store(&self, id: &StoreId) -> Option<StoreRecord> {
        self.stores.get(id)
    }

    fn product(&self, id: &ProductId) -> Option<ProductRecord> {
        self.products.get(id)
    }
}
