//! # Entity Records
//!
//! The three persisted documents: users, stores, and products. Stores
//! carry a denormalized back-link to their products, which handlers keep
//! in sync on product create and delete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::identity::{Email, ProductId, StoreId, UserId};
use crate::role::Role;

/// A registered user.
///
/// The password hash is never serialized outward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique identifier.
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Unique, normalized email address.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Argon2 PHC string.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Global role, mirroring the user's store relation.
    pub role: Role,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Build a freshly registered user with the default role.
    pub fn new(email: Email, name: impl Into<String>, password_hash: String) -> Self {
        Self {
            id: UserId::new(),
            email,
            name: name.into(),
            password_hash,
            role: Role::User,
            created_at: Utc::now(),
        }
    }
}

/// A store, owned by exactly one manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    /// Unique identifier.
    #[serde(rename = "_id")]
    pub id: StoreId,
    /// Display name.
    pub name: String,
    /// Owning user. Set at creation and never changed.
    pub manager: UserId,
    /// Users allowed to manage the store's products.
    pub staff: Vec<UserId>,
    /// Back-link to the store's products.
    pub products: Vec<ProductId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl StoreRecord {
    /// Build a new store managed by `manager`.
    pub fn new(name: impl Into<String>, manager: UserId) -> Self {
        Self {
            id: StoreId::new(),
            name: name.into(),
            manager,
            staff: Vec::new(),
            products: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Whether `user` is this store's manager.
    pub fn is_manager(&self, user: &UserId) -> bool {
        self.manager == *user
    }

    /// Whether `user` is in the staff set.
    pub fn has_staff(&self, user: &UserId) -> bool {
        self.staff.contains(user)
    }

    /// Whether `user` is the manager or a staff member.
    pub fn is_member(&self, user: &UserId) -> bool {
        self.is_manager(user) || self.has_staff(user)
    }

    /// Record a product in the back-link set. Idempotent.
    pub fn link_product(&mut self, product: ProductId) {
        if !self.products.contains(&product) {
            self.products.push(product);
        }
    }

    /// Remove a product from the back-link set.
    pub fn unlink_product(&mut self, product: &ProductId) {
        self.products.retain(|p| p != product);
    }
}

/// A product, owned by exactly one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Unique identifier.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Display name. Required.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Image location.
    pub image_url: Option<String>,
    /// Price in currency minor units.
    pub price: i64,
    /// Owning store. Immutable.
    pub store_id: StoreId,
    /// Creating user. Immutable.
    pub created_by: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Interpret a JSON price field.
///
/// Accepts integers, integral floats, and numeric strings. `null`, an
/// empty string, and an absent field all mean "no price given".
pub fn parse_price(value: Option<&Value>) -> Result<Option<i64>, ValidationError> {
    let invalid = |v: &Value| ValidationError::InvalidPrice(v.to_string());
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(Some(i));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
                _ => Err(invalid(&Value::Number(n.clone()))),
            }
        }
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(v @ Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| invalid(v)),
        Some(other) => Err(invalid(other)),
    }
}
