//! # Two-Tier Response Projection
//!
//! Every read response is a [`View`]: the resource's base fields,
//! optionally followed by its extended fields when the viewer is
//! authorized. Both blocks are flattened into one JSON object.
//!
//! The extended block is only computed for [`Detail::Extended`], so
//! privileged data never enters a base view to be stripped later.
//!
//! Resources reach related records through a [`Directory`], which the
//! API layer implements over its stores.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::authz::Detail;
use crate::identity::{ProductId, StoreId, UserId};
use crate::model::{ProductRecord, StoreRecord, UserRecord};

/// Read access to related records, used while projecting.
pub trait Directory {
    /// Look up a user.
    fn user(&self, id: &UserId) -> Option<UserRecord>;
    /// Look up a store.
    fn store(&self, id: &StoreId) -> Option<StoreRecord>;
    /// Look up a product.
    fn product(&self, id: &ProductId) -> Option<ProductRecord>;
}

/// A resource with a public and a privileged representation.
pub trait Project {
    /// Fields visible to everyone.
    type Base: Serialize;
    /// Fields visible to authorized viewers only.
    type Extended: Serialize;

    /// Build the public fields.
    fn base(&self, dir: &dyn Directory) -> Self::Base;
    /// Build the privileged fields.
    fn extended(&self, dir: &dyn Directory) -> Self::Extended;
}

/// A projected resource.
#[derive(Debug, Clone, Serialize)]
pub struct View<B, E> {
    /// Public fields.
    #[serde(flatten)]
    pub base: B,
    /// Privileged fields, present only for authorized viewers.
    #[serde(flatten)]
    pub extended: Option<E>,
}

impl<B, E> View<B, E> {
    /// Whether the privileged block is present.
    pub fn is_extended(&self) -> bool {
        self.extended.is_some()
    }
}

/// Project `resource` at the requested level of detail.
pub fn project<P: Project + ?Sized>(
    resource: &P,
    dir: &dyn Directory,
    detail: Detail,
) -> View<P::Base, P::Extended> {
    View {
        base: resource.base(dir),
        extended: match detail {
            Detail::Extended => Some(resource.extended(dir)),
            Detail::Base => None,
        },
    }
}

/// Identity of a person shown in an extended view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    /// User id.
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.as_str().to_string(),
        }
    }
}

/// Reference to the store that owns a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreRef {
    /// Store id.
    #[serde(rename = "_id")]
    pub id: StoreId,
    /// Store name, absent if the store no longer exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Public product fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductBase {
    /// Product id.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Image location.
    pub image_url: Option<String>,
    /// Price in minor units.
    pub price: i64,
    /// Owning store.
    pub store: StoreRef,
}

/// Privileged product fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDetail {
    /// Who created the product.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserSummary>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Project for ProductRecord {
    type Base = ProductBase;
    type Extended = ProductDetail;

    fn base(&self, dir: &dyn Directory) -> ProductBase {
        ProductBase {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            image_url: self.image_url.clone(),
            price: self.price,
            store: StoreRef {
                id: self.store_id,
                name: dir.store(&self.store_id).map(|s| s.name),
            },
        }
    }

    fn extended(&self, dir: &dyn Directory) -> ProductDetail {
        ProductDetail {
            created_by: dir.user(&self.created_by).as_ref().map(UserSummary::from),
            created_at: self.created_at,
        }
    }
}

/// Public store fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreBase {
    /// Store id.
    #[serde(rename = "_id")]
    pub id: StoreId,
    /// Store name.
    pub name: String,
    /// The store's products, each in its public form.
    pub products: Vec<ProductBase>,
}

/// Privileged store fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreDetail {
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// The store's manager.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<UserSummary>,
    /// The store's staff.
    pub staff: Vec<UserSummary>,
}

impl Project for StoreRecord {
    type Base = StoreBase;
    type Extended = StoreDetail;

    fn base(&self, dir: &dyn Directory) -> StoreBase {
        StoreBase {
            id: self.id,
            name: self.name.clone(),
            products: self
                .products
                .iter()
                .filter_map(|id| dir.product(id))
                .map(|p| p.base(dir))
                .collect(),
        }
    }

    fn extended(&self, dir: &dyn Directory) -> StoreDetail {
        StoreDetail {
            created_at: self.created_at,
            manager: dir.user(&self.manager).as_ref().map(UserSummary::from),
            staff: self
                .staff
                .iter()
                .filter_map(|id| dir.user(id))
                .map(|u| UserSummary::from(&u))
                .collect(),
        }
    }
}

/// Projected product.
pub type ProductView = View<ProductBase, ProductDetail>;

/// Projected store.
pub type StoreView = View<StoreBase, StoreDetail>;
