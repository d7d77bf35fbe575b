//! # mart-core — Domain Types for the Marketplace
//!
//! Pure domain layer shared by every other crate in the workspace. Nothing
//! in here performs I/O; the API crate supplies lookups through the
//! [`Directory`] trait and this crate decides what a caller may do and see.
//!
//! ## Contents
//!
//! - **Identifiers**: [`UserId`], [`StoreId`], [`ProductId`] are distinct
//!   UUID newtypes. Parsing a malformed id yields a [`ValidationError`],
//!   which the API layer reports as "not found".
//! - **Records**: [`UserRecord`], [`StoreRecord`], [`ProductRecord`].
//! - **Authorization**: [`authz::authorize`] and the boolean collapse
//!   [`authz::is_authorized`], plus the staff-candidate rules.
//! - **Projection**: one generic base/extended [`View`] used for both
//!   stores and products.
//! - **Listing**: pagination clamping and the product-name search filter.
//!
//! ## Crate Policy
//!
//! - Leaf of the dependency graph; depends on no other `mart-*` crate.
//! - No `.unwrap()` outside tests.

#![deny(missing_docs)]

pub mod authz;
pub mod error;
pub mod identity;
pub mod listing;
pub mod model;
pub mod projection;
pub mod role;

pub use authz::{AccessScope, Decision, DenyReason, Detail, StaffRejection};
pub use error::ValidationError;
pub use identity::{Email, ProductId, StoreId, UserId};
pub use listing::{NameFilter, Page};
pub use model::{ProductRecord, StoreRecord, UserRecord};
pub use projection::{project, Directory, Project, ProductView, StoreView, View};
pub use role::Role;
