//! # Roles
//!
//! A user's global role. `Manager` and `Staff` mirror the user's relation
//! to a store; a user holds at most one such relation at a time.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Role of a user in the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Plain registered user with no store relation.
    #[default]
    User,
    /// Manager of exactly one store.
    Manager,
    /// Staff member of exactly one store.
    Staff,
}

impl Role {
    /// Return the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Manager => "manager",
            Self::Staff => "staff",
        }
    }

    /// Whether the role ties the user to a store.
    pub fn is_store_bound(&self) -> bool {
        matches!(self, Self::Manager | Self::Staff)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "manager" => Ok(Self::Manager),
            "staff" => Ok(Self::Staff),
            other => Err(ValidationError::InvalidRole(other.to_string())),
        }
    }
}
