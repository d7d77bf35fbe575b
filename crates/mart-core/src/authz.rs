//! # Store Authorization Model
//!
//! Decides whether a principal may act on a store (and, through
//! `store_id`, on the store's products) and how much detail a read
//! response carries.
//!
//! ## Rules
//!
//! A principal is authorized iff it is present, the store exists, and the
//! principal is the store's manager or, when the scope admits staff, a
//! member of the staff set.
//!
//! | Operation                       | Scope            |
//! |---------------------------------|------------------|
//! | create / update / delete product | `ManagerOrStaff` |
//! | add staff, delete store         | `ManagerOnly`    |
//! | read detail level               | `ManagerOrStaff` |
//!
//! [`authorize`] keeps the reason for a denial so callers can log it;
//! [`is_authorized`] collapses the decision to a boolean. Both fail closed.

use std::collections::HashSet;

use thiserror::Error;

use crate::identity::{StoreId, UserId};
use crate::model::StoreRecord;
use crate::role::Role;

/// Who besides the manager may perform an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    /// Only the store's manager.
    ManagerOnly,
    /// The manager or any staff member.
    ManagerOrStaff,
}

impl AccessScope {
    /// Build a scope from the `manager_only` flag.
    pub fn from_manager_only(manager_only: bool) -> Self {
        if manager_only {
            Self::ManagerOnly
        } else {
            Self::ManagerOrStaff
        }
    }
}

/// Why a principal was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No authenticated principal.
    Anonymous,
    /// The referenced store does not exist.
    StoreMissing,
    /// The principal is neither manager nor (where admitted) staff.
    NotMember,
}

impl DenyReason {
    /// Short machine-readable label, used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::StoreMissing => "store_missing",
            Self::NotMember => "not_member",
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The operation may proceed.
    Allowed,
    /// The operation is refused.
    Denied(DenyReason),
}

impl Decision {
    /// Whether the decision permits the operation.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Level of detail in a read response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detail {
    /// Public fields only.
    Base,
    /// Public fields plus timestamps and identities of the people involved.
    Extended,
}

impl Detail {
    /// Extended when `authorized`, otherwise base.
    pub fn from_authorized(authorized: bool) -> Self {
        if authorized {
            Self::Extended
        } else {
            Self::Base
        }
    }
}

/// Decide whether `principal` may act on `store` within `scope`.
pub fn authorize(
    store: Option<&StoreRecord>,
    principal: Option<&UserId>,
    scope: AccessScope,
) -> Decision {
    let Some(principal) = principal else {
        return Decision::Denied(DenyReason::Anonymous);
    };
    let Some(store) = store else {
        return Decision::Denied(DenyReason::StoreMissing);
    };
    if store.is_manager(principal) {
        return Decision::Allowed;
    }
    if scope == AccessScope::ManagerOrStaff && store.has_staff(principal) {
        return Decision::Allowed;
    }
    Decision::Denied(DenyReason::NotMember)
}

/// Boolean form of [`authorize`].
pub fn is_authorized(
    store: Option<&StoreRecord>,
    principal: Option<&UserId>,
    manager_only: bool,
) -> bool {
    authorize(store, principal, AccessScope::from_manager_only(manager_only)).is_allowed()
}

/// Detail level `principal` gets when reading something owned by `store`.
pub fn detail_for(store: Option<&StoreRecord>, principal: Option<&UserId>) -> Detail {
    Detail::from_authorized(is_authorized(store, principal, false))
}

/// Why a user cannot be added to a store's staff.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffRejection {
    /// The candidate is already in this store's staff set.
    #[error("user is already part of the staff")]
    AlreadyStaff,
    /// The candidate already manages or works at a store.
    #[error("user is already associated with another store (role: {0})")]
    AlreadyAssigned(Role),
}

/// Check the staff-addition rules for a candidate.
///
/// A user holds at most one store relation, so anyone whose role is
/// already manager or staff is refused.
pub fn check_staff_candidate(
    store: &StoreRecord,
    candidate: &UserId,
    candidate_role: Role,
) -> Result<(), StaffRejection> {
    if store.has_staff(candidate) {
        return Err(StaffRejection::AlreadyStaff);
    }
    if candidate_role.is_store_bound() {
        return Err(StaffRejection::AlreadyAssigned(candidate_role));
    }
    Ok(())
}

/// Ids of the stores where `principal` is manager or staff.
pub fn stores_for<'a>(
    principal: &UserId,
    stores: impl IntoIterator<Item = &'a StoreRecord>,
) -> HashSet<StoreId> {
    stores
        .into_iter()
        .filter(|s| s.is_member(principal))
        .map(|s| s.id)
        .collect()
}

/// Role implied by a user's current memberships.
///
/// Managing any store wins over staffing one; no membership at all means
/// a plain user. Used to re-derive roles after membership shrinks.
pub fn role_from_membership<'a>(
    user: &UserId,
    stores: impl IntoIterator<Item = &'a StoreRecord>,
) -> Role {
    let mut role = Role::User;
    for store in stores {
        if store.is_manager(user) {
            return Role::Manager;
        }
        if store.has_staff(user) {
            role = Role::Staff;
        }
    }
    role
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        store: StoreRecord,
        manager: UserId,
        staff: UserId,
        stranger: UserId,
    }

    fn fixture() -> Fixture {
        let manager = UserId::new();
        let staff = UserId::new();
        let mut store = StoreRecord::new("Loja 1", manager);
        store.staff.push(staff);
        Fixture {
            store,
            manager,
            staff,
            stranger: UserId::new(),
        }
    }

    #[test]
    fn manager_is_authorized_in_both_scopes() {
        let f = fixture();
        assert!(is_authorized(Some(&f.store), Some(&f.manager), false));
        assert!(is_authorized(Some(&f.store), Some(&f.manager), true));
    }

    #[test]
    fn staff_is_authorized_only_when_staff_admitted() {
        let f = fixture();
        assert!(is_authorized(Some(&f.store), Some(&f.staff), false));
        assert_eq!(
            authorize(Some(&f.store), Some(&f.staff), AccessScope::ManagerOnly),
            Decision::Denied(DenyReason::NotMember)
        );
    }

    #[test]
    fn stranger_is_denied() {
        let f = fixture();
        assert_eq!(
            authorize(Some(&f.store), Some(&f.stranger), AccessScope::ManagerOrStaff),
            Decision::Denied(DenyReason::NotMember)
        );
    }

    #[test]
    fn anonymous_is_denied_before_store_lookup() {
        assert_eq!(
            authorize(None, None, AccessScope::ManagerOrStaff),
            Decision::Denied(DenyReason::Anonymous)
        );
        let f = fixture();
        assert!(!is_authorized(Some(&f.store), None, false));
    }

    #[test]
    fn missing_store_is_denied() {
        let f = fixture();
        assert_eq!(
            authorize(None, Some(&f.manager), AccessScope::ManagerOrStaff),
            Decision::Denied(DenyReason::StoreMissing)
        );
    }

    #[test]
    fn detail_level_follows_membership() {
        let f = fixture();
        assert_eq!(detail_for(Some(&f.store), Some(&f.manager)), Detail::Extended);
        assert_eq!(detail_for(Some(&f.store), Some(&f.staff)), Detail::Extended);
        assert_eq!(detail_for(Some(&f.store), Some(&f.stranger)), Detail::Base);
        assert_eq!(detail_for(Some(&f.store), None), Detail::Base);
    }

    #[test]
    fn staff_candidate_already_in_staff_is_rejected() {
        let f = fixture();
        assert_eq!(
            check_staff_candidate(&f.store, &f.staff, Role::User),
            Err(StaffRejection::AlreadyStaff)
        );
    }

    #[test]
    fn staff_candidate_bound_to_another_store_is_rejected() {
        let f = fixture();
        assert_eq!(
            check_staff_candidate(&f.store, &f.stranger, Role::Manager),
            Err(StaffRejection::AlreadyAssigned(Role::Manager))
        );
        assert_eq!(
            check_staff_candidate(&f.store, &f.stranger, Role::Staff),
            Err(StaffRejection::AlreadyAssigned(Role::Staff))
        );
    }

    #[test]
    fn plain_user_can_join_staff() {
        let f = fixture();
        assert!(check_staff_candidate(&f.store, &f.stranger, Role::User).is_ok());
    }

    #[test]
    fn stores_for_collects_managed_and_staffed_stores() {
        let f = fixture();
        let other = StoreRecord::new("Loja 2", f.staff);
        let unrelated = StoreRecord::new("Loja 3", UserId::new());
        let all = [f.store.clone(), other.clone(), unrelated];

        let for_manager = stores_for(&f.manager, &all);
        assert_eq!(for_manager.len(), 1);
        assert!(for_manager.contains(&f.store.id));

        let for_staff = stores_for(&f.staff, &all);
        assert_eq!(for_staff.len(), 2);
        assert!(for_staff.contains(&other.id));

        assert!(stores_for(&f.stranger, &all).is_empty());
    }

    #[test]
    fn role_is_derived_from_remaining_memberships() {
        let f = fixture();
        let stores = [f.store.clone()];
        assert_eq!(role_from_membership(&f.manager, &stores), Role::Manager);
        assert_eq!(role_from_membership(&f.staff, &stores), Role::Staff);
        assert_eq!(role_from_membership(&f.stranger, &stores), Role::User);
        assert_eq!(role_from_membership(&f.manager, std::iter::empty()), Role::User);
    }

    #[test]
    fn managing_outranks_staffing() {
        let f = fixture();
        let own = StoreRecord::new("Própria", f.staff);
        assert_eq!(role_from_membership(&f.staff, [&f.store, &own]), Role::Manager);
    }
}
