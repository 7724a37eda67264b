//! Mutation authorization shared by every resource.
//!
//! Reads are public (or merely authenticated) and never reach this module. Every write runs
//! [`authorize`] with the principal resolved at request time and the stored owner of the
//! target row.

use uuid::Uuid;

use crate::domain::principal::Principal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPolicy {
    /// Any authenticated account may create; only the poster or an admin may change it.
    OwnerOrAdmin,
    /// Every write requires the admin role.
    AdminOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    NotOwner,
    AdminOnly,
    ProtectedAccount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(denial),
        }
    }
}

/// `owner` is `None` for creates, where there is no stored row yet.
pub fn authorize(
    policy: MutationPolicy,
    principal: &Principal,
    action: Action,
    owner: Option<Uuid>,
) -> Decision {
    if principal.is_admin() {
        return Decision::Allow;
    }
    match policy {
        MutationPolicy::AdminOnly => Decision::Deny(Denial::AdminOnly),
        MutationPolicy::OwnerOrAdmin => match (action, owner) {
            (Action::Create, _) => Decision::Allow,
            (_, Some(owner)) if principal.owns(owner) => Decision::Allow,
            _ => Decision::Deny(Denial::NotOwner),
        },
    }
}
