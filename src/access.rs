//! # Access Control & Allow-List
//!
//! Privileged vault operations are gated by a role-membership registry
//! (the "security manager"), and deposits can optionally be restricted to
//! a participant allow-list. Both are externally-owned collaborators the
//! vault talks to through narrow capability traits — never through ambient
//! global state.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

use crate::address::Address;

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Roles understood by the security manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// May grant and revoke all other roles.
    Admin,
    /// May advance the vault through its phase cycle.
    LifecycleManager,
    /// May change operational policy, including the minimum deposit.
    GeneralManager,
    /// May change deposit policy (minimum deposit).
    DepositManager,
    /// May install or clear the deposit allow-list.
    WhitelistManager,
    /// May mint ledger supply.
    TokenMinter,
    /// May burn ledger supply.
    TokenBurner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "Admin",
            Role::LifecycleManager => "LifecycleManager",
            Role::GeneralManager => "GeneralManager",
            Role::DepositManager => "DepositManager",
            Role::WhitelistManager => "WhitelistManager",
            Role::TokenMinter => "TokenMinter",
            Role::TokenBurner => "TokenBurner",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// Role-check predicate consulted before privileged operations.
pub trait AccessControl: Send + Sync {
    /// Returns `true` if `account` holds `role`.
    fn has_role(&self, account: &Address, role: Role) -> bool;
}

/// Participant gate consulted before deposits when configured.
pub trait AllowList: Send + Sync {
    /// Returns `true` if `account` may deposit.
    fn is_allowed(&self, account: &Address) -> bool;
}

// ---------------------------------------------------------------------------
// RoleRegistry
// ---------------------------------------------------------------------------

/// Errors from registry administration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The caller does not hold the role required for this operation.
    #[error("unauthorized: {account} lacks role {role}")]
    Unauthorized {
        /// The account that attempted the operation.
        account: Address,
        /// The role it would have needed.
        role: Role,
    },
}

/// In-memory role-membership registry.
///
/// Grants and revocations are themselves gated: only an [`Role::Admin`]
/// may change memberships. The deployer named at construction receives
/// the admin role.
pub struct RoleRegistry {
    members: RwLock<HashMap<Address, HashSet<Role>>>,
}

impl RoleRegistry {
    /// Creates a registry with `admin` as the initial administrator.
    pub fn new(admin: Address) -> Self {
        let mut members = HashMap::new();
        members.insert(admin, HashSet::from([Role::Admin]));
        Self {
            members: RwLock::new(members),
        }
    }

    /// Grants `role` to `account`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthorized`] if `granter` is not an admin.
    pub fn grant_role(
        &self,
        granter: &Address,
        account: &Address,
        role: Role,
    ) -> Result<(), AccessError> {
        self.require_admin(granter)?;
        self.members
            .write()
            .entry(account.clone())
            .or_default()
            .insert(role);
        Ok(())
    }

    /// Revokes `role` from `account`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthorized`] if `revoker` is not an admin.
    pub fn revoke_role(
        &self,
        revoker: &Address,
        account: &Address,
        role: Role,
    ) -> Result<(), AccessError> {
        self.require_admin(revoker)?;
        if let Some(roles) = self.members.write().get_mut(account) {
            roles.remove(&role);
        }
        Ok(())
    }

    fn require_admin(&self, account: &Address) -> Result<(), AccessError> {
        if self.has_role(account, Role::Admin) {
            Ok(())
        } else {
            Err(AccessError::Unauthorized {
                account: account.clone(),
                role: Role::Admin,
            })
        }
    }
}

impl AccessControl for RoleRegistry {
    fn has_role(&self, account: &Address, role: Role) -> bool {
        self.members
            .read()
            .get(account)
            .is_some_and(|roles| roles.contains(&role))
    }
}

// ---------------------------------------------------------------------------
// Whitelist
// ---------------------------------------------------------------------------

/// In-memory participant allow-list.
pub struct Whitelist {
    members: RwLock<HashSet<Address>>,
}

impl Whitelist {
    /// Creates an empty allow-list.
    pub fn new() -> Self {
        Self {
            members: RwLock::new(HashSet::new()),
        }
    }

    /// Adds `account` to the list.
    pub fn add(&self, account: Address) {
        self.members.write().insert(account);
    }

    /// Removes `account` from the list.
    pub fn remove(&self, account: &Address) {
        self.members.write().remove(account);
    }
}

impl Default for Whitelist {
    fn default() -> Self {
        Self::new()
    }
}

impl AllowList for Whitelist {
    fn is_allowed(&self, account: &Address) -> bool {
        self.members.read().contains(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    #[test]
    fn deployer_is_admin() {
        let registry = RoleRegistry::new(addr("0xadmin"));
        assert!(registry.has_role(&addr("0xadmin"), Role::Admin));
        assert!(!registry.has_role(&addr("0xadmin"), Role::LifecycleManager));
    }

    #[test]
    fn admin_grants_and_revokes() {
        let registry = RoleRegistry::new(addr("0xadmin"));
        registry
            .grant_role(&addr("0xadmin"), &addr("0xops"), Role::LifecycleManager)
            .unwrap();
        assert!(registry.has_role(&addr("0xops"), Role::LifecycleManager));

        registry
            .revoke_role(&addr("0xadmin"), &addr("0xops"), Role::LifecycleManager)
            .unwrap();
        assert!(!registry.has_role(&addr("0xops"), Role::LifecycleManager));
    }

    #[test]
    fn non_admin_cannot_grant() {
        let registry = RoleRegistry::new(addr("0xadmin"));
        let result = registry.grant_role(&addr("0xmallory"), &addr("0xmallory"), Role::Admin);
        assert!(matches!(result, Err(AccessError::Unauthorized { .. })));
        assert!(!registry.has_role(&addr("0xmallory"), Role::Admin));
    }

    #[test]
    fn whitelist_membership() {
        let list = Whitelist::new();
        assert!(!list.is_allowed(&addr("0xalice")));

        list.add(addr("0xalice"));
        assert!(list.is_allowed(&addr("0xalice")));

        list.remove(&addr("0xalice"));
        assert!(!list.is_allowed(&addr("0xalice")));
    }

    #[test]
    fn role_display_names() {
        assert_eq!(Role::LifecycleManager.to_string(), "LifecycleManager");
        assert_eq!(Role::DepositManager.to_string(), "DepositManager");
    }
}
