//! # Contract Directory
//!
//! Maps addresses to the deployed contracts living at them. The origin
//! environment answers "is this address a contract, and does it behave
//! like an X?" by low-level calls and runtime introspection; here the same
//! questions become typed lookups against an explicit directory. An
//! address absent from the directory is not a deployed contract; an
//! address present under the wrong kind is deployed but lacks the
//! capability asked for.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::access::{AccessControl, AllowList};
use crate::address::Address;
use crate::ledger::AssetLedger;
use crate::vault::Vault;

/// A handle to a deployed contract, tagged by capability.
#[derive(Clone)]
pub enum ContractHandle {
    /// A fungible-asset ledger.
    Ledger(Arc<dyn AssetLedger>),
    /// A role-membership registry (security manager).
    AccessControl(Arc<dyn AccessControl>),
    /// A participant allow-list.
    AllowList(Arc<dyn AllowList>),
    /// A custodial vault.
    Vault(Arc<Vault>),
}

/// The deployment environment's address book.
pub struct ContractDirectory {
    entries: RwLock<HashMap<Address, ContractHandle>>,
}

impl ContractDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Records `handle` as deployed at `address`. Re-registering an
    /// address replaces the previous entry.
    pub fn register(&self, address: Address, handle: ContractHandle) {
        self.entries.write().insert(address, handle);
    }

    /// Returns the handle deployed at `address`, if any.
    pub fn get(&self, address: &Address) -> Option<ContractHandle> {
        self.entries.read().get(address).cloned()
    }

    /// Returns `true` if anything is deployed at `address`.
    pub fn contains(&self, address: &Address) -> bool {
        self.entries.read().contains_key(address)
    }

    /// Resolves `address` as a fungible ledger.
    pub fn ledger(&self, address: &Address) -> Option<Arc<dyn AssetLedger>> {
        match self.get(address) {
            Some(ContractHandle::Ledger(ledger)) => Some(ledger),
            _ => None,
        }
    }

    /// Resolves `address` as an access-control registry.
    pub fn access_control(&self, address: &Address) -> Option<Arc<dyn AccessControl>> {
        match self.get(address) {
            Some(ContractHandle::AccessControl(registry)) => Some(registry),
            _ => None,
        }
    }

    /// Resolves `address` as an allow-list.
    pub fn allow_list(&self, address: &Address) -> Option<Arc<dyn AllowList>> {
        match self.get(address) {
            Some(ContractHandle::AllowList(list)) => Some(list),
            _ => None,
        }
    }

    /// Resolves `address` as a vault.
    pub fn vault(&self, address: &Address) -> Option<Arc<Vault>> {
        match self.get(address) {
            Some(ContractHandle::Vault(vault)) => Some(vault),
            _ => None,
        }
    }
}

impl Default for ContractDirectory {
    fn default() -> Self {
        Self::new()
    }
}
