//! # Bond Ledger Binding
//!
//! A bond token belongs to exactly one vault for its entire lifetime. The
//! association is a set-once field on the ledger: empty at deployment,
//! populated by a single successful [`VaultBinding::bind`], immutable
//! afterwards. Binding probes the target before accepting it — the
//! address must resolve to a vault whose bond asset is this very ledger,
//! which rejects both arbitrary contracts and vaults wired to a different
//! bond token.

use parking_lot::Mutex;
use thiserror::Error;

use crate::address::Address;
use crate::directory::{ContractDirectory, ContractHandle};

/// Errors from binding a bond ledger to its vault.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// The ledger is already bound; the association is permanent.
    #[error("vault address has already been set")]
    VaultAlreadySet,

    /// The zero address can never be a vault.
    #[error("vault address cannot be the zero address")]
    ZeroAddress,

    /// The address is not a vault for this ledger — nothing is deployed
    /// there, or the deployed vault reports a different bond asset.
    #[error("{0} is not a valid vault for this token")]
    InvalidVaultAddress(Address),

    /// The capability probe against the target contract failed at the
    /// call level: something is deployed there, but it does not answer
    /// as a vault.
    #[error("low-level call to {0} failed")]
    LowLevelCallFailure(Address),
}

/// The set-once vault association carried by a bond ledger.
pub struct VaultBinding {
    vault: Mutex<Option<Address>>,
}

impl VaultBinding {
    /// Creates an unbound association.
    pub fn new() -> Self {
        Self {
            vault: Mutex::new(None),
        }
    }

    /// The bound vault address, if the binding has been set.
    pub fn vault_address(&self) -> Option<Address> {
        self.vault.lock().clone()
    }

    /// Binds the ledger at `bond_asset` to the vault at `vault_addr`.
    ///
    /// The target is probed through `directory`: it must be a deployed
    /// vault, and its bond asset must be `bond_asset`. On success the
    /// address is stored permanently; there are no other side effects.
    ///
    /// # Errors
    ///
    /// - [`BindingError::VaultAlreadySet`] if a binding already exists.
    /// - [`BindingError::ZeroAddress`] for the null address.
    /// - [`BindingError::InvalidVaultAddress`] if nothing is deployed at
    ///   the address, or the vault there is wired to a different bond
    ///   token.
    /// - [`BindingError::LowLevelCallFailure`] if the address holds a
    ///   contract that does not answer the vault probe.
    pub fn bind(
        &self,
        vault_addr: &Address,
        bond_asset: &Address,
        directory: &ContractDirectory,
    ) -> Result<(), BindingError> {
        let mut slot = self.vault.lock();
        if slot.is_some() {
            return Err(BindingError::VaultAlreadySet);
        }
        if vault_addr.is_zero() {
            return Err(BindingError::ZeroAddress);
        }
        match directory.get(vault_addr) {
            None => Err(BindingError::InvalidVaultAddress(vault_addr.clone())),
            Some(ContractHandle::Vault(vault)) => {
                if vault.bond_asset() != bond_asset {
                    return Err(BindingError::InvalidVaultAddress(vault_addr.clone()));
                }
                *slot = Some(vault_addr.clone());
                Ok(())
            }
            Some(_) => Err(BindingError::LowLevelCallFailure(vault_addr.clone())),
        }
    }
}

impl Default for VaultBinding {
    fn default() -> Self {
        Self::new()
    }
}
