//! # Fungible Asset Ledger
//!
//! The vault moves value through the [`AssetLedger`] trait — a narrow
//! ERC-20-shaped capability interface covering balance queries, allowance
//! bookkeeping, transfers, mint, and burn. Two failure channels exist, and
//! the vault must honor both:
//!
//! 1. **Reverts** — hard errors such as an insufficient balance or an
//!    allowance that is too small, reported as [`LedgerError`].
//! 2. **Refusals** — ledgers that signal failure by *returning `false`*
//!    from `transfer`/`transfer_from` while completing the call normally.
//!    Call completion alone never implies success.
//!
//! ## Shared state
//!
//! A ledger is shared between many parties; the vault holds it only as
//! one `Arc<dyn AssetLedger>` handle among others. Unrelated transfers
//! can settle between the legs of a vault operation, so a failed
//! operation must never be unwound by reinstating wholesale ledger
//! state — the caller reverses exactly the entries it changed
//! (compensating transfers, re-instating consumed allowance, burning its
//! own mints) and leaves everyone else's untouched.
//!
//! [`TokenLedger`] is the in-memory implementation: it backs tests and
//! single-process deployments, and doubles as an adversarial fixture —
//! its transfer paths can be switched into the refusal mode.

use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

use crate::address::Address;
use crate::binding::{BindingError, VaultBinding};
use crate::directory::ContractDirectory;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Hard failures reported by a ledger. Refusals (`Ok(false)` from a
/// transfer) are deliberately not errors — see the module docs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The source account does not hold enough units.
    #[error("insufficient balance: account has {balance}, needs {amount}")]
    InsufficientBalance {
        /// Current balance of the source account.
        balance: u64,
        /// Amount the caller tried to move.
        amount: u64,
    },

    /// The spender's allowance does not cover the requested amount.
    #[error("insufficient allowance: approved {allowance}, needs {amount}")]
    InsufficientAllowance {
        /// Amount currently approved for the spender.
        allowance: u64,
        /// Amount the spender tried to move.
        amount: u64,
    },

    /// Minting would overflow the total supply.
    #[error("supply overflow: minting {amount} would exceed u64::MAX")]
    SupplyOverflow {
        /// The amount that was attempted.
        amount: u64,
    },

    /// Crediting would overflow the recipient's balance.
    #[error("balance overflow: crediting {amount} would exceed u64::MAX")]
    BalanceOverflow {
        /// The amount that was attempted.
        amount: u64,
    },

    /// Burning would underflow the recorded total supply. Balances and
    /// supply have diverged; the books are inconsistent.
    #[error("supply underflow: burning {amount} exceeds the recorded supply")]
    SupplyUnderflow {
        /// The amount that was attempted.
        amount: u64,
    },
}

// ---------------------------------------------------------------------------
// AssetLedger trait
// ---------------------------------------------------------------------------

/// The fungible-ledger capability the vault consumes.
///
/// Implementations use interior mutability so handles can be shared as
/// `Arc<dyn AssetLedger>` across the vault and its callers.
pub trait AssetLedger: Send + Sync {
    /// Returns the balance of `account`.
    fn balance_of(&self, account: &Address) -> u64;

    /// Returns the amount `spender` may move on behalf of `owner`.
    fn allowance(&self, owner: &Address, spender: &Address) -> u64;

    /// Returns the total minted supply.
    fn total_supply(&self) -> u64;

    /// Approves `spender` to move up to `amount` of `owner`'s units.
    fn approve(&self, owner: &Address, spender: &Address, amount: u64);

    /// Moves `amount` from `from` to `to`.
    ///
    /// `Ok(false)` means the ledger refused the transfer without
    /// reverting; callers must treat it as failure.
    fn transfer(&self, from: &Address, to: &Address, amount: u64) -> Result<bool, LedgerError>;

    /// Moves `amount` from `owner` to `to` on behalf of `spender`,
    /// consuming allowance. Same `Ok(false)` contract as
    /// [`transfer`](Self::transfer).
    fn transfer_from(
        &self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<bool, LedgerError>;

    /// Mints `amount` new units to `to`.
    fn mint(&self, to: &Address, amount: u64) -> Result<(), LedgerError>;

    /// Burns `amount` units from `from`.
    fn burn(&self, from: &Address, amount: u64) -> Result<(), LedgerError>;

    /// For bond-capable ledgers, the vault this ledger is bound to.
    /// Plain ledgers report `None`.
    fn bound_vault(&self) -> Option<Address> {
        None
    }
}

// ---------------------------------------------------------------------------
// TokenLedger
// ---------------------------------------------------------------------------

/// Monetary state behind the ledger's lock.
#[derive(Debug, Clone)]
struct LedgerState {
    balances: HashMap<Address, u64>,
    allowances: HashMap<(Address, Address), u64>,
    total_supply: u64,
    transfer_enabled: bool,
    transfer_from_enabled: bool,
}

impl LedgerState {
    fn balance(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Checks both sides before committing either, so a failed move never
    /// leaves the books half-updated.
    fn move_balance(&mut self, from: &Address, to: &Address, amount: u64) -> Result<(), LedgerError> {
        let from_balance = self.balance(from);
        if from_balance < amount {
            return Err(LedgerError::InsufficientBalance {
                balance: from_balance,
                amount,
            });
        }
        let to_balance = self.balance(to);
        let new_to = to_balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { amount })?;
        self.balances.insert(from.clone(), from_balance - amount);
        self.balances.insert(to.clone(), new_to);
        Ok(())
    }
}

/// In-memory fungible-asset ledger.
///
/// Tracks balances, allowances, and total supply with checked arithmetic
/// throughout. The transfer paths can be switched off with
/// [`set_transfer_enabled`](Self::set_transfer_enabled) /
/// [`set_transfer_from_enabled`](Self::set_transfer_from_enabled), in which
/// case they return `Ok(false)` — the refusal mode some deployed tokens
/// exhibit and the vault has to survive.
pub struct TokenLedger {
    address: Address,
    name: String,
    symbol: String,
    decimals: u8,
    state: RwLock<LedgerState>,
    binding: VaultBinding,
}

impl TokenLedger {
    /// Creates an empty ledger deployed at `address`.
    pub fn new(
        address: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
    ) -> Self {
        Self {
            address,
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            state: RwLock::new(LedgerState {
                balances: HashMap::new(),
                allowances: HashMap::new(),
                total_supply: 0,
                transfer_enabled: true,
                transfer_from_enabled: true,
            }),
            binding: VaultBinding::new(),
        }
    }

    /// The address this ledger is deployed at.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Token name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Display decimals. The ledger itself never divides.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Switches the `transfer` path on or off. When off, `transfer`
    /// completes but returns `false`.
    pub fn set_transfer_enabled(&self, enabled: bool) {
        self.state.write().transfer_enabled = enabled;
    }

    /// Switches the `transfer_from` path on or off.
    pub fn set_transfer_from_enabled(&self, enabled: bool) {
        self.state.write().transfer_from_enabled = enabled;
    }

    /// Binds this ledger, as a bond token, to the vault at `vault`.
    ///
    /// Delegates to [`VaultBinding::bind`]: the association is settable
    /// exactly once, and the target must prove it is a vault whose bond
    /// asset is this ledger.
    pub fn set_vault_address(
        &self,
        vault: &Address,
        directory: &ContractDirectory,
    ) -> Result<(), BindingError> {
        self.binding.bind(vault, &self.address, directory)
    }

    /// The vault this ledger is bound to, if any.
    pub fn vault_address(&self) -> Option<Address> {
        self.binding.vault_address()
    }
}

impl AssetLedger for TokenLedger {
    fn balance_of(&self, account: &Address) -> u64 {
        self.state.read().balance(account)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u64 {
        self.state
            .read()
            .allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn total_supply(&self) -> u64 {
        self.state.read().total_supply
    }

    fn approve(&self, owner: &Address, spender: &Address, amount: u64) {
        self.state
            .write()
            .allowances
            .insert((owner.clone(), spender.clone()), amount);
    }

    fn transfer(&self, from: &Address, to: &Address, amount: u64) -> Result<bool, LedgerError> {
        let mut state = self.state.write();
        if !state.transfer_enabled {
            return Ok(false);
        }
        state.move_balance(from, to, amount)?;
        Ok(true)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<bool, LedgerError> {
        let mut state = self.state.write();
        if !state.transfer_from_enabled {
            return Ok(false);
        }
        let key = (owner.clone(), spender.clone());
        let allowance = state.allowances.get(&key).copied().unwrap_or(0);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance { allowance, amount });
        }
        state.move_balance(owner, to, amount)?;
        state.allowances.insert(key, allowance - amount);
        Ok(true)
    }

    fn mint(&self, to: &Address, amount: u64) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        let new_supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow { amount })?;
        let new_balance = state
            .balance(to)
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { amount })?;
        state.total_supply = new_supply;
        state.balances.insert(to.clone(), new_balance);
        Ok(())
    }

    fn burn(&self, from: &Address, amount: u64) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        let balance = state.balance(from);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance { balance, amount });
        }
        let new_supply = state
            .total_supply
            .checked_sub(amount)
            .ok_or(LedgerError::SupplyUnderflow { amount })?;
        state.balances.insert(from.clone(), balance - amount);
        state.total_supply = new_supply;
        Ok(())
    }

    fn bound_vault(&self) -> Option<Address> {
        self.binding.vault_address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> TokenLedger {
        TokenLedger::new(Address::new("0xtoken"), "Test Token", "TST", 6)
    }

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    #[test]
    fn mint_increases_supply_and_balance() {
        let l = ledger();
        l.mint(&addr("0xalice"), 1_000_000).unwrap();
        assert_eq!(l.total_supply(), 1_000_000);
        assert_eq!(l.balance_of(&addr("0xalice")), 1_000_000);
    }

    #[test]
    fn mint_overflow_rejected() {
        let l = ledger();
        l.mint(&addr("0xalice"), u64::MAX).unwrap();
        let result = l.mint(&addr("0xbob"), 1);
        assert!(matches!(result, Err(LedgerError::SupplyOverflow { .. })));
        assert_eq!(l.total_supply(), u64::MAX);
    }

    #[test]
    fn burn_decreases_supply_and_balance() {
        let l = ledger();
        l.mint(&addr("0xalice"), 1_000_000).unwrap();
        l.burn(&addr("0xalice"), 400_000).unwrap();
        assert_eq!(l.total_supply(), 600_000);
        assert_eq!(l.balance_of(&addr("0xalice")), 600_000);
    }

    #[test]
    fn burn_more_than_balance_rejected() {
        let l = ledger();
        l.mint(&addr("0xalice"), 100).unwrap();
        let result = l.burn(&addr("0xalice"), 200);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance { balance: 100, amount: 200 })
        ));
    }

    #[test]
    fn transfer_moves_balance() {
        let l = ledger();
        l.mint(&addr("0xalice"), 1000).unwrap();
        assert!(l.transfer(&addr("0xalice"), &addr("0xbob"), 300).unwrap());
        assert_eq!(l.balance_of(&addr("0xalice")), 700);
        assert_eq!(l.balance_of(&addr("0xbob")), 300);
    }

    #[test]
    fn transfer_insufficient_balance_reverts() {
        let l = ledger();
        l.mint(&addr("0xalice"), 100).unwrap();
        let result = l.transfer(&addr("0xalice"), &addr("0xbob"), 200);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance { .. })
        ));
        // Nothing moved.
        assert_eq!(l.balance_of(&addr("0xalice")), 100);
        assert_eq!(l.balance_of(&addr("0xbob")), 0);
    }

    #[test]
    fn disabled_transfer_refuses_without_reverting() {
        let l = ledger();
        l.mint(&addr("0xalice"), 1000).unwrap();
        l.set_transfer_enabled(false);
        assert!(!l.transfer(&addr("0xalice"), &addr("0xbob"), 300).unwrap());
        assert_eq!(l.balance_of(&addr("0xalice")), 1000);

        l.set_transfer_enabled(true);
        assert!(l.transfer(&addr("0xalice"), &addr("0xbob"), 300).unwrap());
    }

    #[test]
    fn transfer_from_requires_allowance() {
        let l = ledger();
        l.mint(&addr("0xowner"), 1000).unwrap();
        let result = l.transfer_from(&addr("0xspender"), &addr("0xowner"), &addr("0xto"), 100);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientAllowance { allowance: 0, amount: 100 })
        ));
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let l = ledger();
        l.mint(&addr("0xowner"), 1000).unwrap();
        l.approve(&addr("0xowner"), &addr("0xspender"), 500);

        assert!(l
            .transfer_from(&addr("0xspender"), &addr("0xowner"), &addr("0xto"), 200)
            .unwrap());
        assert_eq!(l.allowance(&addr("0xowner"), &addr("0xspender")), 300);
        assert_eq!(l.balance_of(&addr("0xto")), 200);

        // Spending the rest zeroes the allowance.
        assert!(l
            .transfer_from(&addr("0xspender"), &addr("0xowner"), &addr("0xto"), 300)
            .unwrap());
        assert_eq!(l.allowance(&addr("0xowner"), &addr("0xspender")), 0);
    }

    #[test]
    fn allowance_checked_before_balance() {
        let l = ledger();
        l.approve(&addr("0xowner"), &addr("0xspender"), 50);
        // Owner has no balance at all, but the allowance shortfall is
        // what gets reported.
        let result = l.transfer_from(&addr("0xspender"), &addr("0xowner"), &addr("0xto"), 100);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn disabled_transfer_from_refuses() {
        let l = ledger();
        l.mint(&addr("0xowner"), 1000).unwrap();
        l.approve(&addr("0xowner"), &addr("0xspender"), 500);
        l.set_transfer_from_enabled(false);
        assert!(!l
            .transfer_from(&addr("0xspender"), &addr("0xowner"), &addr("0xto"), 200)
            .unwrap());
        // Allowance untouched by a refusal.
        assert_eq!(l.allowance(&addr("0xowner"), &addr("0xspender")), 500);
    }

    #[test]
    fn burn_keeps_supply_consistent_with_balances() {
        let l = ledger();
        l.mint(&addr("0xalice"), 700).unwrap();
        l.mint(&addr("0xbob"), 300).unwrap();
        l.transfer(&addr("0xalice"), &addr("0xbob"), 200).unwrap();

        l.burn(&addr("0xbob"), 500).unwrap();
        assert_eq!(l.total_supply(), 500);

        // Burning the entire remainder lands supply exactly on zero; the
        // subtraction is checked, never saturating.
        l.burn(&addr("0xalice"), 500).unwrap();
        assert_eq!(l.total_supply(), 0);
        assert_eq!(l.balance_of(&addr("0xalice")), 0);
        assert_eq!(l.balance_of(&addr("0xbob")), 0);
    }

    #[test]
    fn fresh_ledger_is_unbound() {
        let l = ledger();
        assert_eq!(l.vault_address(), None);
        assert_eq!(l.bound_vault(), None);
    }

    #[test]
    fn metadata_accessors() {
        let l = ledger();
        assert_eq!(l.name(), "Test Token");
        assert_eq!(l.symbol(), "TST");
        assert_eq!(l.decimals(), 6);
        assert_eq!(l.address(), &Address::new("0xtoken"));
    }
}
