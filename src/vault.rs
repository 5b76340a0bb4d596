//! # Vault
//!
//! The phased custodial vault at the heart of the facility. Depositors
//! hand over the base asset and receive the bond asset at the phase's
//! exchange rate; after the lock window they redeem the bond asset for
//! base at the (operator-rolled) withdrawal rate. The lifecycle is a
//! strict three-phase cycle with no terminal state:
//!
//! ```text
//! Deposit ──► Locked ──► Withdraw ──► Deposit ──► …
//! ```
//!
//! Each transition installs a fresh [`ExchangeRate`], so the rate a
//! depositor entered at and the rate they exit at differ by whatever the
//! lifecycle manager rolled in between — that spread is the facility's
//! yield.
//!
//! ## Atomicity
//!
//! Every state-changing operation runs under one mutex, so no two
//! operations interleave against the same vault. The ledgers themselves
//! are shared with other parties, so a failed operation unwinds only the
//! entries it changed: completed legs are reversed with compensating
//! transfers, consumed allowance is re-instated, and any shortfall mint
//! is burned back. Unrelated transfers that settled in between are left
//! alone. Failures are reported to the caller and never retried
//! internally.
//!
//! ## Liquidity
//!
//! If the vault's bond reserves cannot cover a deposit's payout, the
//! shortfall is minted to the vault on the spot — a depositor always
//! receives the full converted amount. No such backstop exists for the
//! base asset on withdrawal; keeping the vault funded for redemptions is
//! an operator responsibility.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::access::{AccessControl, AllowList, Role};
use crate::address::Address;
use crate::directory::{ContractDirectory, ContractHandle};
use crate::ledger::{AssetLedger, LedgerError};
use crate::rate::{ExchangeRate, RateError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur constructing or operating a vault.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The base-token address is the zero address.
    #[error("Base Token 0 address")]
    BaseTokenZeroAddress,

    /// Nothing is deployed at the base-token address.
    #[error("BaseToken invalid contract")]
    BaseTokenInvalidContract,

    /// The bond-token address is the zero address.
    #[error("Bond Token 0 address")]
    BondTokenZeroAddress,

    /// Nothing is deployed at the bond-token address.
    #[error("BondToken invalid contract")]
    BondTokenInvalidContract,

    /// The contract at the address is not a fungible-asset ledger.
    #[error("token at {0} does not behave as an ERC20 ledger")]
    NotErc20(Address),

    /// The supplied bond token is already bound to a different vault.
    #[error("Bond Token already in use")]
    BondTokenInUse,

    /// Base and bond assets must be two distinct ledgers.
    #[error("base and bond tokens must be distinct")]
    DuplicateToken,

    /// The security-manager address is the zero address.
    #[error("security manager cannot be the zero address")]
    ZeroAddress,

    /// The security-manager address does not answer as an access-control
    /// registry.
    #[error("low-level call to the security manager failed")]
    LowLevelCallFailure,

    /// The operation is not permitted in the vault's current phase.
    #[error("vault out of phase: currently {current}, operation requires {required}")]
    OutOfPhase {
        /// The phase the vault is in.
        current: Phase,
        /// The phase the operation needs.
        required: Phase,
    },

    /// Zero-amount operations are rejected regardless of policy.
    #[error("zero amount argument")]
    ZeroAmount,

    /// The deposit is below the configured minimum.
    #[error("deposit of {amount} is below the minimum of {minimum}")]
    BelowMinimum {
        /// The amount offered.
        amount: u64,
        /// The minimum currently in force.
        minimum: u64,
    },

    /// The caller lacks the role required for a privileged operation.
    #[error("unauthorized: {caller} lacks role {role}")]
    Unauthorized {
        /// The account that attempted the operation.
        caller: Address,
        /// The role it would have needed.
        role: Role,
    },

    /// An allow-list is configured and the caller is not on it.
    #[error("account {0} is not on the allow-list")]
    NotAllowed(Address),

    /// The caller has not approved the vault for enough of the inbound
    /// asset.
    #[error("insufficient allowance: needed {needed}, approved {allowance}")]
    InsufficientAllowance {
        /// The amount the operation needed to pull.
        needed: u64,
        /// The amount actually approved.
        allowance: u64,
    },

    /// A ledger transfer failed or was refused; the operation was rolled
    /// back.
    #[error("token transfer failed")]
    TokenTransferFailed,

    /// The address does not resolve to a contract of the expected kind.
    #[error("{0} is not a deployed contract of the expected kind")]
    InvalidContract(Address),

    /// Rate conversion failed.
    #[error(transparent)]
    Rate(#[from] RateError),

    /// A mint or burn against a ledger failed.
    #[error("ledger operation failed: {0}")]
    Ledger(#[from] LedgerError),
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The vault's lifecycle phase. Strictly cyclic; the vault starts in
/// `Deposit` and runs forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Deposits are open; base comes in, bond goes out.
    Deposit,
    /// The facility is closed in both directions.
    Locked,
    /// Redemptions are open; bond comes in, base goes out.
    Withdraw,
}

impl Phase {
    /// The next phase in the cycle.
    pub fn next(self) -> Phase {
        match self {
            Phase::Deposit => Phase::Locked,
            Phase::Locked => Phase::Withdraw,
            Phase::Withdraw => Phase::Deposit,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Deposit => write!(f, "Deposit"),
            Phase::Locked => write!(f, "Locked"),
            Phase::Withdraw => write!(f, "Withdraw"),
        }
    }
}

// ---------------------------------------------------------------------------
// Events & receipts
// ---------------------------------------------------------------------------

/// Event records retained per vault. The vault runs indefinitely, so the
/// log is a ring: once full, recording drops the oldest entry.
pub const MAX_EVENT_RECORDS: usize = 1024;

/// An observable state change, kept in the vault's event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VaultEvent {
    /// A deposit settled: `amount_in` base taken, `amount_out` bond paid.
    Deposit {
        /// The depositing account.
        caller: Address,
        /// The account credited with the bond asset.
        recipient: Address,
        /// Base-asset amount taken in.
        amount_in: u64,
        /// Bond-asset amount paid out.
        amount_out: u64,
    },
    /// A withdrawal settled: `amount_in` bond taken, `amount_out` base
    /// paid.
    Withdraw {
        /// The redeeming account.
        caller: Address,
        /// The account credited with the base asset.
        recipient: Address,
        /// Bond-asset amount taken in.
        amount_in: u64,
        /// Base-asset amount paid out.
        amount_out: u64,
    },
    /// The lifecycle advanced and a new rate was installed.
    PhaseChanged {
        /// The phase being left.
        old_phase: Phase,
        /// The phase entered.
        new_phase: Phase,
        /// The rate now in force.
        rate: ExchangeRate,
    },
    /// The minimum-deposit policy changed.
    MinimumDepositChanged {
        /// The previous minimum.
        old_minimum: u64,
        /// The new minimum.
        new_minimum: u64,
    },
}

/// A logged event with its record id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// When the event was recorded (UTC).
    pub at: DateTime<Utc>,
    /// The event payload.
    pub event: VaultEvent,
}

/// Receipt returned by [`Vault::deposit`] and [`Vault::withdraw`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeReceipt {
    /// The account that initiated the exchange.
    pub caller: Address,
    /// The account credited with the outbound asset.
    pub recipient: Address,
    /// Amount of the inbound asset taken.
    pub amount_in: u64,
    /// Amount of the outbound asset paid.
    pub amount_out: u64,
    /// When the exchange settled (UTC).
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Construction parameters for a vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// The address the vault itself is deployed at.
    pub address: Address,
    /// Address of the base-asset ledger (what depositors pay in).
    pub base_asset: Address,
    /// Address of the bond-asset ledger (what the vault issues).
    pub bond_asset: Address,
    /// Address of the security manager (role registry).
    pub security_manager: Address,
    /// Minimum deposit; zero disables the floor.
    pub minimum_deposit: u64,
    /// Optional allow-list address; absent means unrestricted deposits.
    pub whitelist: Option<Address>,
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// Mutable vault state, serialized behind a single lock.
struct VaultState {
    phase: Phase,
    current_rate: ExchangeRate,
    minimum_deposit: u64,
    whitelist: Option<Arc<dyn AllowList>>,
    events: VecDeque<EventRecord>,
}

impl VaultState {
    fn record(&mut self, event: VaultEvent) {
        if self.events.len() == MAX_EVENT_RECORDS {
            self.events.pop_front();
        }
        self.events.push_back(EventRecord {
            id: Uuid::new_v4(),
            at: Utc::now(),
            event,
        });
    }
}

/// The phased custodial vault.
///
/// Collaborator handles are resolved once at construction and held for
/// the vault's lifetime; the asset addresses are immutable. All mutable
/// state lives behind one `Mutex`, which is the serialization point for
/// every externally observable operation.
pub struct Vault {
    address: Address,
    base_asset: Address,
    bond_asset: Address,
    base_ledger: Arc<dyn AssetLedger>,
    bond_ledger: Arc<dyn AssetLedger>,
    access_control: Arc<dyn AccessControl>,
    state: Mutex<VaultState>,
}

impl Vault {
    /// Validates `config` against the deployment directory and creates
    /// the vault in the `Deposit` phase at the parity rate.
    ///
    /// # Errors
    ///
    /// Construction is all-or-nothing. Token checks run first (zero
    /// address, deployed contract, ledger capability, for base then
    /// bond), then the bond token's existing binding, then the security
    /// manager (zero address, registry capability).
    pub fn new(config: VaultConfig, directory: &ContractDirectory) -> Result<Self, VaultError> {
        if config.base_asset.is_zero() {
            return Err(VaultError::BaseTokenZeroAddress);
        }
        let base_ledger = match directory.get(&config.base_asset) {
            None => return Err(VaultError::BaseTokenInvalidContract),
            Some(ContractHandle::Ledger(ledger)) => ledger,
            Some(_) => return Err(VaultError::NotErc20(config.base_asset.clone())),
        };

        if config.bond_asset.is_zero() {
            return Err(VaultError::BondTokenZeroAddress);
        }
        let bond_ledger = match directory.get(&config.bond_asset) {
            None => return Err(VaultError::BondTokenInvalidContract),
            Some(ContractHandle::Ledger(ledger)) => ledger,
            Some(_) => return Err(VaultError::NotErc20(config.bond_asset.clone())),
        };

        if config.base_asset == config.bond_asset {
            return Err(VaultError::DuplicateToken);
        }

        // A bond token already serving another vault is off limits; one
        // already pointing at this address (re-deployment) is fine.
        if let Some(bound) = bond_ledger.bound_vault() {
            if bound != config.address {
                return Err(VaultError::BondTokenInUse);
            }
        }

        if config.security_manager.is_zero() {
            return Err(VaultError::ZeroAddress);
        }
        let access_control = directory
            .access_control(&config.security_manager)
            .ok_or(VaultError::LowLevelCallFailure)?;

        let whitelist = match &config.whitelist {
            None => None,
            Some(addr) => Some(
                directory
                    .allow_list(addr)
                    .ok_or_else(|| VaultError::InvalidContract(addr.clone()))?,
            ),
        };

        info!(
            vault = %config.address,
            base = %config.base_asset,
            bond = %config.bond_asset,
            minimum_deposit = config.minimum_deposit,
            "vault created"
        );

        Ok(Self {
            address: config.address,
            base_asset: config.base_asset,
            bond_asset: config.bond_asset,
            base_ledger,
            bond_ledger,
            access_control,
            state: Mutex::new(VaultState {
                phase: Phase::Deposit,
                current_rate: ExchangeRate::parity(),
                minimum_deposit: config.minimum_deposit,
                whitelist,
                events: VecDeque::new(),
            }),
        })
    }

    // -----------------------------------------------------------------------
    // Read accessors
    // -----------------------------------------------------------------------

    /// The vault's own address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Address of the base-asset ledger.
    pub fn base_asset(&self) -> &Address {
        &self.base_asset
    }

    /// Address of the bond-asset ledger.
    pub fn bond_asset(&self) -> &Address {
        &self.bond_asset
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    /// The rate in force for the current phase.
    pub fn current_rate(&self) -> ExchangeRate {
        self.state.lock().current_rate
    }

    /// The minimum deposit currently enforced (zero = no floor).
    pub fn minimum_deposit(&self) -> u64 {
        self.state.lock().minimum_deposit
    }

    /// Returns `true` if a deposit allow-list is configured.
    pub fn has_whitelist(&self) -> bool {
        self.state.lock().whitelist.is_some()
    }

    /// A copy of the event log, oldest first. At most
    /// [`MAX_EVENT_RECORDS`] entries are retained.
    pub fn events(&self) -> Vec<EventRecord> {
        self.state.lock().events.iter().cloned().collect()
    }

    // -----------------------------------------------------------------------
    // Privileged operations
    // -----------------------------------------------------------------------

    /// Advances the lifecycle to the next phase and installs `next_rate`.
    ///
    /// Requires [`Role::LifecycleManager`]. Returns the phase entered.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Unauthorized`] if the caller lacks the role.
    pub fn progress_to_next_phase(
        &self,
        caller: &Address,
        next_rate: ExchangeRate,
    ) -> Result<Phase, VaultError> {
        self.require_role(caller, Role::LifecycleManager)?;

        let mut state = self.state.lock();
        let old_phase = state.phase;
        let new_phase = old_phase.next();
        state.phase = new_phase;
        state.current_rate = next_rate;
        state.record(VaultEvent::PhaseChanged {
            old_phase,
            new_phase,
            rate: next_rate,
        });

        info!(
            vault = %self.address,
            from = %old_phase,
            to = %new_phase,
            bond_units = next_rate.bond_units(),
            base_units = next_rate.base_units(),
            "phase advanced"
        );
        Ok(new_phase)
    }

    /// Sets the minimum deposit. Zero disables the floor.
    ///
    /// Requires [`Role::GeneralManager`] or [`Role::DepositManager`].
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Unauthorized`] if the caller holds neither
    /// role.
    pub fn set_minimum_deposit(&self, caller: &Address, value: u64) -> Result<(), VaultError> {
        if !self.access_control.has_role(caller, Role::GeneralManager)
            && !self.access_control.has_role(caller, Role::DepositManager)
        {
            return Err(VaultError::Unauthorized {
                caller: caller.clone(),
                role: Role::DepositManager,
            });
        }

        let mut state = self.state.lock();
        let old_minimum = state.minimum_deposit;
        state.minimum_deposit = value;
        state.record(VaultEvent::MinimumDepositChanged {
            old_minimum,
            new_minimum: value,
        });

        info!(vault = %self.address, old = old_minimum, new = value, "minimum deposit changed");
        Ok(())
    }

    /// Installs, replaces, or clears (`None`) the deposit allow-list.
    ///
    /// Requires [`Role::WhitelistManager`]. Unlike the bond binding there
    /// is no set-once constraint.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Unauthorized`] if the caller lacks the role
    /// and [`VaultError::InvalidContract`] if the address does not
    /// resolve to an allow-list.
    pub fn set_whitelist(
        &self,
        caller: &Address,
        whitelist: Option<Address>,
        directory: &ContractDirectory,
    ) -> Result<(), VaultError> {
        self.require_role(caller, Role::WhitelistManager)?;

        let resolved = match &whitelist {
            None => None,
            Some(addr) => Some(
                directory
                    .allow_list(addr)
                    .ok_or_else(|| VaultError::InvalidContract(addr.clone()))?,
            ),
        };

        self.state.lock().whitelist = resolved;
        info!(vault = %self.address, configured = whitelist.is_some(), "whitelist updated");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Exchange operations
    // -----------------------------------------------------------------------

    /// Exchanges `amount` of the base asset for bond tokens at the
    /// current rate.
    ///
    /// Only available in the `Deposit` phase. The caller must have
    /// approved the vault for at least `amount` on the base ledger. If
    /// the vault's bond reserves fall short of the payout, the shortfall
    /// is minted to the vault before paying out. The whole operation is
    /// atomic: any transfer failure reverses the legs already settled.
    ///
    /// # Errors
    ///
    /// [`VaultError::OutOfPhase`], [`VaultError::ZeroAmount`],
    /// [`VaultError::BelowMinimum`], [`VaultError::NotAllowed`],
    /// [`VaultError::InsufficientAllowance`], or
    /// [`VaultError::TokenTransferFailed`].
    pub fn deposit(&self, caller: &Address, amount: u64) -> Result<ExchangeReceipt, VaultError> {
        let mut state = self.state.lock();

        if state.phase != Phase::Deposit {
            return Err(VaultError::OutOfPhase {
                current: state.phase,
                required: Phase::Deposit,
            });
        }
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }
        if amount < state.minimum_deposit {
            return Err(VaultError::BelowMinimum {
                amount,
                minimum: state.minimum_deposit,
            });
        }
        if let Some(list) = &state.whitelist {
            if !list.is_allowed(caller) {
                return Err(VaultError::NotAllowed(caller.clone()));
            }
        }

        let bond_out = state.current_rate.base_to_bond(amount)?;

        if let Err(e) = self.deposit_transfers(caller, amount, bond_out) {
            warn!(vault = %self.address, caller = %caller, amount, error = %e, "deposit failed");
            return Err(e);
        }

        state.record(VaultEvent::Deposit {
            caller: caller.clone(),
            recipient: caller.clone(),
            amount_in: amount,
            amount_out: bond_out,
        });
        info!(vault = %self.address, caller = %caller, amount_in = amount, amount_out = bond_out, "deposit settled");

        Ok(ExchangeReceipt {
            caller: caller.clone(),
            recipient: caller.clone(),
            amount_in: amount,
            amount_out: bond_out,
            timestamp: Utc::now(),
        })
    }

    /// Redeems `amount` of the bond asset for base tokens at the current
    /// rate.
    ///
    /// Only available in the `Withdraw` phase. The caller must have
    /// approved the vault for at least `amount` on the bond ledger. No
    /// shortfall minting exists for the base asset — the vault is
    /// expected to hold sufficient reserves.
    ///
    /// # Errors
    ///
    /// [`VaultError::OutOfPhase`], [`VaultError::ZeroAmount`],
    /// [`VaultError::InsufficientAllowance`], or
    /// [`VaultError::TokenTransferFailed`].
    pub fn withdraw(&self, caller: &Address, amount: u64) -> Result<ExchangeReceipt, VaultError> {
        let mut state = self.state.lock();

        if state.phase != Phase::Withdraw {
            return Err(VaultError::OutOfPhase {
                current: state.phase,
                required: Phase::Withdraw,
            });
        }
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }

        let base_out = state.current_rate.bond_to_base(amount)?;

        if let Err(e) = self.withdraw_transfers(caller, amount, base_out) {
            warn!(vault = %self.address, caller = %caller, amount, error = %e, "withdraw failed");
            return Err(e);
        }

        state.record(VaultEvent::Withdraw {
            caller: caller.clone(),
            recipient: caller.clone(),
            amount_in: amount,
            amount_out: base_out,
        });
        info!(vault = %self.address, caller = %caller, amount_in = amount, amount_out = base_out, "withdraw settled");

        Ok(ExchangeReceipt {
            caller: caller.clone(),
            recipient: caller.clone(),
            amount_in: amount,
            amount_out: base_out,
            timestamp: Utc::now(),
        })
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// The ledger legs of a deposit. A leg that fails reverses every leg
    /// already settled before returning the error.
    fn deposit_transfers(
        &self,
        caller: &Address,
        amount: u64,
        bond_out: u64,
    ) -> Result<(), VaultError> {
        // Pull the base asset from the depositor. Nothing has moved yet,
        // so a failure here needs no unwinding.
        let prior_allowance = self.base_ledger.allowance(caller, &self.address);
        Self::settle(
            self.base_ledger
                .transfer_from(&self.address, caller, &self.address, amount),
        )?;

        // Cover any bond shortfall by minting to the vault.
        let reserve = self.bond_ledger.balance_of(&self.address);
        let shortfall = bond_out.saturating_sub(reserve);
        if shortfall > 0 {
            if let Err(e) = self.bond_ledger.mint(&self.address, shortfall) {
                self.refund(self.base_ledger.as_ref(), caller, amount, prior_allowance);
                return Err(e.into());
            }
        }

        // Pay out the bond asset.
        if let Err(e) = Self::settle(self.bond_ledger.transfer(&self.address, caller, bond_out)) {
            // Nothing else spends the vault's balance under this lock, so
            // the shortfall mint is still in place to burn back.
            if shortfall > 0 {
                if let Err(burn_err) = self.bond_ledger.burn(&self.address, shortfall) {
                    error!(
                        vault = %self.address,
                        amount = shortfall,
                        error = %burn_err,
                        "unwind could not burn the shortfall mint"
                    );
                }
            }
            self.refund(self.base_ledger.as_ref(), caller, amount, prior_allowance);
            return Err(e);
        }
        Ok(())
    }

    /// The ledger legs of a withdrawal, with the same unwinding contract
    /// as [`deposit_transfers`](Self::deposit_transfers).
    fn withdraw_transfers(
        &self,
        caller: &Address,
        amount: u64,
        base_out: u64,
    ) -> Result<(), VaultError> {
        // Pull the bond asset from the redeemer.
        let prior_allowance = self.bond_ledger.allowance(caller, &self.address);
        Self::settle(
            self.bond_ledger
                .transfer_from(&self.address, caller, &self.address, amount),
        )?;

        // Pay out the base asset from reserves.
        if let Err(e) = Self::settle(self.base_ledger.transfer(&self.address, caller, base_out)) {
            self.refund(self.bond_ledger.as_ref(), caller, amount, prior_allowance);
            return Err(e);
        }
        Ok(())
    }

    /// Maps a ledger transfer outcome onto the vault's error taxonomy.
    /// A refusal (`Ok(false)`) and any revert other than an allowance
    /// shortfall are both `TokenTransferFailed`.
    fn settle(outcome: Result<bool, LedgerError>) -> Result<(), VaultError> {
        match outcome {
            Ok(true) => Ok(()),
            Ok(false) => Err(VaultError::TokenTransferFailed),
            Err(LedgerError::InsufficientAllowance { allowance, amount }) => {
                Err(VaultError::InsufficientAllowance {
                    needed: amount,
                    allowance,
                })
            }
            Err(_) => Err(VaultError::TokenTransferFailed),
        }
    }

    /// Reverses a settled inbound leg of a failed operation: returns the
    /// pulled funds to `caller` and re-instates the allowance the pull
    /// consumed. Only the vault's and the caller's entries are touched.
    /// A ledger refusing the compensating transfer leaves the books
    /// needing manual reconciliation; that is logged, not retried.
    fn refund(
        &self,
        ledger: &dyn AssetLedger,
        caller: &Address,
        amount: u64,
        prior_allowance: u64,
    ) {
        match ledger.transfer(&self.address, caller, amount) {
            Ok(true) => ledger.approve(caller, &self.address, prior_allowance),
            Ok(false) => {
                error!(
                    vault = %self.address,
                    caller = %caller,
                    amount,
                    "compensating refund refused"
                );
            }
            Err(e) => {
                error!(
                    vault = %self.address,
                    caller = %caller,
                    amount,
                    error = %e,
                    "compensating refund failed"
                );
            }
        }
    }

    fn require_role(&self, caller: &Address, role: Role) -> Result<(), VaultError> {
        if self.access_control.has_role(caller, role) {
            Ok(())
        } else {
            Err(VaultError::Unauthorized {
                caller: caller.clone(),
                role,
            })
        }
    }
}
