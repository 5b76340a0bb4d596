//! # Bond Vault
//!
//! A phased custodial vault modeling a rolling short-term credit
//! facility: depositors exchange a stable-value **base asset** for a
//! **bond asset** at an operator-set exchange rate, and redeem it back a
//! phase later at the rolled rate. The implementation is split into the
//! concerns a facility like this actually has:
//!
//! - **Exchange rates** — integer-exact bidirectional conversion plus the
//!   whole-number percent-increase derivation operators use to roll the
//!   facility forward.
//! - **Asset ledgers** — the narrow ERC-20-shaped capability the vault
//!   consumes, with an in-memory implementation and allowance
//!   bookkeeping. Ledgers are shared; failed vault operations reverse
//!   only their own entries.
//! - **Access control** — role-gated privileged operations and an
//!   optional deposit allow-list, both injected as explicit collaborator
//!   references.
//! - **Bond binding** — the one-time association between a bond ledger
//!   and the single vault it serves, validated by a capability probe.
//! - **The vault itself** — a strict Deposit → Locked → Withdraw cycle
//!   with per-phase rates, minimum-deposit policy, shortfall minting,
//!   and all-or-nothing settlement.
//!
//! ## Design Principles
//!
//! 1. All amounts are `u64` in smallest-unit denomination; conversion
//!    intermediates widen to `u128` and narrow back with checked
//!    arithmetic. Wrapping arithmetic and money do not mix.
//! 2. Failures are typed, never swallowed: every operation either settles
//!    completely or leaves no observable state change.
//! 3. A transfer that *returns* failure is a failure — call completion
//!    alone never implies success.
//! 4. Collaborators are capability traits resolved through an explicit
//!    directory, not ambient global state.

pub mod access;
pub mod address;
pub mod binding;
pub mod directory;
pub mod ledger;
pub mod rate;
pub mod vault;

pub use access::{AccessControl, AccessError, AllowList, Role, RoleRegistry, Whitelist};
pub use address::{Address, ZERO_ADDRESS};
pub use binding::{BindingError, VaultBinding};
pub use directory::{ContractDirectory, ContractHandle};
pub use ledger::{AssetLedger, LedgerError, TokenLedger};
pub use rate::{ExchangeRate, RateError};
pub use vault::{
    EventRecord, ExchangeReceipt, Phase, Vault, VaultConfig, VaultError, VaultEvent,
    MAX_EVENT_RECORDS,
};
