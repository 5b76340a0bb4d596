//! Account and contract addresses.
//!
//! An [`Address`] is an opaque hex-style identifier for an account or a
//! deployed contract. The protocol never interprets the bytes — it only
//! cares about equality and about the distinguished zero address, which is
//! rejected everywhere a real collaborator is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The canonical null address.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// An account or contract address.
///
/// Addresses are compared by exact string equality, with one exception:
/// any address whose digits are all zero (`0x0`, `0x0000…0`) counts as the
/// zero address.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Wraps a raw address string.
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// Returns the canonical zero address.
    pub fn zero() -> Self {
        Self(ZERO_ADDRESS.to_string())
    }

    /// Returns `true` if this is the null address.
    pub fn is_zero(&self) -> bool {
        let digits = self.0.strip_prefix("0x").unwrap_or(&self.0);
        !digits.is_empty() && digits.bytes().all(|b| b == b'0')
    }

    /// Returns the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_address_detected() {
        assert!(Address::zero().is_zero());
        assert!(Address::new("0x0").is_zero());
        assert!(Address::new("0x0000000000000000000000000000000000000000").is_zero());
    }

    #[test]
    fn nonzero_address_not_zero() {
        assert!(!Address::new("0xa1").is_zero());
        assert!(!Address::new("0x00a1").is_zero());
        assert!(!Address::new("").is_zero());
    }

    #[test]
    fn equality_is_exact() {
        assert_eq!(Address::new("0xabc"), Address::new("0xabc"));
        assert_ne!(Address::new("0xabc"), Address::new("0xABC"));
    }

    #[test]
    fn serde_round_trip() {
        let addr = Address::new("0xdeadbeef");
        let json = serde_json::to_string(&addr).unwrap();
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }
}
