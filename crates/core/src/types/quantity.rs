//! Cart line quantities.
//!
//! A cart item always holds at least one unit. Front ends still produce
//! zero or negative values (a "-" click on a single unit, an explicit
//! remove), and those are deletion requests rather than quantities.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// A positive number of units of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity from a positive count. Returns `None` for zero.
    #[must_use]
    pub const fn new(count: u32) -> Option<Self> {
        match NonZeroU32::new(count) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// Classify a requested quantity.
    ///
    /// Returns `None` when the request is a deletion (`requested <= 0`).
    /// Requests above `u32::MAX` saturate.
    #[must_use]
    pub fn from_requested(requested: i64) -> Option<Self> {
        if requested <= 0 {
            return None;
        }
        let count = u32::try_from(requested).unwrap_or(u32::MAX);
        Self::new(count)
    }

    /// The unit count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_requests_are_deletions() {
        for requested in [0, -1, -42, i64::MIN] {
            assert_eq!(Quantity::from_requested(requested), None);
        }
    }

    #[test]
    fn test_positive_requests() {
        assert_eq!(Quantity::from_requested(3).unwrap().get(), 3);
        assert_eq!(Quantity::from_requested(i64::MAX).unwrap().get(), u32::MAX);
    }

    #[test]
    fn test_zero_is_rejected_on_deserialize() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("2").unwrap().get(), 2);
    }
}
