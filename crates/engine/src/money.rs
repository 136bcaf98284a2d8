use std::fmt;

use crate::{EngineError, ResultEngine};

/// Signed money amount represented as an integer number of **minor units**.
///
/// Every currency in the registry uses two fraction digits, so `1050` is
/// `10.50` whatever the code. Ledger replays and report totals accumulate
/// through this type so an overflow surfaces as an error instead of wrapping.
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// assert_eq!(amount.try_sub(Money::new(34)).unwrap().minor(), 1200);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Addition that reports overflow as [`EngineError::InvalidAmount`].
    pub fn try_add(self, rhs: Money) -> ResultEngine<Money> {
        self.checked_add(rhs).ok_or_else(|| overflow(self, rhs))
    }

    /// Subtraction that reports overflow as [`EngineError::InvalidAmount`].
    pub fn try_sub(self, rhs: Money) -> ResultEngine<Money> {
        self.checked_sub(rhs).ok_or_else(|| overflow(self, rhs))
    }
}

fn overflow(lhs: Money, rhs: Money) -> EngineError {
    EngineError::InvalidAmount(format!("amount overflow combining {lhs} and {rhs}"))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}
