use std::fmt;

use serde::{Deserialize, Serialize};

/// A calendar month, stored as `year * 100 + month`.
///
/// Zero means "never", which is what fresh accounts carry as their last burn
/// period.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct YearMonth(u32);

impl YearMonth {
    pub const NEVER: Self = Self(0);

    /// Constructs a period, returning `None` if the month isn't `1..=12`.
    pub fn new(year: u32, month: u32) -> Option<Self> {
        if !(1..=12).contains(&month) {
            return None;
        }

        year.checked_mul(100)
            .and_then(|y| y.checked_add(month))
            .map(Self)
    }

    /// Wraps a raw value as read from a leaf.  No validation is done, leaves
    /// are compared by value only.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u32 {
        self.0
    }

    pub fn year(&self) -> u32 {
        self.0 / 100
    }

    pub fn month(&self) -> u32 {
        self.0 % 100
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_month() {
        let ym = YearMonth::new(2024, 3).unwrap();
        assert_eq!(ym.raw(), 202403);
        assert_eq!(ym.year(), 2024);
        assert_eq!(ym.month(), 3);
        assert_eq!(ym.to_string(), "2024-03");
        assert!(YearMonth::new(2024, 13).is_none());
        assert!(YearMonth::new(2024, 0).is_none());
        assert!(YearMonth::new(2024, 12).unwrap() < YearMonth::new(2025, 1).unwrap());
    }
}
