//! Value comparison engine for lodedb
//!
//! Decides equality and ordering between typed values drawn from filters
//! and stored documents, following MongoDB's cross-type rules:
//!
//! - Values only match within one type family
//! - Int32, Int64, Double and Decimal128 all belong to the numeric family
//! - Numeric ordering is total, even for NaN, infinities and values that
//!   do not survive conversion to f64
//!
//! Both entry points are pure functions over borrowed views and can be
//! called from any number of query threads at once.

mod matcher;
mod numeric;

pub use matcher::matches;
pub use numeric::{compare_numeric, is_safe_numeric, NumericRepr, SAFE_INTEGER_LIMIT};

use std::cmp::Ordering;
use std::fmt;

/// Result of comparing two values of the same family.
///
/// There is no "incomparable" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOutcome {
    LessThan,
    Equal,
    GreaterThan,
}

impl ComparisonOutcome {
    /// Returns the outcome with operands swapped
    pub fn reverse(self) -> Self {
        match self {
            ComparisonOutcome::LessThan => ComparisonOutcome::GreaterThan,
            ComparisonOutcome::Equal => ComparisonOutcome::Equal,
            ComparisonOutcome::GreaterThan => ComparisonOutcome::LessThan,
        }
    }

    /// Converts to a standard library ordering, e.g. for `sort_by`
    pub fn to_ordering(self) -> Ordering {
        match self {
            ComparisonOutcome::LessThan => Ordering::Less,
            ComparisonOutcome::Equal => Ordering::Equal,
            ComparisonOutcome::GreaterThan => Ordering::Greater,
        }
    }

    pub fn is_eq(self) -> bool {
        self == ComparisonOutcome::Equal
    }
}

impl From<Ordering> for ComparisonOutcome {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => ComparisonOutcome::LessThan,
            Ordering::Equal => ComparisonOutcome::Equal,
            Ordering::Greater => ComparisonOutcome::GreaterThan,
        }
    }
}

impl fmt::Display for ComparisonOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOutcome::LessThan => write!(f, "LT"),
            ComparisonOutcome::Equal => write!(f, "EQ"),
            ComparisonOutcome::GreaterThan => write!(f, "GT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_is_involution() {
        for outcome in [
            ComparisonOutcome::LessThan,
            ComparisonOutcome::Equal,
            ComparisonOutcome::GreaterThan,
        ] {
            assert_eq!(outcome.reverse().reverse(), outcome);
            assert_eq!(
                ComparisonOutcome::from(outcome.to_ordering()),
                outcome
            );
        }
    }
}
