//! Numeric comparator
//!
//! Two paths:
//!
//! 1. Both operands convert to f64 exactly: compare as doubles.
//! 2. Otherwise: compare by representation rank when representations
//!    differ, and by raw value when they match.
//!
//! Path 2 trades value accuracy for a total, reproducible order. It does
//! not implement decimal128 arithmetic; two Decimal128 values are ordered
//! by their encoded bits.

use std::cmp::Ordering;

use bson::Decimal128;

use super::ComparisonOutcome;
use crate::value::ValueView;

/// Largest integer magnitude an f64 represents exactly (2^53).
pub const SAFE_INTEGER_LIMIT: u64 = 1 << 53;

const SAFE_DOUBLE_LIMIT: f64 = SAFE_INTEGER_LIMIT as f64;

/// Non-numeric operands rank after every numeric representation.
const NON_NUMERIC_RANK_BASE: u16 = 0x100;

/// Underlying numeric representation.
///
/// Variants are declared in rank order: the BSON element type code
/// (Double 0x01, Int32 0x10, Int64 0x12, Decimal128 0x13). This table is
/// part of the on-disk ordering contract and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumericRepr {
    Double,
    Int32,
    Int64,
    Decimal128,
}

impl NumericRepr {
    /// Returns the representation of a numeric view.
    pub fn of(view: &ValueView<'_>) -> Option<Self> {
        match view {
            ValueView::Double(_) => Some(NumericRepr::Double),
            ValueView::Int32(_) => Some(NumericRepr::Int32),
            ValueView::Int64(_) => Some(NumericRepr::Int64),
            ValueView::Decimal128(_) => Some(NumericRepr::Decimal128),
            _ => None,
        }
    }

    /// Fallback rank: the BSON element type code.
    pub fn rank(&self) -> u8 {
        match self {
            NumericRepr::Double => 0x01,
            NumericRepr::Int32 => 0x10,
            NumericRepr::Int64 => 0x12,
            NumericRepr::Decimal128 => 0x13,
        }
    }
}

/// Whether a value converts to f64 without losing precision.
pub fn is_safe_numeric(view: &ValueView<'_>) -> bool {
    safe_f64(view).is_some()
}

fn safe_f64(view: &ValueView<'_>) -> Option<f64> {
    match *view {
        ValueView::Int32(v) => Some(f64::from(v)),
        ValueView::Int64(v) if v.unsigned_abs() <= SAFE_INTEGER_LIMIT => Some(v as f64),
        ValueView::Double(v) if v.is_finite() && v.abs() <= SAFE_DOUBLE_LIMIT => Some(v),
        _ => None,
    }
}

/// Compares two numeric values.
///
/// Total over all inputs: never panics, never reports "incomparable", and
/// `compare_numeric(a, b) == compare_numeric(b, a).reverse()` holds for every
/// pair. Non-numeric operands are ordered after all numerics; passing
/// them is a caller mistake and the result carries no meaning beyond
/// being stable.
pub fn compare_numeric(a: ValueView<'_>, b: ValueView<'_>) -> ComparisonOutcome {
    if let (Some(x), Some(y)) = (safe_f64(&a), safe_f64(&b)) {
        // Safe values are finite, so partial_cmp always answers; -0.0 == 0.0.
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal).into();
    }
    compare_fallback(&a, &b).into()
}

fn fallback_rank(view: &ValueView<'_>) -> u16 {
    match NumericRepr::of(view) {
        Some(repr) => u16::from(repr.rank()),
        None => NON_NUMERIC_RANK_BASE + u16::from(view.element_type() as u8),
    }
}

fn compare_fallback(a: &ValueView<'_>, b: &ValueView<'_>) -> Ordering {
    let (rank_a, rank_b) = (fallback_rank(a), fallback_rank(b));
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    match (*a, *b) {
        (ValueView::Int32(x), ValueView::Int32(y)) => x.cmp(&y),
        (ValueView::Int64(x), ValueView::Int64(y)) => x.cmp(&y),
        (ValueView::Double(x), ValueView::Double(y)) => compare_doubles_nan_first(x, y),
        (ValueView::Decimal128(x), ValueView::Decimal128(y)) => {
            decimal_bits(&x).cmp(&decimal_bits(&y))
        }
        _ => Ordering::Equal,
    }
}

/// NaN sorts below every other double; two NaNs are equal.
fn compare_doubles_nan_first(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

fn decimal_bits(value: &Decimal128) -> u128 {
    u128::from_le_bytes(value.bytes())
}
