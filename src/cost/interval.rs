use std::collections::BTreeMap;
use std::fmt;

use crate::cost::estimate::Estimate;
use crate::ir::*;

/// The closed range `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub min: Expr,
    pub max: Expr
}

impl Interval {
    pub fn new<M: Into<Expr>, N: Into<Expr>>(min: M, max: N) -> Interval {
        Interval { min: min.into(), max: max.into() }
    }

    /// The interval starting at `min` covering `extent` values.
    pub fn from_extent(min: &Expr, extent: &Expr) -> Interval {
        Interval { min: min.clone(), max: simplify(&(min.clone() + extent.clone() - 1)) }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// One interval per dimension.
pub type Region = Vec<Interval>;

/// Intervals keyed by loop variable name.
pub type DimBounds = BTreeMap<String, Interval>;

/// Number of points in the interval, if it simplifies to a constant.
pub fn get_extent(i: &Interval) -> Estimate {
    match simplify(&(i.max.clone() - i.min.clone() + 1)).as_const_int() {
        Some(extent) => Estimate::Known(extent),
        None => Estimate::Unknown
    }
}

/// Number of points in the box. Empty if any concrete extent is not
/// positive, even when other extents are symbolic.
pub fn box_area(b: &[Interval]) -> Estimate {
    let extents: Vec<Estimate> = b.iter().map(get_extent).collect();
    if extents.iter().any(|e| matches!(e, Estimate::Known(v) if *v <= 0)) {
        return Estimate::Known(0);
    }
    extents.into_iter().fold(Estimate::Known(1), |area, e| area * e)
}

pub fn display_region(b: &[Interval]) -> String {
    b.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(" x ")
}
