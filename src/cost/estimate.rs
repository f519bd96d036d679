use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

/// A count that is either a concrete number or could not be determined,
/// e.g. because a region extent stayed symbolic.
///
/// Arithmetic saturates, and `Unknown` absorbs everything except an exact
/// zero factor. Unknown values compare as neither less nor greater than
/// anything, including each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Estimate {
    Known(i64),
    Unknown
}

impl Estimate {
    pub fn is_known(&self) -> bool {
        matches!(self, Estimate::Known(_))
    }

    pub fn known(&self) -> Option<i64> {
        match self {
            Estimate::Known(v) => Some(*v),
            Estimate::Unknown => None
        }
    }
}

impl Default for Estimate {
    fn default() -> Self {
        Estimate::Known(0)
    }
}

impl From<i64> for Estimate {
    fn from(v: i64) -> Self {
        Estimate::Known(v)
    }
}

impl Add for Estimate {
    type Output = Estimate;

    fn add(self, rhs: Estimate) -> Estimate {
        match (self, rhs) {
            (Estimate::Known(a), Estimate::Known(b)) => Estimate::Known(a.saturating_add(b)),
            _ => Estimate::Unknown
        }
    }
}

impl AddAssign for Estimate {
    fn add_assign(&mut self, rhs: Estimate) {
        *self = *self + rhs;
    }
}

impl Mul for Estimate {
    type Output = Estimate;

    fn mul(self, rhs: Estimate) -> Estimate {
        match (self, rhs) {
            (Estimate::Known(0), _) | (_, Estimate::Known(0)) => Estimate::Known(0),
            (Estimate::Known(a), Estimate::Known(b)) => Estimate::Known(a.saturating_mul(b)),
            _ => Estimate::Unknown
        }
    }
}

impl Sum for Estimate {
    fn sum<I: Iterator<Item = Estimate>>(iter: I) -> Estimate {
        iter.fold(Estimate::Known(0), Add::add)
    }
}

impl PartialOrd for Estimate {
    fn partial_cmp(&self, other: &Estimate) -> Option<Ordering> {
        match (self, other) {
            (Estimate::Known(a), Estimate::Known(b)) => a.partial_cmp(b),
            _ => None
        }
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Estimate::Known(v) => write!(f, "{}", v),
            Estimate::Unknown => write!(f, "unknown")
        }
    }
}

/// Arithmetic and memory cost of evaluating something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cost {
    pub arith: Estimate,
    pub memory: Estimate
}

impl Cost {
    pub fn new<A: Into<Estimate>, M: Into<Estimate>>(arith: A, memory: M) -> Cost {
        Cost { arith: arith.into(), memory: memory.into() }
    }

    pub fn zero() -> Cost {
        Cost::new(0, 0)
    }

    pub fn unknown() -> Cost {
        Cost { arith: Estimate::Unknown, memory: Estimate::Unknown }
    }

    pub fn is_known(&self) -> bool {
        self.arith.is_known() && self.memory.is_known()
    }

    /// The cost of doing this `factor` times.
    pub fn scale(&self, factor: Estimate) -> Cost {
        Cost { arith: self.arith * factor, memory: self.memory * factor }
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost { arith: self.arith + rhs.arith, memory: self.memory + rhs.memory }
    }
}

impl AddAssign for Cost {
    fn add_assign(&mut self, rhs: Cost) {
        *self = *self + rhs;
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::zero(), Add::add)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(arith: {}, memory: {})", self.arith, self.memory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    use Estimate::{Known, Unknown};

    #[test_case(Known(2), Known(3), Known(5); "known")]
    #[test_case(Known(2), Unknown, Unknown; "unknown rhs")]
    #[test_case(Unknown, Known(0), Unknown; "unknown plus zero")]
    #[test_case(Known(i64::MAX), Known(1), Known(i64::MAX); "saturates")]
    fn test_add(a: Estimate, b: Estimate, expected: Estimate) {
        assert_eq!(a + b, expected);
    }

    #[test_case(Known(4), Known(3), Known(12); "known")]
    #[test_case(Known(4), Unknown, Unknown; "unknown")]
    #[test_case(Unknown, Known(0), Known(0); "zero absorbs unknown")]
    #[test_case(Known(i64::MAX), Known(2), Known(i64::MAX); "saturates")]
    fn test_mul(a: Estimate, b: Estimate, expected: Estimate) {
        assert_eq!(a * b, expected);
    }

    #[test]
    fn test_unknown_is_incomparable() {
        assert!(Known(1) < Known(2));
        assert_eq!(Unknown.partial_cmp(&Unknown), None);
        assert!(!(Unknown <= Known(5)));
        assert!(!(Known(5) <= Unknown));
    }

    #[test]
    fn test_sum() {
        let total: Estimate = vec![Known(1), Known(2), Known(3)].into_iter().sum();
        assert_eq!(total, Known(6));
        let total: Cost = vec![Cost::new(1, 2), Cost::new(3, 4)].into_iter().sum();
        assert_eq!(total, Cost::new(4, 6));
    }

    #[test]
    fn test_cost_scale() {
        assert_eq!(Cost::new(2, 1).scale(Known(100)), Cost::new(200, 100));
        assert_eq!(Cost::new(2, 1).scale(Unknown), Cost::unknown());
        assert_eq!(Cost::new(2, 1).scale(Known(0)), Cost::zero());
        assert_eq!(Cost::new(1, 1).to_string(), "(arith: 1, memory: 1)");
    }

    proptest! {
        #[test]
        fn prop_known_arithmetic_matches_i64(a in 0i64..1 << 20, b in 0i64..1 << 20) {
            prop_assert_eq!(Known(a) + Known(b), Known(a + b));
            prop_assert_eq!(Known(a) * Known(b), Known(a * b));
        }
    }
}
