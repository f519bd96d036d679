use std::fmt;

use crate::ir::{Expr, Type, Variable};
use crate::ptr::{IntrusivePtr, RefCounted};

/// One dimension of a reduction: `var` runs from `min` for `extent` values.
#[derive(Debug, Clone, PartialEq)]
pub struct ReductionVariable {
    pub var: String,
    pub min: Expr,
    pub extent: Expr
}

impl ReductionVariable {
    pub fn new<M: Into<Expr>, E: Into<Expr>>(var: &str, min: M, extent: E) -> ReductionVariable {
        ReductionVariable { var: var.to_string(), min: min.into(), extent: extent.into() }
    }
}

/// The iteration space of a reduction. Immutable and shared; to change a
/// stage's domain, build a new one.
///
/// Equality is identity: two domains built from the same variables are
/// still different domains.
#[derive(Clone, PartialEq, Default)]
pub struct ReductionDomain(IntrusivePtr<Vec<ReductionVariable>>);

impl ReductionDomain {
    pub fn new(domain: Vec<ReductionVariable>) -> ReductionDomain {
        ReductionDomain(IntrusivePtr::new(domain))
    }

    pub fn defined(&self) -> bool {
        self.0.defined()
    }

    pub fn same_as(&self, other: &ReductionDomain) -> bool {
        self.0.same_as(&other.0)
    }

    /// The variables, outermost last. Empty for an undefined domain.
    pub fn domain(&self) -> &[ReductionVariable] {
        match self.0.get() {
            Some(d) => d,
            None => &[]
        }
    }

    /// Expressions referring to each reduction variable, tagged with this domain.
    pub fn variables(&self) -> Vec<Expr> {
        self.domain()
            .iter()
            .map(|rv| Variable::make_reduction(Type::int(32), &rv.var, self.clone()))
            .collect()
    }

    /// The variable expression for dimension `i`.
    pub fn var(&self, i: usize) -> Expr {
        Variable::make_reduction(Type::int(32), &self.domain()[i].var, self.clone())
    }
}

impl RefCounted for ReductionDomain {
    fn ref_count(&self) -> usize {
        self.0.ref_count()
    }
}

impl fmt::Debug for ReductionDomain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ReductionDomain(")?;
        for (i, rv) in self.domain().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} in [{}, {} + {})", rv.var, rv.min, rv.min, rv.extent)?;
        }
        write!(f, ")")
    }
}
