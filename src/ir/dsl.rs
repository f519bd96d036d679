//! Contains operator impls, constructors and macros to allow ergonomic construction of IR nodes.

use std::ops::{Add, Div, Mul, Not, Rem, Sub};
use crate::ir::expr::{self, *};
use crate::ir::types::Type;

/// Shorthand for creating new 32-bit integer variables.
///
/// The following code samples are equivalent.
///
/// ```var!(x, y);```
///
/// ```let x = Expr::var("x"); let y = Expr::var("y");```
#[macro_export]
macro_rules! var {
    ($($name:ident),+) => {
        $(let $name = $crate::ir::Expr::var(stringify!($name));)+
    }
}

impl Expr {
    /// A 32-bit integer constant.
    pub fn int(value: i32) -> Expr {
        IntImm::make(Type::int(32), value as i64)
    }

    /// A 32-bit float constant.
    pub fn float(value: f32) -> Expr {
        FloatImm::make(Type::float(32), value as f64)
    }

    pub fn string(value: &str) -> Expr {
        StringImm::make(value)
    }

    /// A 32-bit integer variable.
    pub fn var(name: &str) -> Expr {
        Variable::make(Type::int(32), name)
    }

    pub fn eq_<E: Into<Expr>>(self, rhs: E) -> Expr {
        EQ::make(self, rhs.into())
    }

    pub fn ne_<E: Into<Expr>>(self, rhs: E) -> Expr {
        NE::make(self, rhs.into())
    }

    pub fn lt<E: Into<Expr>>(self, rhs: E) -> Expr {
        LT::make(self, rhs.into())
    }

    pub fn le<E: Into<Expr>>(self, rhs: E) -> Expr {
        LE::make(self, rhs.into())
    }

    pub fn gt<E: Into<Expr>>(self, rhs: E) -> Expr {
        GT::make(self, rhs.into())
    }

    pub fn ge<E: Into<Expr>>(self, rhs: E) -> Expr {
        GE::make(self, rhs.into())
    }

    pub fn and<E: Into<Expr>>(self, rhs: E) -> Expr {
        And::make(self, rhs.into())
    }

    pub fn or<E: Into<Expr>>(self, rhs: E) -> Expr {
        Or::make(self, rhs.into())
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Expr {
        Expr::int(value)
    }
}

impl From<f32> for Expr {
    fn from(value: f32) -> Expr {
        Expr::float(value)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Expr {
        Expr::string(value)
    }
}

pub fn min<A: Into<Expr>, B: Into<Expr>>(a: A, b: B) -> Expr {
    Min::make(a.into(), b.into())
}

pub fn max<A: Into<Expr>, B: Into<Expr>>(a: A, b: B) -> Expr {
    Max::make(a.into(), b.into())
}

pub fn select<C, T, F>(condition: C, true_value: T, false_value: F) -> Expr
where
    C: Into<Expr>,
    T: Into<Expr>,
    F: Into<Expr>
{
    Select::make(condition.into(), true_value.into(), false_value.into())
}

pub fn cast<E: Into<Expr>>(type_: Type, value: E) -> Expr {
    Cast::make(type_, value.into())
}

macro_rules! impl_expr_bin_op {
    ($trait_name:ident, $trait_op:ident, $node:ident) => {
        impl $trait_name<Expr> for Expr {
            type Output = Expr;
            fn $trait_op(self, rhs: Expr) -> Expr {
                expr::$node::make(self, rhs)
            }
        }

        impl $trait_name<i32> for Expr {
            type Output = Expr;
            fn $trait_op(self, rhs: i32) -> Expr {
                expr::$node::make(self, Expr::int(rhs))
            }
        }

        impl $trait_name<Expr> for i32 {
            type Output = Expr;
            fn $trait_op(self, rhs: Expr) -> Expr {
                expr::$node::make(Expr::int(self), rhs)
            }
        }

        impl $trait_name<&Expr> for &Expr {
            type Output = Expr;
            fn $trait_op(self, rhs: &Expr) -> Expr {
                expr::$node::make(self.clone(), rhs.clone())
            }
        }
    };
}

impl_expr_bin_op!(Add, add, Add);
impl_expr_bin_op!(Sub, sub, Sub);
impl_expr_bin_op!(Mul, mul, Mul);
impl_expr_bin_op!(Div, div, Div);
impl_expr_bin_op!(Rem, rem, Mod);

impl Not for Expr {
    type Output = Expr;
    fn not(self) -> Expr {
        expr::Not::make(self)
    }
}
