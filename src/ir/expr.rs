//! Expression nodes and the `Expr` handle.
//!
//! Nodes are immutable once built and are shared between parents, so an
//! expression is a DAG. Every node variant is a plain struct wrapped by one
//! arm of `ExprNode`; the arm is the node's type identity and is what
//! `Expr::as_` checks before handing out a typed view.

use std::fmt;

use crate::func::ReductionDomain;
use crate::ir::types::*;
use crate::ptr::{IntrusivePtr, RefCounted};

/// One marker per concrete node variant, covering both expressions and statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    IntImm, FloatImm, StringImm, Cast, Variable,
    Add, Sub, Mul, Div, Mod, Min, Max,
    EQ, NE, LT, LE, GT, GE, And, Or, Not,
    Select, Let, Call,
    LetStmt, AssertStmt, For, Provide, Block, Evaluate
}

/// Implemented by every expression node struct.
pub trait ExprVariant: Sized {
    const NODE_TYPE: NodeType;
    fn from_node(node: &ExprNode) -> Option<&Self>;
    fn into_node(self) -> ExprNode;
}

macro_rules! expr_nodes {
    ($($name:ident),*) => {
        /// An expression node. Each arm holds the struct of the same name.
        #[derive(Debug, Clone, PartialEq)]
        pub enum ExprNode {
            $($name($name)),*
        }

        impl ExprNode {
            pub fn node_type(&self) -> NodeType {
                match self {
                    $(ExprNode::$name(_) => NodeType::$name),*
                }
            }
        }

        $(
            impl ExprVariant for $name {
                const NODE_TYPE: NodeType = NodeType::$name;

                fn from_node(node: &ExprNode) -> Option<&$name> {
                    match node {
                        ExprNode::$name(n) => Some(n),
                        _ => None
                    }
                }

                fn into_node(self) -> ExprNode {
                    ExprNode::$name(self)
                }
            }

            impl From<$name> for Expr {
                fn from(node: $name) -> Expr {
                    Expr::from_node(node.into_node())
                }
            }
        )*
    };
}

expr_nodes!(
    IntImm, FloatImm, StringImm, Cast, Variable,
    Add, Sub, Mul, Div, Mod, Min, Max,
    EQ, NE, LT, LE, GT, GE, And, Or, Not,
    Select, Let, Call
);

macro_rules! binary_nodes {
    ($($name:ident),*) => {
        $(
            #[derive(Debug, Clone, PartialEq)]
            pub struct $name {
                pub a: Expr,
                pub b: Expr
            }

            impl $name {
                pub fn make(a: Expr, b: Expr) -> Expr {
                    Expr::from($name { a, b })
                }
            }
        )*
    };
}

binary_nodes!(Add, Sub, Mul, Div, Mod, Min, Max, EQ, NE, LT, LE, GT, GE, And, Or);

/// Integer constant of any integer type. 32-bit values in
/// `SMALL_INT_RANGE` are served from a per-thread cache.
#[derive(Debug, Clone, PartialEq)]
pub struct IntImm {
    pub value: i64,
    pub type_: Type
}

const SMALL_INT_RANGE: std::ops::RangeInclusive<i64> = -8..=8;

thread_local! {
    static SMALL_INTS: Vec<Expr> = SMALL_INT_RANGE
        .map(|value| Expr::from_node(ExprNode::IntImm(IntImm { value, type_: Type::int(32) })))
        .collect();
}

impl IntImm {
    pub fn make(type_: Type, value: i64) -> Expr {
        if type_ == Type::int(32) && SMALL_INT_RANGE.contains(&value) {
            return SMALL_INTS.with(|cache| cache[(value - SMALL_INT_RANGE.start()) as usize].clone());
        }
        Expr::from(IntImm { value, type_ })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatImm {
    pub value: f64,
    pub type_: Type
}

impl FloatImm {
    pub fn make(type_: Type, value: f64) -> Expr {
        Expr::from(FloatImm { value, type_ })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringImm {
    pub value: String
}

impl StringImm {
    pub fn make(value: &str) -> Expr {
        Expr::from(StringImm { value: value.to_string() })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cast {
    pub type_: Type,
    pub value: Expr
}

impl Cast {
    pub fn make(type_: Type, value: Expr) -> Expr {
        Expr::from(Cast { type_, value })
    }
}

/// A named variable. Reduction variables also carry their domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub type_: Type,
    pub reduction_domain: Option<ReductionDomain>
}

impl Variable {
    pub fn make(type_: Type, name: &str) -> Expr {
        Expr::from(Variable { name: name.to_string(), type_, reduction_domain: None })
    }

    pub fn make_reduction(type_: Type, name: &str, domain: ReductionDomain) -> Expr {
        Expr::from(Variable { name: name.to_string(), type_, reduction_domain: Some(domain) })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Not {
    pub a: Expr
}

impl Not {
    pub fn make(a: Expr) -> Expr {
        Expr::from(Not { a })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub condition: Expr,
    pub true_value: Expr,
    pub false_value: Expr
}

impl Select {
    pub fn make(condition: Expr, true_value: Expr, false_value: Expr) -> Expr {
        Expr::from(Select { condition, true_value, false_value })
    }
}

/// `let name = value in body`
#[derive(Debug, Clone, PartialEq)]
pub struct Let {
    pub name: String,
    pub value: Expr,
    pub body: Expr
}

impl Let {
    pub fn make(name: &str, value: Expr, body: Expr) -> Expr {
        Expr::from(Let { name: name.to_string(), value, body })
    }
}

/// What a `Call` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallType {
    /// A read from another function in the pipeline.
    Halide,
    /// A read from a buffer supplied from outside the pipeline.
    Image,
    Extern,
    Intrinsic
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Expr>,
    pub call_type: CallType,
    pub type_: Type,
    /// Which element of a tuple-valued function is read.
    pub value_index: usize
}

impl Call {
    pub fn make(type_: Type, name: &str, args: Vec<Expr>, call_type: CallType) -> Expr {
        Call::make_indexed(type_, name, args, call_type, 0)
    }

    pub fn make_indexed(type_: Type, name: &str, args: Vec<Expr>, call_type: CallType, value_index: usize) -> Expr {
        Expr::from(Call { name: name.to_string(), args, call_type, type_, value_index })
    }

    /// Reads of pipeline functions and input images.
    pub fn is_load(&self) -> bool {
        self.call_type == CallType::Halide || self.call_type == CallType::Image
    }
}

/// An immutable, cheaply cloned handle to an expression node. May be undefined.
///
/// Equality is structural. Use `same_as` for identity.
#[derive(Clone, Default)]
pub struct Expr(IntrusivePtr<ExprNode>);

impl Expr {
    pub fn from_node(node: ExprNode) -> Expr {
        Expr(IntrusivePtr::new(node))
    }

    pub fn undefined() -> Expr {
        Expr(IntrusivePtr::null())
    }

    pub fn defined(&self) -> bool {
        self.0.defined()
    }

    pub fn same_as(&self, other: &Expr) -> bool {
        self.0.same_as(&other.0)
    }

    pub fn ptr(&self) -> &IntrusivePtr<ExprNode> {
        &self.0
    }

    /// Panics if the handle is undefined.
    pub fn node(&self) -> &ExprNode {
        match self.0.get() {
            Some(node) => node,
            None => panic!("Dereferenced an undefined Expr")
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.node().node_type()
    }

    /// A typed view of the node, or `None` if it is some other variant.
    pub fn as_<T: ExprVariant>(&self) -> Option<&T> {
        self.0.get().and_then(T::from_node)
    }

    pub fn is<T: ExprVariant>(&self) -> bool {
        self.as_::<T>().is_some()
    }

    pub fn type_(&self) -> Type {
        match self.node() {
            ExprNode::IntImm(n) => n.type_,
            ExprNode::FloatImm(n) => n.type_,
            ExprNode::StringImm(_) => Type::handle(),
            ExprNode::Cast(n) => n.type_,
            ExprNode::Variable(n) => n.type_,
            ExprNode::Add(n) => n.a.type_(),
            ExprNode::Sub(n) => n.a.type_(),
            ExprNode::Mul(n) => n.a.type_(),
            ExprNode::Div(n) => n.a.type_(),
            ExprNode::Mod(n) => n.a.type_(),
            ExprNode::Min(n) => n.a.type_(),
            ExprNode::Max(n) => n.a.type_(),
            ExprNode::EQ(_) | ExprNode::NE(_) | ExprNode::LT(_) | ExprNode::LE(_)
            | ExprNode::GT(_) | ExprNode::GE(_) | ExprNode::And(_) | ExprNode::Or(_)
            | ExprNode::Not(_) => Type::bool_(),
            ExprNode::Select(n) => n.true_value.type_(),
            ExprNode::Let(n) => n.body.type_(),
            ExprNode::Call(n) => n.type_
        }
    }

    /// The value of an integer constant.
    pub fn as_const_int(&self) -> Option<i64> {
        self.as_::<IntImm>().map(|i| i.value)
    }
}

impl RefCounted for Expr {
    fn ref_count(&self) -> usize {
        self.0.ref_count()
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Expr) -> bool {
        if self.same_as(other) {
            return true;
        }
        match (self.0.get(), other.0.get()) {
            (Some(a), Some(b)) => a == b,
            _ => false
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.defined() {
            write!(f, "Expr({})", self)
        } else {
            write!(f, "Expr(undefined)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::*;
    use proptest::prelude::*;

    #[test]
    fn test_same_construction_is_same_as() {
        let x = Expr::var("x");
        let e = x.clone() + 1;
        let copy = e.clone();
        assert!(e.same_as(&copy));
        assert_eq!(e.ref_count(), 2);
    }

    #[test]
    fn test_structural_equality() {
        let a = Expr::var("x") + Expr::var("y") * 20;
        let b = Expr::var("x") + Expr::var("y") * 20;
        assert!(!a.same_as(&b));
        assert_eq!(a, b);
        assert_ne!(a, Expr::var("x") + Expr::var("y") * 21);
    }

    #[test]
    fn test_small_ints_are_cached() {
        assert!(Expr::int(3).same_as(&Expr::int(3)));
        assert!(Expr::int(-8).same_as(&Expr::int(-8)));
        assert!(!Expr::int(100).same_as(&Expr::int(100)));
        assert_eq!(Expr::int(100), Expr::int(100));
        // Only 32-bit ints are cached
        assert!(!IntImm::make(Type::int(64), 3).same_as(&Expr::int(3)));
        assert_ne!(IntImm::make(Type::int(64), 3), Expr::int(3));
    }

    #[test]
    fn test_undefined() {
        let e = Expr::undefined();
        assert!(!e.defined());
        assert!(e.as_::<IntImm>().is_none());
        assert_eq!(e, Expr::default());
        assert_ne!(e, Expr::int(0));
    }

    #[test]
    #[should_panic]
    fn test_undefined_node_panics() {
        Expr::undefined().node_type();
    }

    #[test]
    fn test_types() {
        let x = Expr::var("x");
        assert_eq!((x.clone() + 1).type_(), Type::int(32));
        assert_eq!(x.clone().lt(3).type_(), Type::bool_());
        assert_eq!(cast(Type::float(32), x).type_(), Type::float(32));
        assert_eq!(Expr::float(1.5).type_(), Type::float(32));
        assert_eq!(Expr::string("s").type_(), Type::handle());
    }

    /// One expression of every variant, paired with its node type.
    fn all_variants() -> Vec<(NodeType, Expr)> {
        let (x, y) = (Expr::var("x"), Expr::var("y"));
        vec![
            (NodeType::IntImm, Expr::int(1)),
            (NodeType::FloatImm, Expr::float(1.0)),
            (NodeType::StringImm, Expr::string("s")),
            (NodeType::Cast, cast(Type::float(32), x.clone())),
            (NodeType::Variable, x.clone()),
            (NodeType::Add, x.clone() + y.clone()),
            (NodeType::Sub, x.clone() - y.clone()),
            (NodeType::Mul, x.clone() * y.clone()),
            (NodeType::Div, x.clone() / y.clone()),
            (NodeType::Mod, x.clone() % y.clone()),
            (NodeType::Min, min(x.clone(), y.clone())),
            (NodeType::Max, max(x.clone(), y.clone())),
            (NodeType::EQ, x.clone().eq_(y.clone())),
            (NodeType::NE, x.clone().ne_(y.clone())),
            (NodeType::LT, x.clone().lt(y.clone())),
            (NodeType::LE, x.clone().le(y.clone())),
            (NodeType::GT, x.clone().gt(y.clone())),
            (NodeType::GE, x.clone().ge(y.clone())),
            (NodeType::And, x.clone().lt(1).and(y.clone().lt(1))),
            (NodeType::Or, x.clone().lt(1).or(y.clone().lt(1))),
            (NodeType::Not, !x.clone().lt(1)),
            (NodeType::Select, select(x.clone().lt(1), x.clone(), y.clone())),
            (NodeType::Let, Let::make("z", x.clone(), Expr::var("z"))),
            (NodeType::Call, Call::make(Type::int(32), "f", vec![x, y], CallType::Halide)),
        ]
    }

    fn downcast_matches(e: &Expr, t: NodeType) -> bool {
        macro_rules! check {
            ($($name:ident),*) => {
                match t {
                    $(NodeType::$name => e.as_::<$name>().is_some(),)*
                    _ => false
                }
            };
        }
        check!(
            IntImm, FloatImm, StringImm, Cast, Variable,
            Add, Sub, Mul, Div, Mod, Min, Max,
            EQ, NE, LT, LE, GT, GE, And, Or, Not,
            Select, Let, Call
        )
    }

    #[test]
    fn test_downcast_all_pairs() {
        let variants = all_variants();
        for (t, e) in &variants {
            assert_eq!(e.node_type(), *t);
            for (other, _) in &variants {
                assert_eq!(downcast_matches(e, *other), t == other, "{:?} as {:?}", t, other);
            }
        }
    }

    #[test]
    fn test_downcast_view() {
        let e = Expr::var("x") + 7;
        let add = match e.as_::<Add>() {
            Some(add) => add,
            None => panic!("expected an Add")
        };
        assert_eq!(add.b.as_const_int(), Some(7));
        assert!(e.as_::<Mul>().is_none());
    }

    proptest! {
        #[test]
        fn equal_ints_compare_equal(v in any::<i32>()) {
            let a = Expr::int(v);
            let b = Expr::int(v);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a.same_as(&b), (-8..=8).contains(&v));
        }

        #[test]
        fn distinct_ints_compare_unequal(a in any::<i32>(), b in any::<i32>()) {
            prop_assume!(a != b);
            prop_assert_ne!(Expr::int(a), Expr::int(b));
        }
    }
}
