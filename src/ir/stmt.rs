//! Statement nodes and the `Stmt` handle. Statements have effects
//! but no value, e.g. a loop or a store into a function's realization.

use std::fmt;

use crate::ir::expr::{Expr, NodeType};
use crate::ir::types::{DeviceAPI, ForType};
use crate::ptr::{IntrusivePtr, RefCounted};

/// Implemented by every statement node struct.
pub trait StmtVariant: Sized {
    const NODE_TYPE: NodeType;
    fn from_node(node: &StmtNode) -> Option<&Self>;
    fn into_node(self) -> StmtNode;
}

macro_rules! stmt_nodes {
    ($($name:ident),*) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum StmtNode {
            $($name($name)),*
        }

        impl StmtNode {
            pub fn node_type(&self) -> NodeType {
                match self {
                    $(StmtNode::$name(_) => NodeType::$name),*
                }
            }
        }

        $(
            impl StmtVariant for $name {
                const NODE_TYPE: NodeType = NodeType::$name;

                fn from_node(node: &StmtNode) -> Option<&$name> {
                    match node {
                        StmtNode::$name(n) => Some(n),
                        _ => None
                    }
                }

                fn into_node(self) -> StmtNode {
                    StmtNode::$name(self)
                }
            }

            impl From<$name> for Stmt {
                fn from(node: $name) -> Stmt {
                    Stmt::from_node(node.into_node())
                }
            }
        )*
    };
}

stmt_nodes!(LetStmt, AssertStmt, For, Provide, Block, Evaluate);

#[derive(Debug, Clone, PartialEq)]
pub struct LetStmt {
    pub name: String,
    pub value: Expr,
    pub body: Stmt
}

impl LetStmt {
    pub fn make(name: &str, value: Expr, body: Stmt) -> Stmt {
        Stmt::from(LetStmt { name: name.to_string(), value, body })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssertStmt {
    pub condition: Expr,
    pub message: Expr
}

impl AssertStmt {
    pub fn make(condition: Expr, message: Expr) -> Stmt {
        Stmt::from(AssertStmt { condition, message })
    }
}

/// A loop over `name` from `min` for `extent` iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct For {
    pub name: String,
    pub min: Expr,
    pub extent: Expr,
    pub for_type: ForType,
    pub device_api: DeviceAPI,
    pub body: Stmt
}

impl For {
    pub fn make(name: &str, min: Expr, extent: Expr, for_type: ForType, device_api: DeviceAPI, body: Stmt) -> Stmt {
        Stmt::from(For { name: name.to_string(), min, extent, for_type, device_api, body })
    }
}

/// Store `values` into function `name` at `args`.
#[derive(Debug, Clone, PartialEq)]
pub struct Provide {
    pub name: String,
    pub values: Vec<Expr>,
    pub args: Vec<Expr>
}

impl Provide {
    pub fn make(name: &str, values: Vec<Expr>, args: Vec<Expr>) -> Stmt {
        Stmt::from(Provide { name: name.to_string(), values, args })
    }
}

/// `first` then `rest`. `rest` may be undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub first: Stmt,
    pub rest: Stmt
}

impl Block {
    pub fn make(first: Stmt, rest: Stmt) -> Stmt {
        Stmt::from(Block { first, rest })
    }
}

/// Evaluate an expression for its side effects.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluate {
    pub value: Expr
}

impl Evaluate {
    pub fn make(value: Expr) -> Stmt {
        Stmt::from(Evaluate { value })
    }
}

/// A cheaply cloned handle to a statement node. May be undefined.
#[derive(Clone, Default)]
pub struct Stmt(IntrusivePtr<StmtNode>);

impl Stmt {
    pub fn from_node(node: StmtNode) -> Stmt {
        Stmt(IntrusivePtr::new(node))
    }

    pub fn undefined() -> Stmt {
        Stmt(IntrusivePtr::null())
    }

    pub fn defined(&self) -> bool {
        self.0.defined()
    }

    pub fn same_as(&self, other: &Stmt) -> bool {
        self.0.same_as(&other.0)
    }

    pub fn ptr(&self) -> &IntrusivePtr<StmtNode> {
        &self.0
    }

    /// Panics if the handle is undefined.
    pub fn node(&self) -> &StmtNode {
        match self.0.get() {
            Some(node) => node,
            None => panic!("Dereferenced an undefined Stmt")
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.node().node_type()
    }

    pub fn as_<T: StmtVariant>(&self) -> Option<&T> {
        self.0.get().and_then(T::from_node)
    }
}

impl RefCounted for Stmt {
    fn ref_count(&self) -> usize {
        self.0.ref_count()
    }
}

impl PartialEq for Stmt {
    fn eq(&self, other: &Stmt) -> bool {
        if self.same_as(other) {
            return true;
        }
        match (self.0.get(), other.0.get()) {
            (Some(a), Some(b)) => a == b,
            _ => false
        }
    }
}

impl fmt::Debug for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Stmt({})", self.to_string().trim_end())
    }
}

#[cfg(test)]
mod tests {
    use crate::ir::*;
    use crate::ptr::RefCounted;
    use paste::paste;

    fn make(t: NodeType) -> Stmt {
        let x = Expr::var("x");
        let leaf = Evaluate::make(x.clone());
        match t {
            NodeType::LetStmt => LetStmt::make("y", x, leaf),
            NodeType::AssertStmt => AssertStmt::make(x.lt(3), Expr::string("x too big")),
            NodeType::For => For::make("x", Expr::int(0), Expr::int(4), ForType::Unrolled, DeviceAPI::Host, leaf),
            NodeType::Provide => Provide::make("f", vec![Expr::int(1)], vec![x]),
            NodeType::Block => Block::make(leaf.clone(), leaf),
            NodeType::Evaluate => leaf,
            _ => unreachable!()
        }
    }

    macro_rules! test_downcast {
        ($($name:ident),*) => {
            paste! {
                $(
                    #[test]
                    fn [<test_downcast_ $name:snake>]() {
                        let s = make(NodeType::$name);
                        assert_eq!(s.node_type(), NodeType::$name);
                        assert!(s.as_::<$name>().is_some());
                        let others = [
                            NodeType::LetStmt, NodeType::AssertStmt, NodeType::For,
                            NodeType::Provide, NodeType::Block, NodeType::Evaluate
                        ];
                        for other in others.iter().filter(|o| **o != NodeType::$name) {
                            assert_ne!(make(*other).node_type(), NodeType::$name);
                            assert!(make(*other).as_::<$name>().is_none());
                        }
                    }
                )*
            }
        };
    }

    test_downcast!(LetStmt, AssertStmt, For, Provide, Block, Evaluate);

    #[test]
    fn test_shared_substatements() {
        let leaf = Evaluate::make(Expr::var("x"));
        let block = Block::make(leaf.clone(), leaf.clone());
        let b = block.as_::<Block>().map(|b| b.first.same_as(&b.rest));
        assert_eq!(b, Some(true));
        assert_eq!(leaf.ref_count(), 3);
    }
}
