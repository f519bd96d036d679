//! Read-only traversal of the IR.
//!
//! Implementors override `visit_expr` / `visit_stmt`, handle the variants
//! they care about, and call `walk_expr` / `walk_stmt` to recurse into the
//! rest. Shared subexpressions are visited once per reference.

use crate::ir::expr::*;
use crate::ir::stmt::*;

pub trait IRVisitor {
    fn visit_expr(&mut self, e: &Expr) {
        walk_expr(self, e);
    }

    fn visit_stmt(&mut self, s: &Stmt) {
        walk_stmt(self, s);
    }
}

/// Visits the children of `e`.
pub fn walk_expr<V: IRVisitor + ?Sized>(v: &mut V, e: &Expr) {
    if !e.defined() {
        return;
    }
    match e.node() {
        ExprNode::IntImm(_) | ExprNode::FloatImm(_) | ExprNode::StringImm(_) | ExprNode::Variable(_) => {},
        ExprNode::Cast(n) => v.visit_expr(&n.value),
        ExprNode::Add(n) => { v.visit_expr(&n.a); v.visit_expr(&n.b); },
        ExprNode::Sub(n) => { v.visit_expr(&n.a); v.visit_expr(&n.b); },
        ExprNode::Mul(n) => { v.visit_expr(&n.a); v.visit_expr(&n.b); },
        ExprNode::Div(n) => { v.visit_expr(&n.a); v.visit_expr(&n.b); },
        ExprNode::Mod(n) => { v.visit_expr(&n.a); v.visit_expr(&n.b); },
        ExprNode::Min(n) => { v.visit_expr(&n.a); v.visit_expr(&n.b); },
        ExprNode::Max(n) => { v.visit_expr(&n.a); v.visit_expr(&n.b); },
        ExprNode::EQ(n) => { v.visit_expr(&n.a); v.visit_expr(&n.b); },
        ExprNode::NE(n) => { v.visit_expr(&n.a); v.visit_expr(&n.b); },
        ExprNode::LT(n) => { v.visit_expr(&n.a); v.visit_expr(&n.b); },
        ExprNode::LE(n) => { v.visit_expr(&n.a); v.visit_expr(&n.b); },
        ExprNode::GT(n) => { v.visit_expr(&n.a); v.visit_expr(&n.b); },
        ExprNode::GE(n) => { v.visit_expr(&n.a); v.visit_expr(&n.b); },
        ExprNode::And(n) => { v.visit_expr(&n.a); v.visit_expr(&n.b); },
        ExprNode::Or(n) => { v.visit_expr(&n.a); v.visit_expr(&n.b); },
        ExprNode::Not(n) => v.visit_expr(&n.a),
        ExprNode::Select(n) => {
            v.visit_expr(&n.condition);
            v.visit_expr(&n.true_value);
            v.visit_expr(&n.false_value);
        },
        ExprNode::Let(n) => { v.visit_expr(&n.value); v.visit_expr(&n.body); },
        ExprNode::Call(n) => {
            for arg in &n.args {
                v.visit_expr(arg);
            }
        }
    }
}

/// Visits the children of `s`.
pub fn walk_stmt<V: IRVisitor + ?Sized>(v: &mut V, s: &Stmt) {
    if !s.defined() {
        return;
    }
    match s.node() {
        StmtNode::LetStmt(n) => { v.visit_expr(&n.value); v.visit_stmt(&n.body); },
        StmtNode::AssertStmt(n) => { v.visit_expr(&n.condition); v.visit_expr(&n.message); },
        StmtNode::For(n) => {
            v.visit_expr(&n.min);
            v.visit_expr(&n.extent);
            v.visit_stmt(&n.body);
        },
        StmtNode::Provide(n) => {
            for value in &n.values {
                v.visit_expr(value);
            }
            for arg in &n.args {
                v.visit_expr(arg);
            }
        },
        StmtNode::Block(n) => { v.visit_stmt(&n.first); v.visit_stmt(&n.rest); },
        StmtNode::Evaluate(n) => v.visit_expr(&n.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::*;

    #[derive(Default)]
    struct CountVariables {
        names: Vec<String>,
        nodes: usize
    }

    impl IRVisitor for CountVariables {
        fn visit_expr(&mut self, e: &Expr) {
            self.nodes += 1;
            if let Some(v) = e.as_::<Variable>() {
                self.names.push(v.name.clone());
            }
            walk_expr(self, e);
        }
    }

    #[test]
    fn test_visits_every_reference() {
        let x = Expr::var("x");
        let shared = x.clone() + 1;
        let e = shared.clone() * shared;
        let mut v = CountVariables::default();
        v.visit_expr(&e);
        assert_eq!(v.names, vec!["x", "x"]);
        assert_eq!(v.nodes, 7);
    }

    #[test]
    fn test_walks_statements() {
        let x = Expr::var("x");
        let y = Expr::var("y");
        let s = For::make(
            "x", Expr::int(0), y.clone(), ForType::Serial, DeviceAPI::Parent,
            Block::make(Provide::make("f", vec![x.clone() + y], vec![x]), Stmt::undefined())
        );
        let mut v = CountVariables::default();
        v.visit_stmt(&s);
        assert_eq!(v.names, vec!["y", "x", "y", "x"]);
    }
}
