//! Rebuilding expressions: replacing variables, and a generic child mapper
//! that other rewrites are built on.

use std::collections::BTreeMap;

use crate::ir::expr::*;

/// Rebuilds `e` with `f` applied to each direct child. Returns `e` itself
/// if every child comes back unchanged.
pub fn map_children<F: FnMut(&Expr) -> Expr>(e: &Expr, mut f: F) -> Expr {
    if !e.defined() {
        return e.clone();
    }

    macro_rules! binary {
        ($node:ident, $n:expr) => {{
            let (a, b) = (f(&$n.a), f(&$n.b));
            if a.same_as(&$n.a) && b.same_as(&$n.b) { e.clone() } else { $node::make(a, b) }
        }};
    }

    match e.node() {
        ExprNode::IntImm(_) | ExprNode::FloatImm(_) | ExprNode::StringImm(_) | ExprNode::Variable(_) => e.clone(),
        ExprNode::Cast(c) => {
            let value = f(&c.value);
            if value.same_as(&c.value) { e.clone() } else { Cast::make(c.type_, value) }
        },
        ExprNode::Add(n) => binary!(Add, n),
        ExprNode::Sub(n) => binary!(Sub, n),
        ExprNode::Mul(n) => binary!(Mul, n),
        ExprNode::Div(n) => binary!(Div, n),
        ExprNode::Mod(n) => binary!(Mod, n),
        ExprNode::Min(n) => binary!(Min, n),
        ExprNode::Max(n) => binary!(Max, n),
        ExprNode::EQ(n) => binary!(EQ, n),
        ExprNode::NE(n) => binary!(NE, n),
        ExprNode::LT(n) => binary!(LT, n),
        ExprNode::LE(n) => binary!(LE, n),
        ExprNode::GT(n) => binary!(GT, n),
        ExprNode::GE(n) => binary!(GE, n),
        ExprNode::And(n) => binary!(And, n),
        ExprNode::Or(n) => binary!(Or, n),
        ExprNode::Not(n) => {
            let a = f(&n.a);
            if a.same_as(&n.a) { e.clone() } else { Not::make(a) }
        },
        ExprNode::Select(s) => {
            let (c, t, fv) = (f(&s.condition), f(&s.true_value), f(&s.false_value));
            if c.same_as(&s.condition) && t.same_as(&s.true_value) && fv.same_as(&s.false_value) {
                e.clone()
            } else {
                Select::make(c, t, fv)
            }
        },
        ExprNode::Let(l) => {
            let (value, body) = (f(&l.value), f(&l.body));
            if value.same_as(&l.value) && body.same_as(&l.body) { e.clone() } else { Let::make(&l.name, value, body) }
        },
        ExprNode::Call(c) => {
            let args: Vec<Expr> = c.args.iter().map(|a| f(a)).collect();
            if args.iter().zip(&c.args).all(|(new, old)| new.same_as(old)) {
                e.clone()
            } else {
                Call::make_indexed(c.type_, &c.name, args, c.call_type, c.value_index)
            }
        }
    }
}

/// Replaces free occurrences of the named variables.
pub fn substitute_map(replacements: &BTreeMap<String, Expr>, e: &Expr) -> Expr {
    if replacements.is_empty() || !e.defined() {
        return e.clone();
    }
    match e.node() {
        ExprNode::Variable(v) => match replacements.get(&v.name) {
            Some(r) => r.clone(),
            None => e.clone()
        },
        ExprNode::Let(l) if replacements.contains_key(&l.name) => {
            // The let shadows one of the names inside its body
            let value = substitute_map(replacements, &l.value);
            let mut inner = replacements.clone();
            inner.remove(&l.name);
            let body = substitute_map(&inner, &l.body);
            if value.same_as(&l.value) && body.same_as(&l.body) { e.clone() } else { Let::make(&l.name, value, body) }
        },
        _ => map_children(e, |child| substitute_map(replacements, child))
    }
}

/// Replaces free occurrences of variable `name` with `replacement`.
pub fn substitute(name: &str, replacement: &Expr, e: &Expr) -> Expr {
    let mut replacements = BTreeMap::new();
    replacements.insert(name.to_string(), replacement.clone());
    substitute_map(&replacements, e)
}
