use std::fmt;

use crate::ir::expr::*;
use crate::ir::stmt::*;

pub trait PrettyPrint {
    fn pretty_print(&self) -> String;
    fn is_leaf(&self) -> bool;
}

pub fn combine_with_op<P: PrettyPrint>(op: &str, left: &P, right: &P) -> String {
    let left = pretty_print_with_parens(left);
    let right = pretty_print_with_parens(right);
    format!("{} {} {}", left, op, right)
}

pub fn pretty_print_with_parens<P: PrettyPrint>(p: &P) -> String {
    let pp = p.pretty_print();
    if p.is_leaf() { pp } else { format!("({})", pp) }
}

fn comma_separated(exprs: &[Expr]) -> String {
    exprs.iter().map(|e| e.pretty_print()).collect::<Vec<_>>().join(", ")
}

impl PrettyPrint for Expr {
    fn pretty_print(&self) -> String {
        if !self.defined() {
            return "<undefined>".to_string();
        }
        match self.node() {
            ExprNode::IntImm(i) => i.value.to_string(),
            ExprNode::FloatImm(f) => format!("{:?}f", f.value),
            ExprNode::StringImm(s) => format!("{:?}", s.value),
            ExprNode::Cast(c) => format!("{}({})", c.type_, c.value.pretty_print()),
            ExprNode::Variable(v) => v.name.clone(),
            ExprNode::Add(n) => combine_with_op("+", &n.a, &n.b),
            ExprNode::Sub(n) => combine_with_op("-", &n.a, &n.b),
            ExprNode::Mul(n) => combine_with_op("*", &n.a, &n.b),
            ExprNode::Div(n) => combine_with_op("/", &n.a, &n.b),
            ExprNode::Mod(n) => combine_with_op("%", &n.a, &n.b),
            ExprNode::Min(n) => format!("min({}, {})", n.a.pretty_print(), n.b.pretty_print()),
            ExprNode::Max(n) => format!("max({}, {})", n.a.pretty_print(), n.b.pretty_print()),
            ExprNode::EQ(n) => combine_with_op("==", &n.a, &n.b),
            ExprNode::NE(n) => combine_with_op("!=", &n.a, &n.b),
            ExprNode::LT(n) => combine_with_op("<", &n.a, &n.b),
            ExprNode::LE(n) => combine_with_op("<=", &n.a, &n.b),
            ExprNode::GT(n) => combine_with_op(">", &n.a, &n.b),
            ExprNode::GE(n) => combine_with_op(">=", &n.a, &n.b),
            ExprNode::And(n) => combine_with_op("&&", &n.a, &n.b),
            ExprNode::Or(n) => combine_with_op("||", &n.a, &n.b),
            ExprNode::Not(n) => format!("!{}", pretty_print_with_parens(&n.a)),
            ExprNode::Select(s) => format!(
                "select({}, {}, {})",
                s.condition.pretty_print(),
                s.true_value.pretty_print(),
                s.false_value.pretty_print()
            ),
            ExprNode::Let(l) => format!("(let {} = {} in {})", l.name, l.value.pretty_print(), l.body.pretty_print()),
            ExprNode::Call(c) => format!("{}({})", c.name, comma_separated(&c.args))
        }
    }

    fn is_leaf(&self) -> bool {
        if !self.defined() {
            return true;
        }
        match self.node() {
            ExprNode::Add(_) | ExprNode::Sub(_) | ExprNode::Mul(_) | ExprNode::Div(_)
            | ExprNode::Mod(_) | ExprNode::EQ(_) | ExprNode::NE(_) | ExprNode::LT(_)
            | ExprNode::LE(_) | ExprNode::GT(_) | ExprNode::GE(_) | ExprNode::And(_)
            | ExprNode::Or(_) => false,
            _ => true
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pretty_print())
    }
}

fn print_stmt(s: &Stmt, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    if !s.defined() {
        out.push_str(&format!("{}<undefined>\n", pad));
        return;
    }
    match s.node() {
        StmtNode::LetStmt(l) => {
            out.push_str(&format!("{}let {} = {}\n", pad, l.name, l.value));
            print_stmt(&l.body, indent, out);
        },
        StmtNode::AssertStmt(a) => {
            out.push_str(&format!("{}assert({}, {})\n", pad, a.condition, a.message));
        },
        StmtNode::For(l) => {
            out.push_str(&format!(
                "{}for<{:?}> ({}, {}, {}) {{\n",
                pad, l.for_type, l.name, l.min, l.extent
            ));
            print_stmt(&l.body, indent + 1, out);
            out.push_str(&format!("{}}}\n", pad));
        },
        StmtNode::Provide(p) => {
            let values = if p.values.len() == 1 {
                p.values[0].to_string()
            } else {
                format!("{{{}}}", comma_separated(&p.values))
            };
            out.push_str(&format!("{}{}({}) = {}\n", pad, p.name, comma_separated(&p.args), values));
        },
        StmtNode::Block(b) => {
            print_stmt(&b.first, indent, out);
            if b.rest.defined() {
                print_stmt(&b.rest, indent, out);
            }
        },
        StmtNode::Evaluate(e) => {
            out.push_str(&format!("{}{}\n", pad, e.value));
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut out = String::new();
        print_stmt(self, 0, &mut out);
        write!(f, "{}", out)
    }
}
