//! A small algebraic simplifier: constant folding plus the handful of
//! identities needed to turn region extents like `(x + 39) - x + 1` into
//! constants.
//!
//! Integer division and modulus are Euclidean, so the remainder is never
//! negative. Division or modulus by zero folds to zero.

use crate::ir::dsl::*;
use crate::ir::expr::*;
use crate::ir::substitute::substitute;
use crate::ir::types::Type;

fn make_bool(value: bool) -> Expr {
    IntImm::make(Type::bool_(), value as i64)
}

fn const_bool(e: &Expr) -> Option<bool> {
    e.as_const_int().map(|v| v != 0)
}

fn const_float(e: &Expr) -> Option<f64> {
    e.as_::<FloatImm>().map(|f| f.value)
}

/// Wraps an integer constant to the width of `t`, as a cast to `t` would.
fn wrap_to(t: Type, value: i64) -> i64 {
    let bits = u32::from(t.bits);
    if t.is_bool() {
        (value != 0) as i64
    } else if bits >= 64 || !(t.is_int() || t.is_uint()) {
        value
    } else if t.is_uint() {
        value & ((1i64 << bits) - 1)
    } else {
        let shift = 64 - bits;
        (value << shift) >> shift
    }
}

fn is_const(e: &Expr, value: i64) -> bool {
    e.as_const_int() == Some(value)
}

fn fold_int(a: &Expr, b: &Expr, f: impl Fn(i64, i64) -> i64) -> Option<Expr> {
    match (a.as_const_int(), b.as_const_int()) {
        (Some(x), Some(y)) => Some(IntImm::make(a.type_(), f(x, y))),
        _ => None
    }
}

fn fold_float(a: &Expr, b: &Expr, f: impl Fn(f64, f64) -> f64) -> Option<Expr> {
    match (const_float(a), const_float(b)) {
        (Some(x), Some(y)) => Some(FloatImm::make(a.type_(), f(x, y))),
        _ => None
    }
}

fn fold_cmp(a: &Expr, b: &Expr, f: impl Fn(f64, f64) -> bool) -> Option<Expr> {
    let value = |e: &Expr| e.as_const_int().map(|v| v as f64).or_else(|| const_float(e));
    match (value(a), value(b)) {
        (Some(x), Some(y)) => Some(make_bool(f(x, y))),
        _ => None
    }
}

/// Splits `x + c` into `(x, c)` for a constant `c`.
fn split_const_add(e: &Expr) -> Option<(Expr, i64)> {
    let add = e.as_::<Add>()?;
    Some((add.a.clone(), add.b.as_const_int()?))
}

fn simplify_add(a: Expr, b: Expr) -> Expr {
    if let Some(e) = fold_int(&a, &b, i64::wrapping_add).or_else(|| fold_float(&a, &b, |x, y| x + y)) {
        return e;
    }
    // Keep constants on the right
    if a.as_const_int().is_some() && b.as_const_int().is_none() {
        return simplify_add(b, a);
    }
    if is_const(&b, 0) {
        return a;
    }
    if let (Some((x, c1)), Some(c2)) = (split_const_add(&a), b.as_const_int()) {
        return simplify_add(x, IntImm::make(b.type_(), c1.wrapping_add(c2)));
    }
    Add::make(a, b)
}

fn simplify_sub(a: Expr, b: Expr) -> Expr {
    if let Some(e) = fold_int(&a, &b, i64::wrapping_sub).or_else(|| fold_float(&a, &b, |x, y| x - y)) {
        return e;
    }
    if a == b && !a.type_().is_float() {
        return IntImm::make(a.type_(), 0);
    }
    if let Some(c) = b.as_const_int() {
        return simplify_add(a, IntImm::make(b.type_(), c.wrapping_neg()));
    }
    // (x + c) - x
    if let Some((x, c)) = split_const_add(&a) {
        if x == b {
            return IntImm::make(a.type_(), c);
        }
    }
    // (x + c1) - (x + c2)
    if let (Some((x1, c1)), Some((x2, c2))) = (split_const_add(&a), split_const_add(&b)) {
        if x1 == x2 {
            return IntImm::make(a.type_(), c1.wrapping_sub(c2));
        }
    }
    Sub::make(a, b)
}

fn simplify_mul(a: Expr, b: Expr) -> Expr {
    if let Some(e) = fold_int(&a, &b, i64::wrapping_mul).or_else(|| fold_float(&a, &b, |x, y| x * y)) {
        return e;
    }
    if a.as_const_int().is_some() && b.as_const_int().is_none() {
        return simplify_mul(b, a);
    }
    if is_const(&b, 0) {
        return b;
    }
    if is_const(&b, 1) {
        return a;
    }
    Mul::make(a, b)
}

fn simplify_div(a: Expr, b: Expr) -> Expr {
    let div = |x: i64, y: i64| if y == 0 { 0 } else { x.wrapping_div_euclid(y) };
    if let Some(e) = fold_int(&a, &b, div).or_else(|| fold_float(&a, &b, |x, y| x / y)) {
        return e;
    }
    if is_const(&b, 1) {
        return a;
    }
    Div::make(a, b)
}

fn simplify_mod(a: Expr, b: Expr) -> Expr {
    let rem = |x: i64, y: i64| if y == 0 { 0 } else { x.wrapping_rem_euclid(y) };
    if let Some(e) = fold_int(&a, &b, rem) {
        return e;
    }
    if is_const(&b, 1) {
        return IntImm::make(a.type_(), 0);
    }
    Mod::make(a, b)
}

/// Simplify an expression. Returns the input handle itself when nothing changes.
pub fn simplify(e: &Expr) -> Expr {
    if !e.defined() {
        return e.clone();
    }
    let result = match e.node() {
        ExprNode::IntImm(_) | ExprNode::FloatImm(_) | ExprNode::StringImm(_) | ExprNode::Variable(_) => {
            return e.clone();
        },
        ExprNode::Cast(c) => {
            let value = simplify(&c.value);
            match value.as_const_int() {
                Some(v) if c.type_.is_float() => FloatImm::make(c.type_, v as f64),
                Some(v) => IntImm::make(c.type_, wrap_to(c.type_, v)),
                None => match const_float(&value) {
                    Some(v) if !c.type_.is_float() => IntImm::make(c.type_, wrap_to(c.type_, v.trunc() as i64)),
                    Some(v) => FloatImm::make(c.type_, v),
                    None if value.type_() == c.type_ => value,
                    None => Cast::make(c.type_, value)
                }
            }
        },
        ExprNode::Add(n) => simplify_add(simplify(&n.a), simplify(&n.b)),
        ExprNode::Sub(n) => simplify_sub(simplify(&n.a), simplify(&n.b)),
        ExprNode::Mul(n) => simplify_mul(simplify(&n.a), simplify(&n.b)),
        ExprNode::Div(n) => simplify_div(simplify(&n.a), simplify(&n.b)),
        ExprNode::Mod(n) => simplify_mod(simplify(&n.a), simplify(&n.b)),
        ExprNode::Min(n) => {
            let (a, b) = (simplify(&n.a), simplify(&n.b));
            if a == b {
                a
            } else {
                fold_int(&a, &b, i64::min)
                    .or_else(|| fold_float(&a, &b, f64::min))
                    .unwrap_or_else(|| min(a, b))
            }
        },
        ExprNode::Max(n) => {
            let (a, b) = (simplify(&n.a), simplify(&n.b));
            if a == b {
                a
            } else {
                fold_int(&a, &b, i64::max)
                    .or_else(|| fold_float(&a, &b, f64::max))
                    .unwrap_or_else(|| max(a, b))
            }
        },
        ExprNode::EQ(n) => {
            let (a, b) = (simplify(&n.a), simplify(&n.b));
            if a == b { make_bool(true) } else { fold_cmp(&a, &b, |x, y| x == y).unwrap_or_else(|| EQ::make(a, b)) }
        },
        ExprNode::NE(n) => {
            let (a, b) = (simplify(&n.a), simplify(&n.b));
            if a == b { make_bool(false) } else { fold_cmp(&a, &b, |x, y| x != y).unwrap_or_else(|| NE::make(a, b)) }
        },
        ExprNode::LT(n) => {
            let (a, b) = (simplify(&n.a), simplify(&n.b));
            fold_cmp(&a, &b, |x, y| x < y).unwrap_or_else(|| LT::make(a, b))
        },
        ExprNode::LE(n) => {
            let (a, b) = (simplify(&n.a), simplify(&n.b));
            fold_cmp(&a, &b, |x, y| x <= y).unwrap_or_else(|| LE::make(a, b))
        },
        ExprNode::GT(n) => {
            let (a, b) = (simplify(&n.a), simplify(&n.b));
            fold_cmp(&a, &b, |x, y| x > y).unwrap_or_else(|| GT::make(a, b))
        },
        ExprNode::GE(n) => {
            let (a, b) = (simplify(&n.a), simplify(&n.b));
            fold_cmp(&a, &b, |x, y| x >= y).unwrap_or_else(|| GE::make(a, b))
        },
        ExprNode::And(n) => {
            let (a, b) = (simplify(&n.a), simplify(&n.b));
            match (const_bool(&a), const_bool(&b)) {
                (Some(false), _) | (_, Some(false)) => make_bool(false),
                (Some(true), _) => b,
                (_, Some(true)) => a,
                _ => And::make(a, b)
            }
        },
        ExprNode::Or(n) => {
            let (a, b) = (simplify(&n.a), simplify(&n.b));
            match (const_bool(&a), const_bool(&b)) {
                (Some(true), _) | (_, Some(true)) => make_bool(true),
                (Some(false), _) => b,
                (_, Some(false)) => a,
                _ => Or::make(a, b)
            }
        },
        ExprNode::Not(n) => {
            let a = simplify(&n.a);
            match const_bool(&a) {
                Some(v) => make_bool(!v),
                None => Not::make(a)
            }
        },
        ExprNode::Select(s) => {
            let condition = simplify(&s.condition);
            match const_bool(&condition) {
                Some(true) => simplify(&s.true_value),
                Some(false) => simplify(&s.false_value),
                None => {
                    let (t, f) = (simplify(&s.true_value), simplify(&s.false_value));
                    if t == f { t } else { Select::make(condition, t, f) }
                }
            }
        },
        ExprNode::Let(l) => {
            let value = simplify(&l.value);
            if value.is::<IntImm>() || value.is::<FloatImm>() || value.is::<Variable>() {
                simplify(&substitute(&l.name, &value, &l.body))
            } else {
                Let::make(&l.name, value, simplify(&l.body))
            }
        },
        ExprNode::Call(c) => {
            let args: Vec<Expr> = c.args.iter().map(simplify).collect();
            if args.iter().zip(&c.args).all(|(new, old)| new.same_as(old)) {
                return e.clone();
            }
            Call::make_indexed(c.type_, &c.name, args, c.call_type, c.value_index)
        }
    };

    // Hand back the original handle for structurally unchanged results
    if result == *e { e.clone() } else { result }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn x() -> Expr { Expr::var("x") }

    #[test_case((Expr::int(2) + 3) * x(), "x * 5"; "fold then commute")]
    #[test_case(x() - x(), "0"; "self subtraction")]
    #[test_case((x() + 39) - x() + 1, "40"; "extent of shifted interval")]
    #[test_case((x() + 2) + 3, "x + 5"; "reassociate constants")]
    #[test_case((x() - 2) + 3, "x + 1"; "subtract then add")]
    #[test_case(x() * 1 + 0, "x"; "identities")]
    #[test_case(x() * 0, "0"; "multiply by zero")]
    #[test_case(Expr::int(-7) / 2, "-4"; "euclidean division")]
    #[test_case(Expr::int(-7) % 2, "1"; "euclidean modulus")]
    #[test_case(Expr::int(7) / -2, "-3"; "euclidean division by negative")]
    #[test_case(Expr::int(7) % -2, "1"; "euclidean modulus by negative")]
    #[test_case(Expr::int(7) / 0, "0"; "division by zero")]
    #[test_case(min(3, 9) + max(x(), x()), "x + 3"; "min and max")]
    #[test_case(select(Expr::int(3).lt(4), x(), Expr::int(0)), "x"; "constant select")]
    #[test_case(Let::make("y", Expr::int(4), Expr::var("y") * 2), "8"; "constant let")]
    #[test_case(!(x().lt(1)).and(Expr::int(1).lt(2)), "!(x < 1)"; "boolean identities")]
    #[test_case(cast(Type::float(32), Expr::int(2)), "2.0f"; "cast constant")]
    #[test_case(cast(Type::uint(8), Expr::int(300)), "44"; "cast wraps unsigned")]
    #[test_case(cast(Type::int(8), Expr::int(200)), "-56"; "cast wraps signed")]
    #[test_case(cast(Type::int(16), Expr::float(70000.5)), "4464"; "float cast wraps")]
    fn test_simplify(e: Expr, expected: &str) {
        assert_eq!(simplify(&e).to_string(), expected);
    }

    #[test]
    fn test_unchanged_keeps_identity() {
        let e = x() + Expr::var("y");
        assert!(simplify(&e).same_as(&e));
        let call = Call::make(Type::int(32), "f", vec![x(), Expr::int(1)], CallType::Halide);
        assert!(simplify(&call).same_as(&call));
    }

    #[test]
    fn test_symbolic_extent_stays_symbolic() {
        let n = Expr::var("n");
        let e = simplify(&((n.clone() - 1) - 0 + 1));
        assert_eq!(e, n);
        assert_eq!(simplify(&(n.clone() * 2 - n)).as_const_int(), None);
    }
}
