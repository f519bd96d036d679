use std::collections::BTreeMap;

use snafu::ensure;
use tracing::trace;

use crate::error::*;
use crate::func::function::Function;
use crate::ir::*;

/// Replaces every call to `f` in `e` with the body of `f`, its arguments
/// substituted by the call's coordinates. Only pure functions can be inlined.
pub fn inline_function(e: &Expr, f: &Function) -> Result<Expr> {
    ensure!(f.is_pure(), InlineUpdateSnafu { name: f.name() });
    let inlined = inline_calls(e, f);
    if !inlined.same_as(e) {
        trace!(func = %f.name(), before = %e, after = %inlined, "inlined");
    }
    Ok(inlined)
}

fn inline_calls(e: &Expr, f: &Function) -> Expr {
    if !e.defined() {
        return e.clone();
    }
    let rebuilt = map_children(e, |child| inline_calls(child, f));
    match rebuilt.as_::<Call>() {
        Some(call) if call.call_type == CallType::Halide && call.name == f.name() => {
            let bindings: BTreeMap<String, Expr> = f.args().iter().cloned().zip(call.args.iter().cloned()).collect();
            substitute_map(&bindings, &f.init().values()[call.value_index])
        },
        _ => rebuilt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g() -> Function {
        let (x, y) = (Expr::var("x"), Expr::var("y"));
        Function::pure("g", &["x", "y"], x + y)
    }

    #[test]
    fn test_inline_swaps_arguments() {
        let g = g();
        let (x, y) = (Expr::var("x"), Expr::var("y"));
        let f_value = 2 * g.call(vec![y, x]);
        assert_eq!(inline_function(&f_value, &g).unwrap().to_string(), "2 * (y + x)");
    }

    #[test]
    fn test_inline_nested_calls() {
        let g = g();
        let x = Expr::var("x");
        let e = g.call(vec![g.call(vec![x.clone(), 1.into()]), x]);
        assert_eq!(inline_function(&e, &g).unwrap().to_string(), "(x + 1) + x");
    }

    #[test]
    fn test_inline_without_calls_is_identity() {
        let e = Expr::var("x") * 3;
        assert!(inline_function(&e, &g()).unwrap().same_as(&e));
    }

    #[test]
    fn test_inline_tuple_value() {
        let x = Expr::var("x");
        let t = Function::new("t", &["x"], vec![x.clone() + 1, x.clone() * 2]);
        let e = t.call_value(1, vec![Expr::var("z")]);
        assert_eq!(inline_function(&e, &t).unwrap().to_string(), "z * 2");
    }

    #[test]
    fn test_cannot_inline_update() {
        let x = Expr::var("x");
        let mut f = Function::pure("f", &["x"], x.clone());
        f.define_update(vec![x.clone()], vec![x.clone() + 1]).unwrap();
        let err = inline_function(&f.call(vec![x]), &f);
        assert_eq!(err, Err(Error::InlineUpdate { name: "f".to_string() }));
    }
}
