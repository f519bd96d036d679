//! Who calls whom, and an order in which functions can be realized.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::*;
use crate::func::function::{Env, Function};
use crate::ir::*;

/// Collects every read of a pipeline function or input image.
#[derive(Debug, Default)]
pub struct FindAllCalls {
    pub funcs_called: BTreeSet<String>,
    /// Each read with its coordinates, in visiting order.
    pub call_args: Vec<(String, Vec<Expr>)>
}

impl IRVisitor for FindAllCalls {
    fn visit_expr(&mut self, e: &Expr) {
        if let Some(call) = e.as_::<Call>() {
            if call.is_load() {
                self.funcs_called.insert(call.name.clone());
                self.call_args.push((call.name.clone(), call.args.clone()));
            }
        }
        walk_expr(self, e);
    }
}

/// Records the element type of every input image read.
#[derive(Debug, Default)]
pub struct FindImageInputs {
    pub input_types: BTreeMap<String, Type>
}

impl IRVisitor for FindImageInputs {
    fn visit_expr(&mut self, e: &Expr) {
        if let Some(call) = e.as_::<Call>() {
            if call.call_type == CallType::Image {
                self.input_types.insert(call.name.clone(), call.type_);
            }
        }
        walk_expr(self, e);
    }
}

/// Runs `visitor` over the values and arguments of every stage of `f`.
pub fn visit_function<V: IRVisitor>(visitor: &mut V, f: &Function) {
    for def in f.stages() {
        for e in def.values().iter().chain(def.args()) {
            visitor.visit_expr(e);
        }
    }
}

pub fn find_calls(e: &Expr) -> FindAllCalls {
    let mut finder = FindAllCalls::default();
    finder.visit_expr(e);
    finder
}

/// The pipeline functions `f` reads directly, excluding itself.
pub fn find_direct_calls(f: &Function) -> BTreeSet<String> {
    let mut finder = FindAllCalls::default();
    visit_function(&mut finder, f);
    let mut inputs = FindImageInputs::default();
    visit_function(&mut inputs, f);
    finder
        .funcs_called
        .into_iter()
        .filter(|name| name != f.name() && !inputs.input_types.contains_key(name))
        .collect()
}

/// Every pipeline function `f` depends on, directly or not.
pub fn find_transitive_calls(f: &Function, env: &Env) -> Result<BTreeSet<String>> {
    let mut result = BTreeSet::new();
    let mut pending: Vec<String> = find_direct_calls(f).into_iter().collect();
    while let Some(name) = pending.pop() {
        if !result.insert(name.clone()) {
            continue;
        }
        let callee = lookup(env, &name)?;
        pending.extend(find_direct_calls(callee));
    }
    Ok(result)
}

/// Every input image read anywhere in `env`, with its element type.
pub fn find_image_inputs(env: &Env) -> BTreeMap<String, Type> {
    let mut finder = FindImageInputs::default();
    for f in env.values() {
        visit_function(&mut finder, f);
    }
    finder.input_types
}

pub fn lookup<'e>(env: &'e Env, name: &str) -> Result<&'e Function> {
    match env.get(name) {
        Some(f) => Ok(f),
        None => UnknownFunctionSnafu { name }.fail()
    }
}

/// Names of `outputs` and everything they depend on, producers before
/// consumers. Ties are broken by name so the order is deterministic.
pub fn realization_order(outputs: &[&str], env: &Env) -> Result<Vec<String>> {
    fn visit(name: &str, env: &Env, visited: &mut BTreeSet<String>, order: &mut Vec<String>) -> Result<()> {
        if !visited.insert(name.to_string()) {
            return Ok(());
        }
        let f = lookup(env, name)?;
        for callee in find_direct_calls(f) {
            visit(&callee, env, visited, order)?;
        }
        order.push(name.to_string());
        Ok(())
    }

    let mut visited = BTreeSet::new();
    let mut order = vec![];
    for output in outputs {
        visit(output, env, &mut visited, &mut order)?;
    }
    debug!(?outputs, ?order, "realization order");
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::func::env_from;
    use crate::func::ImageInput;

    /// h reads an input, g reads h twice, f reads g and h
    fn chain() -> Env {
        let (x, y) = (Expr::var("x"), Expr::var("y"));
        let input = ImageInput::new("in", Type::uint(8), 2);
        let h = Function::pure("h", &["x", "y"], cast(Type::int(32), input.at(vec![x.clone(), y.clone()])));
        let g = Function::pure("g", &["x", "y"], h.call(vec![x.clone() - 1, y.clone()]) + h.call(vec![x.clone() + 1, y.clone()]));
        let f = Function::pure("f", &["x", "y"], g.call(vec![x.clone(), y.clone()]) * h.call(vec![x, y]));
        env_from(vec![f, g, h])
    }

    #[test]
    fn test_find_calls() {
        let env = chain();
        let calls = find_calls(&env["g"].init().values()[0]);
        assert_eq!(calls.funcs_called.len(), 1);
        assert_eq!(calls.call_args.len(), 2);
        assert_eq!(calls.call_args[0].1[0].to_string(), "x - 1");
    }

    #[test]
    fn test_direct_and_transitive_calls() {
        let env = chain();
        let direct: Vec<String> = find_direct_calls(&env["f"]).into_iter().collect();
        assert_eq!(direct, vec!["g", "h"]);
        assert!(find_direct_calls(&env["h"]).is_empty());
        assert_eq!(find_transitive_calls(&env["g"], &env).unwrap().len(), 1);
    }

    #[test]
    fn test_realization_order() {
        let env = chain();
        assert_eq!(realization_order(&["f"], &env).unwrap(), vec!["h", "g", "f"]);
        assert_eq!(realization_order(&["g", "f"], &env).unwrap(), vec!["h", "g", "f"]);
        assert!(realization_order(&["nope"], &env).is_err());
    }

    #[test]
    fn test_self_reference_in_update() {
        let x = Expr::var("x");
        let mut f = Function::pure("f", &["x"], x.clone());
        f.define_update(vec![x.clone()], vec![f.call(vec![x - 1]) + 1]).unwrap();
        let env = env_from(vec![f]);
        assert_eq!(realization_order(&["f"], &env).unwrap(), vec!["f"]);
    }

    #[test]
    fn test_find_image_inputs() {
        let inputs = find_image_inputs(&chain());
        assert_eq!(inputs.get("in"), Some(&Type::uint(8)));
        assert_eq!(inputs.len(), 1);
    }
}
