use std::collections::BTreeMap;

use crate::cost::config::CostConfig;
use crate::cost::estimate::Cost;
use crate::ir::*;

/// Sums the cost of evaluating an expression once, and counts the
/// elements it loads from each function or input.
#[derive(Debug)]
pub struct ExprCost<'c> {
    config: &'c CostConfig,
    pub arith: i64,
    pub memory: i64,
    pub detailed_loads: BTreeMap<String, i64>
}

impl<'c> ExprCost<'c> {
    pub fn new(config: &'c CostConfig) -> ExprCost<'c> {
        ExprCost { config, arith: 0, memory: 0, detailed_loads: BTreeMap::new() }
    }

    pub fn cost(&self) -> Cost {
        Cost::new(self.arith, self.memory)
    }
}

impl<'c> IRVisitor for ExprCost<'c> {
    fn visit_expr(&mut self, e: &Expr) {
        if !e.defined() {
            return;
        }
        match e.node() {
            ExprNode::IntImm(_) | ExprNode::FloatImm(_) | ExprNode::StringImm(_) | ExprNode::Variable(_) => {},
            ExprNode::Let(_) => {},
            ExprNode::Call(c) => match c.call_type {
                CallType::Halide | CallType::Image => {
                    self.memory += self.config.load;
                    *self.detailed_loads.entry(c.name.clone()).or_insert(0) += 1;
                },
                CallType::Extern | CallType::Intrinsic => self.arith += self.config.extern_call
            },
            _ => self.arith += self.config.arith_op
        }
        walk_expr(self, e);
    }
}

/// The cost of evaluating `e` once.
pub fn expr_cost(e: &Expr, config: &CostConfig) -> Cost {
    let mut visitor = ExprCost::new(config);
    visitor.visit_expr(e);
    visitor.cost()
}
