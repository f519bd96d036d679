use std::collections::BTreeMap;

use snafu::ensure;
use tracing::debug;

use crate::error::*;
use crate::func::reduction::ReductionDomain;
use crate::func::schedule::Schedule;
use crate::ir::*;

/// One stage of a function: `name(args) = values`.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub(crate) args: Vec<Expr>,
    pub(crate) values: Vec<Expr>,
    pub(crate) schedule: Schedule,
    pub(crate) is_update: bool
}

impl Definition {
    pub fn args(&self) -> &[Expr] {
        &self.args
    }

    pub fn values(&self) -> &[Expr] {
        &self.values
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn schedule_mut(&mut self) -> &mut Schedule {
        &mut self.schedule
    }

    pub fn is_update(&self) -> bool {
        self.is_update
    }

    pub fn reduction_domain(&self) -> Option<&ReductionDomain> {
        self.schedule.reduction_domain()
    }
}

/// Finds the reduction domain referenced by an expression, if any.
#[derive(Default)]
struct FindReductionDomain {
    domain: Option<ReductionDomain>
}

impl IRVisitor for FindReductionDomain {
    fn visit_expr(&mut self, e: &Expr) {
        if let Some(Variable { reduction_domain: Some(d), .. }) = e.as_::<Variable>() {
            if self.domain.is_none() {
                self.domain = Some(d.clone());
            }
        }
        walk_expr(self, e);
    }
}

/// A named computation over a multidimensional domain: an initial pure
/// definition followed by zero or more updates.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub(crate) name: String,
    pub(crate) args: Vec<String>,
    pub(crate) output_types: Vec<Type>,
    pub(crate) init: Definition,
    pub(crate) updates: Vec<Definition>
}

impl Function {
    /// Define `name(args) = values`. A function with several values is tuple-valued.
    pub fn new(name: &str, args: &[&str], values: Vec<Expr>) -> Function {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let output_types = values.iter().map(|v| v.type_()).collect();
        let init = Definition {
            args: args.iter().map(|a| Expr::var(a)).collect(),
            values,
            schedule: Schedule::for_pure_args(&args),
            is_update: false
        };
        Function { name: name.to_string(), args, output_types, init, updates: vec![] }
    }

    /// Shorthand for a single-valued function.
    pub fn pure(name: &str, args: &[&str], value: Expr) -> Function {
        Function::new(name, args, vec![value])
    }

    /// Add an update `name(args) = values`. Any reduction domain the update
    /// refers to becomes the domain of its schedule.
    pub fn define_update(&mut self, args: Vec<Expr>, values: Vec<Expr>) -> Result<&mut Definition> {
        ensure!(
            args.len() == self.args.len(),
            DimensionMismatchSnafu { func: self.name.as_str(), expected: self.args.len(), actual: args.len() }
        );
        ensure!(
            values.len() == self.output_types.len(),
            DimensionMismatchSnafu { func: self.name.as_str(), expected: self.output_types.len(), actual: values.len() }
        );

        let mut finder = FindReductionDomain::default();
        for e in args.iter().chain(&values) {
            finder.visit_expr(e);
        }
        let pure_vars: Vec<String> = args
            .iter()
            .filter_map(|a| a.as_::<Variable>())
            .filter(|v| v.reduction_domain.is_none() && self.args.contains(&v.name))
            .map(|v| v.name.clone())
            .collect();
        debug!(func = %self.name, stage = self.updates.len() + 1, ?pure_vars, "define update");

        let schedule = Schedule::for_update(&pure_vars, finder.domain);
        self.updates.push(Definition { args, values, schedule, is_update: true });
        let last = self.updates.len() - 1;
        Ok(&mut self.updates[last])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn dimensions(&self) -> usize {
        self.args.len()
    }

    pub fn output_types(&self) -> &[Type] {
        &self.output_types
    }

    /// Bytes needed to store every value at one point.
    pub fn bytes_per_element(&self) -> i64 {
        self.output_types.iter().map(|t| t.bytes()).sum()
    }

    pub fn init(&self) -> &Definition {
        &self.init
    }

    pub fn updates(&self) -> &[Definition] {
        &self.updates
    }

    pub fn is_pure(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn num_stages(&self) -> usize {
        1 + self.updates.len()
    }

    /// Stage 0 is the initial definition, stage `i` the `i`th update.
    pub fn stage(&self, stage: usize) -> Result<&Definition> {
        match stage {
            0 => Ok(&self.init),
            s if s <= self.updates.len() => Ok(&self.updates[s - 1]),
            _ => StageOutOfRangeSnafu { name: self.name.as_str(), stage, num_stages: self.num_stages() }.fail()
        }
    }

    pub fn stage_mut(&mut self, stage: usize) -> Result<&mut Definition> {
        let num_stages = self.num_stages();
        match stage {
            0 => Ok(&mut self.init),
            s if s < num_stages => Ok(&mut self.updates[s - 1]),
            _ => StageOutOfRangeSnafu { name: self.name.as_str(), stage, num_stages }.fail()
        }
    }

    pub fn stages(&self) -> impl Iterator<Item = &Definition> {
        std::iter::once(&self.init).chain(self.updates.iter())
    }

    pub fn schedule(&self) -> &Schedule {
        &self.init.schedule
    }

    pub fn schedule_mut(&mut self) -> &mut Schedule {
        &mut self.init.schedule
    }

    /// The variables a stage loops over: for updates the reduction
    /// variables followed by the pure variables it keeps, otherwise the
    /// function's arguments.
    pub fn stage_loop_vars(&self, stage: usize) -> Result<Vec<String>> {
        let def = self.stage(stage)?;
        if !def.is_update {
            return Ok(self.args.clone());
        }
        let mut vars: Vec<String> = def
            .reduction_domain()
            .map(|d| d.domain().iter().map(|rv| rv.var.clone()).collect())
            .unwrap_or_default();
        vars.extend(def.schedule.storage_dims().iter().cloned());
        Ok(vars)
    }

    /// An expression reading value 0 of this function at `args`.
    pub fn call(&self, args: Vec<Expr>) -> Expr {
        self.call_value(0, args)
    }

    pub fn call_value(&self, value_index: usize, args: Vec<Expr>) -> Expr {
        Call::make_indexed(self.output_types[value_index], &self.name, args, CallType::Halide, value_index)
    }
}

/// All the functions of a pipeline, by name.
pub type Env = BTreeMap<String, Function>;

pub fn env_from(funcs: Vec<Function>) -> Env {
    funcs.into_iter().map(|f| (f.name.clone(), f)).collect()
}

/// A buffer supplied from outside the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub name: String,
    pub type_: Type,
    pub dimensions: usize
}

impl ImageInput {
    pub fn new(name: &str, type_: Type, dimensions: usize) -> ImageInput {
        ImageInput { name: name.to_string(), type_, dimensions }
    }

    /// A read of this input at the given coordinates.
    ///
    /// # Panics
    ///
    /// If the number of coordinates differs from `dimensions`.
    pub fn at(&self, args: Vec<Expr>) -> Expr {
        assert_eq!(args.len(), self.dimensions, "Wrong number of coordinates for input {}", self.name);
        Call::make(self.type_, &self.name, args, CallType::Image)
    }
}
