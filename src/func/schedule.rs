//! How one stage of a function is evaluated: its loop nest, where it is
//! stored and computed, and conditional alternatives to all of that.
//!
//! A `Schedule` is a plain value. Whoever owns the stage owns its schedule
//! and mutates it through `&mut`; cloning takes an independent snapshot.

use std::collections::BTreeMap;

use snafu::ensure;
use tracing::trace;

use crate::error::*;
use crate::func::reduction::ReductionDomain;
use crate::ir::{DeviceAPI, Expr, ForType};

/// Name of the placeholder dimension outside every real loop.
pub const OUTERMOST: &str = "__outermost";

/// A position in some function's loop nest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopLevel {
    /// Computed where it is used, with no storage of its own.
    Inlined,
    /// Outside all loops.
    Root,
    /// Inside the loop over `var` of function `func`.
    At { func: String, var: String }
}

impl LoopLevel {
    pub fn at(func: &str, var: &str) -> LoopLevel {
        LoopLevel::At { func: func.to_string(), var: var.to_string() }
    }

    pub fn is_inline(&self) -> bool {
        *self == LoopLevel::Inlined
    }

    pub fn is_root(&self) -> bool {
        *self == LoopLevel::Root
    }

    /// Does this level name the loop over `var` in `func`?
    pub fn matches(&self, func: &str, var: &str) -> bool {
        match self {
            LoopLevel::At { func: f, var: v } => f == func && v == var,
            _ => false
        }
    }
}

impl Default for LoopLevel {
    fn default() -> LoopLevel {
        LoopLevel::Inlined
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitType {
    SplitVar,
    RenameVar,
    FuseVars
}

/// A loop transformation, recorded in the order it was applied.
///
/// For `SplitVar`, `old_var = outer * factor + inner`. For `FuseVars`,
/// `old_var` is the fused loop and `factor` is undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub old_var: String,
    pub outer: String,
    pub inner: String,
    pub factor: Expr,
    /// Whether the extent must be an exact multiple of the factor.
    pub exact: bool,
    pub split_type: SplitType
}

impl Split {
    pub fn is_split(&self) -> bool {
        self.split_type == SplitType::SplitVar
    }

    pub fn is_rename(&self) -> bool {
        self.split_type == SplitType::RenameVar
    }

    pub fn is_fuse(&self) -> bool {
        self.split_type == SplitType::FuseVars
    }
}

/// One loop of the nest.
#[derive(Debug, Clone, PartialEq)]
pub struct Dim {
    pub var: String,
    pub for_type: ForType,
    pub device_api: DeviceAPI,
    /// False for loops derived from reduction variables.
    pub pure: bool
}

impl Dim {
    pub fn new(var: &str, pure: bool) -> Dim {
        Dim { var: var.to_string(), for_type: ForType::Serial, device_api: DeviceAPI::Parent, pure }
    }
}

/// An explicit bound on a dimension of the function.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub var: String,
    pub min: Expr,
    pub extent: Expr
}

/// An alternative schedule, used when `condition` is the first to hold.
#[derive(Debug, Clone, PartialEq)]
pub struct Specialization {
    pub condition: Expr,
    pub schedule: Schedule
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    store_level: LoopLevel,
    compute_level: LoopLevel,
    splits: Vec<Split>,
    /// Innermost first.
    dims: Vec<Dim>,
    storage_dims: Vec<String>,
    bounds: Vec<Bound>,
    specializations: Vec<Specialization>,
    reduction_domain: Option<ReductionDomain>,
    /// Consumer name to the name of the function wrapping calls made from it.
    wrappers: BTreeMap<String, String>,
    memoized: bool,
    touched: bool,
    allow_race_conditions: bool
}

/// Moves `vars` into the positions they currently occupy in `slots`, in the
/// given order.
fn permute<T, F: Fn(&T) -> &str>(slots: &mut Vec<T>, vars: &[&str], key: F) -> Result<()>
where
    T: Clone
{
    let mut positions = Vec::with_capacity(vars.len());
    for var in vars {
        match slots.iter().position(|s| key(s) == *var) {
            Some(i) => positions.push(i),
            None => return UnknownDimSnafu { var: var.to_string() }.fail()
        }
    }
    let moved: Vec<T> = positions.iter().map(|i| slots[*i].clone()).collect();
    positions.sort();
    for (pos, item) in positions.into_iter().zip(moved) {
        slots[pos] = item;
    }
    Ok(())
}

impl Schedule {
    pub fn new() -> Schedule {
        Schedule::default()
    }

    /// The default schedule for a pure definition over `args`:
    /// one serial loop per argument, innermost first.
    pub fn for_pure_args(args: &[String]) -> Schedule {
        let mut dims: Vec<Dim> = args.iter().map(|a| Dim::new(a, true)).collect();
        dims.push(Dim::new(OUTERMOST, true));
        Schedule { dims, storage_dims: args.to_vec(), ..Schedule::default() }
    }

    /// The default schedule for an update: reduction loops innermost,
    /// then the pure loops.
    pub fn for_update(pure_vars: &[String], reduction_domain: Option<ReductionDomain>) -> Schedule {
        let mut dims = vec![];
        if let Some(rdom) = &reduction_domain {
            dims.extend(rdom.domain().iter().map(|rv| Dim::new(&rv.var, false)));
        }
        dims.extend(pure_vars.iter().map(|v| Dim::new(v, true)));
        dims.push(Dim::new(OUTERMOST, true));
        Schedule { dims, storage_dims: pure_vars.to_vec(), reduction_domain, ..Schedule::default() }
    }

    pub fn store_level(&self) -> &LoopLevel {
        &self.store_level
    }

    pub fn store_level_mut(&mut self) -> &mut LoopLevel {
        &mut self.store_level
    }

    pub fn compute_level(&self) -> &LoopLevel {
        &self.compute_level
    }

    pub fn compute_level_mut(&mut self) -> &mut LoopLevel {
        &mut self.compute_level
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    pub fn splits_mut(&mut self) -> &mut Vec<Split> {
        &mut self.splits
    }

    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    pub fn dims_mut(&mut self) -> &mut Vec<Dim> {
        &mut self.dims
    }

    pub fn storage_dims(&self) -> &[String] {
        &self.storage_dims
    }

    pub fn storage_dims_mut(&mut self) -> &mut Vec<String> {
        &mut self.storage_dims
    }

    pub fn bounds(&self) -> &[Bound] {
        &self.bounds
    }

    pub fn bounds_mut(&mut self) -> &mut Vec<Bound> {
        &mut self.bounds
    }

    pub fn specializations(&self) -> &[Specialization] {
        &self.specializations
    }

    pub fn specializations_mut(&mut self) -> &mut Vec<Specialization> {
        &mut self.specializations
    }

    pub fn reduction_domain(&self) -> Option<&ReductionDomain> {
        self.reduction_domain.as_ref()
    }

    pub fn set_reduction_domain(&mut self, domain: ReductionDomain) {
        self.reduction_domain = Some(domain);
    }

    pub fn wrappers(&self) -> &BTreeMap<String, String> {
        &self.wrappers
    }

    pub fn wrappers_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.wrappers
    }

    pub fn memoized(&self) -> bool {
        self.memoized
    }

    pub fn memoized_mut(&mut self) -> &mut bool {
        &mut self.memoized
    }

    /// Has any scheduling directive been applied?
    pub fn touched(&self) -> bool {
        self.touched
    }

    pub fn touched_mut(&mut self) -> &mut bool {
        &mut self.touched
    }

    pub fn allow_race_conditions(&self) -> bool {
        self.allow_race_conditions
    }

    pub fn allow_race_conditions_mut(&mut self) -> &mut bool {
        &mut self.allow_race_conditions
    }

    fn dim_index(&self, var: &str) -> Result<usize> {
        match self.dims.iter().position(|d| d.var == var) {
            Some(i) => Ok(i),
            None => UnknownDimSnafu { var }.fail()
        }
    }

    /// Split loop `old` into `outer` and `inner`, with `inner` running over `factor` values.
    pub fn split<E: Into<Expr>>(&mut self, old: &str, outer: &str, inner: &str, factor: E) -> Result<&mut Schedule> {
        let factor = factor.into();
        trace!(old, outer, inner, factor = %factor, "split");
        let i = self.dim_index(old)?;
        let mut outer_dim = self.dims[i].clone();
        outer_dim.var = outer.to_string();
        self.dims[i].var = inner.to_string();
        self.dims.insert(i + 1, outer_dim);
        self.splits.push(Split {
            old_var: old.to_string(),
            outer: outer.to_string(),
            inner: inner.to_string(),
            factor,
            exact: false,
            split_type: SplitType::SplitVar
        });
        self.touched = true;
        Ok(self)
    }

    /// Merge loops `inner` and `outer` into a single loop `fused`, placed where `inner` was.
    pub fn fuse(&mut self, inner: &str, outer: &str, fused: &str) -> Result<&mut Schedule> {
        trace!(inner, outer, fused, "fuse");
        let i = self.dim_index(inner)?;
        let o = self.dim_index(outer)?;
        self.dims[i].var = fused.to_string();
        self.dims.remove(o);
        self.splits.push(Split {
            old_var: fused.to_string(),
            outer: outer.to_string(),
            inner: inner.to_string(),
            factor: Expr::undefined(),
            exact: true,
            split_type: SplitType::FuseVars
        });
        self.touched = true;
        Ok(self)
    }

    pub fn rename(&mut self, old: &str, new: &str) -> Result<&mut Schedule> {
        trace!(old, new, "rename");
        let i = self.dim_index(old)?;
        self.dims[i].var = new.to_string();
        self.splits.push(Split {
            old_var: old.to_string(),
            outer: new.to_string(),
            inner: String::new(),
            factor: Expr::undefined(),
            exact: false,
            split_type: SplitType::RenameVar
        });
        self.touched = true;
        Ok(self)
    }

    /// Reorder the named loops, innermost first. Unnamed loops stay where they are.
    pub fn reorder(&mut self, vars: &[&str]) -> Result<&mut Schedule> {
        trace!(?vars, "reorder");
        permute(&mut self.dims, vars, |d| d.var.as_str())?;
        self.touched = true;
        Ok(self)
    }

    fn set_for_type(&mut self, var: &str, for_type: ForType) -> Result<&mut Schedule> {
        trace!(var, ?for_type, "set loop type");
        let i = self.dim_index(var)?;
        self.dims[i].for_type = for_type;
        self.touched = true;
        Ok(self)
    }

    pub fn serial(&mut self, var: &str) -> Result<&mut Schedule> {
        self.set_for_type(var, ForType::Serial)
    }

    pub fn parallel(&mut self, var: &str) -> Result<&mut Schedule> {
        self.set_for_type(var, ForType::Parallel)
    }

    pub fn vectorize(&mut self, var: &str) -> Result<&mut Schedule> {
        self.set_for_type(var, ForType::Vectorized)
    }

    pub fn unroll(&mut self, var: &str) -> Result<&mut Schedule> {
        self.set_for_type(var, ForType::Unrolled)
    }

    /// Run loop `var` in parallel on the given device.
    pub fn gpu(&mut self, var: &str, device_api: DeviceAPI) -> Result<&mut Schedule> {
        trace!(var, ?device_api, "gpu");
        let i = self.dim_index(var)?;
        self.dims[i].for_type = ForType::Parallel;
        self.dims[i].device_api = device_api;
        self.touched = true;
        Ok(self)
    }

    /// Fix the range computed along the storage dimension `var`.
    pub fn bound<M: Into<Expr>, E: Into<Expr>>(&mut self, var: &str, min: M, extent: E) -> Result<&mut Schedule> {
        ensure!(self.storage_dims.iter().any(|d| d == var), UnknownDimSnafu { var });
        let (min, extent) = (min.into(), extent.into());
        trace!(var, min = %min, extent = %extent, "bound");
        self.bounds.push(Bound { var: var.to_string(), min, extent });
        self.touched = true;
        Ok(self)
    }

    /// Reorder the storage layout, innermost first.
    pub fn reorder_storage(&mut self, vars: &[&str]) -> Result<&mut Schedule> {
        trace!(?vars, "reorder storage");
        permute(&mut self.storage_dims, vars, |s| s.as_str())?;
        self.touched = true;
        Ok(self)
    }

    pub fn compute_root(&mut self) -> &mut Schedule {
        trace!("compute root");
        self.compute_level = LoopLevel::Root;
        self.store_level = LoopLevel::Root;
        self.touched = true;
        self
    }

    /// Compute and store inside the loop over `var` of `func`.
    pub fn compute_at(&mut self, func: &str, var: &str) -> &mut Schedule {
        trace!(func, var, "compute at");
        self.compute_level = LoopLevel::at(func, var);
        self.store_level = LoopLevel::at(func, var);
        self.touched = true;
        self
    }

    pub fn store_root(&mut self) -> &mut Schedule {
        trace!("store root");
        self.store_level = LoopLevel::Root;
        self.touched = true;
        self
    }

    pub fn store_at(&mut self, func: &str, var: &str) -> &mut Schedule {
        trace!(func, var, "store at");
        self.store_level = LoopLevel::at(func, var);
        self.touched = true;
        self
    }

    pub fn compute_inline(&mut self) -> &mut Schedule {
        trace!("compute inline");
        self.compute_level = LoopLevel::Inlined;
        self.store_level = LoopLevel::Inlined;
        self.touched = true;
        self
    }

    pub fn memoize(&mut self) -> &mut Schedule {
        self.memoized = true;
        self.touched = true;
        self
    }

    pub fn allow_races(&mut self) -> &mut Schedule {
        self.allow_race_conditions = true;
        self.touched = true;
        self
    }

    /// Route calls made from `consumer` through the function `wrapper`.
    pub fn add_wrapper(&mut self, consumer: &str, wrapper: &str) -> &mut Schedule {
        trace!(consumer, wrapper, "add wrapper");
        self.wrappers.insert(consumer.to_string(), wrapper.to_string());
        self.touched = true;
        self
    }

    /// Append a specialization whose schedule starts as a copy of this one,
    /// minus its specializations. Specializations are tried in the order added.
    pub fn add_specialization(&mut self, condition: Expr) -> &mut Specialization {
        trace!(condition = %condition, "add specialization");
        self.touched = true;
        let mut schedule = self.clone();
        schedule.specializations.clear();
        self.specializations.push(Specialization { condition, schedule });
        let last = self.specializations.len() - 1;
        &mut self.specializations[last]
    }

    /// The schedule that governs lowering: the first specialization whose
    /// condition `eval` reports true, or this schedule. Conditions that
    /// cannot be decided are skipped.
    pub fn specialization_for<F: Fn(&Expr) -> Option<bool>>(&self, eval: F) -> &Schedule {
        self.specializations
            .iter()
            .find(|s| eval(&s.condition) == Some(true))
            .map_or(self, |s| &s.schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::*;

    fn xy() -> Schedule {
        Schedule::for_pure_args(&["x".to_string(), "y".to_string()])
    }

    fn dim_names(s: &Schedule) -> Vec<&str> {
        s.dims().iter().map(|d| d.var.as_str()).collect()
    }

    #[test]
    fn test_default_schedule() {
        let s = xy();
        assert_eq!(dim_names(&s), vec!["x", "y", OUTERMOST]);
        assert_eq!(s.storage_dims(), &["x".to_string(), "y".to_string()]);
        assert!(s.compute_level().is_inline());
        assert!(!s.touched());
    }

    #[test]
    fn test_specialization_snapshot_isolation() {
        let mut s = xy();
        s.split("x", "xo", "xi", 8).unwrap();
        s.add_specialization(Expr::var("w").gt(100));
        s.split("y", "yo", "yi", 4).unwrap();

        let child = &s.specializations()[0].schedule;
        assert_eq!(child.splits().len(), 1);
        assert_eq!(s.splits().len(), 2);
        assert!(child.specializations().is_empty());
    }

    #[test]
    fn test_child_mutation_does_not_leak_to_parent() {
        let mut s = xy();
        s.split("x", "xo", "xi", 8).unwrap();
        s.add_specialization(Expr::var("w").gt(100))
            .schedule
            .vectorize("xi")
            .unwrap()
            .compute_root();

        assert_eq!(s.dims()[0].for_type, ForType::Serial);
        assert!(s.compute_level().is_inline());
        let child = &s.specializations()[0].schedule;
        assert_eq!(child.dims()[0].for_type, ForType::Vectorized);
        assert!(child.compute_level().is_root());
    }

    #[test]
    fn test_specialization_order() {
        let mut s = xy();
        s.add_specialization(Expr::var("w").gt(100));
        s.add_specialization(Expr::var("w").gt(10));
        let conditions: Vec<String> = s.specializations().iter().map(|sp| sp.condition.to_string()).collect();
        assert_eq!(conditions, vec!["w > 100", "w > 10"]);
    }

    #[test]
    fn test_specialization_for_picks_first_true() {
        let mut s = xy();
        s.add_specialization(Expr::var("w").gt(100)).schedule.parallel("y").unwrap();
        s.add_specialization(Expr::var("w").gt(10)).schedule.vectorize("x").unwrap();

        let w = 50;
        let eval = |c: &Expr| {
            let c = simplify(&substitute("w", &Expr::int(w), c));
            c.as_const_int().map(|v| v != 0)
        };
        let chosen = s.specialization_for(eval);
        assert_eq!(chosen.dims()[0].for_type, ForType::Vectorized);
        assert_eq!(chosen.dims()[1].for_type, ForType::Serial);

        // Undecidable conditions fall through to the default
        assert!(std::ptr::eq(s.specialization_for(|_| None), &s));
    }

    #[test]
    fn test_split_and_reorder() {
        let mut s = xy();
        s.split("x", "xo", "xi", 16).unwrap().reorder(&["xi", "y", "xo"]).unwrap();
        assert_eq!(dim_names(&s), vec!["xi", "y", "xo", OUTERMOST]);
        assert_eq!(s.splits()[0].factor.as_const_int(), Some(16));
        assert!(s.splits()[0].is_split());
        assert!(s.touched());
    }

    #[test]
    fn test_fuse_and_rename() {
        let mut s = xy();
        s.fuse("x", "y", "xy").unwrap().rename("xy", "t").unwrap();
        assert_eq!(dim_names(&s), vec!["t", OUTERMOST]);
        assert!(s.splits()[0].is_fuse());
        assert!(s.splits()[1].is_rename());
    }

    #[test]
    fn test_unknown_dim() {
        let mut s = xy();
        assert_eq!(s.parallel("z").map(|_| ()), Err(Error::UnknownDim { var: "z".to_string() }));
        assert!(s.reorder(&["x", "q"]).is_err());
        assert!(!s.touched());
    }

    #[test]
    fn test_bound_checks_dimension() {
        let mut s = xy();
        assert_eq!(s.bound("z", 0, 10).map(|_| ()), Err(Error::UnknownDim { var: "z".to_string() }));
        assert!(s.bounds().is_empty());
        assert!(!s.touched());

        s.bound("x", 0, 16).unwrap();
        assert!(s.touched());
        assert_eq!(s.bounds().len(), 1);
        assert_eq!(s.bounds()[0].extent.to_string(), "16");
    }

    #[test]
    fn test_reorder_storage() {
        let mut s = xy();
        s.reorder_storage(&["y", "x"]).unwrap();
        assert_eq!(s.storage_dims(), &["y".to_string(), "x".to_string()]);
    }

    #[test]
    fn test_raw_accessors_do_not_touch() {
        let mut s = xy();
        s.dims_mut()[0].for_type = ForType::Unrolled;
        *s.compute_level_mut() = LoopLevel::Root;
        assert!(!s.touched());

        s.store_at("f", "y");
        assert!(s.touched());
        assert!(s.store_level().matches("f", "y"));
    }

    #[test]
    fn test_update_dims() {
        let r = ReductionDomain::new(vec![crate::func::ReductionVariable::new("r", 0, 10)]);
        let s = Schedule::for_update(&["x".to_string()], Some(r.clone()));
        assert_eq!(dim_names(&s), vec!["r", "x", OUTERMOST]);
        assert!(!s.dims()[0].pure);
        assert!(s.reduction_domain().map_or(false, |d| d.same_as(&r)));
    }
}
