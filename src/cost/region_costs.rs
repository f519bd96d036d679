use std::collections::{BTreeMap, BTreeSet};

use snafu::ensure;
use tracing::{debug, warn};

use crate::cost::config::CostConfig;
use crate::cost::estimate::{Cost, Estimate};
use crate::cost::expr_cost::ExprCost;
use crate::cost::interval::*;
use crate::error::*;
use crate::func::*;
use crate::ir::*;

/// Per-element cost of one stage, and the loads behind it.
#[derive(Debug, Clone, PartialEq)]
struct StageCost {
    cost: Cost,
    loads: BTreeMap<String, i64>
}

/// Estimates the cost of computing functions of a pipeline over regions.
///
/// Per-element stage costs are computed on first use for each pair of
/// function and inline set, and cached for the lifetime of the value.
/// Nothing here is thread safe: use one instance per thread.
#[derive(Debug)]
pub struct RegionCosts<'e> {
    env: &'e Env,
    config: CostConfig,
    func_cost: BTreeMap<(String, BTreeSet<String>), Vec<StageCost>>,
    inputs: BTreeMap<String, Type>
}

impl<'e> RegionCosts<'e> {
    pub fn new(env: &'e Env) -> RegionCosts<'e> {
        RegionCosts::with_config(env, CostConfig::default())
    }

    pub fn with_config(env: &'e Env, config: CostConfig) -> RegionCosts<'e> {
        let inputs = find_image_inputs(env);
        debug!(funcs = env.len(), inputs = ?inputs.keys().collect::<Vec<_>>(), "region costs");
        RegionCosts { env, config, func_cost: BTreeMap::new(), inputs }
    }

    pub fn config(&self) -> &CostConfig {
        &self.config
    }

    /// Input images read by the pipeline, with their element types.
    pub fn inputs(&self) -> &BTreeMap<String, Type> {
        &self.inputs
    }

    /// Inlines every call to a function in `inlines`, including calls that
    /// appear only after an earlier inlining, then simplifies.
    ///
    /// Does not terminate if `inlines` contains a cycle of calls.
    pub fn perform_inline(&self, e: &Expr, inlines: &BTreeSet<String>) -> Result<Expr> {
        let mut result = e.clone();
        loop {
            let calls = find_calls(&result);
            let pending: Vec<&String> = calls.funcs_called.iter().filter(|name| inlines.contains(*name)).collect();
            if pending.is_empty() {
                break;
            }
            for name in pending {
                result = inline_function(&result, lookup(self.env, name)?)?;
            }
        }
        Ok(simplify(&result))
    }

    fn stage_costs(&mut self, func: &str, inlines: &BTreeSet<String>) -> Result<&[StageCost]> {
        let key = (func.to_string(), inlines.clone());
        if !self.func_cost.contains_key(&key) {
            let f = lookup(self.env, func)?;
            let mut costs = vec![];
            for (stage, def) in f.stages().enumerate() {
                let mut visitor = ExprCost::new(&self.config);
                for value in def.values() {
                    visitor.visit_expr(&self.perform_inline(value, inlines)?);
                }
                if def.is_update() {
                    for arg in def.args() {
                        visitor.visit_expr(&self.perform_inline(arg, inlines)?);
                    }
                }
                debug!(func, stage, ?inlines, cost = %visitor.cost(), loads = ?visitor.detailed_loads, "computed stage cost");
                costs.push(StageCost { cost: visitor.cost(), loads: visitor.detailed_loads });
            }
            self.func_cost.insert(key.clone(), costs);
        }
        Ok(&self.func_cost[&key])
    }

    fn stage_cost(&mut self, func: &str, stage: usize, inlines: &BTreeSet<String>) -> Result<&StageCost> {
        let num_stages = lookup(self.env, func)?.num_stages();
        ensure!(stage < num_stages, StageOutOfRangeSnafu { name: func, stage, num_stages });
        Ok(&self.stage_costs(func, inlines)?[stage])
    }

    /// Cost of computing one element of each stage of `func`.
    pub fn get_func_cost(&mut self, func: &str, inlines: &BTreeSet<String>) -> Result<Vec<Cost>> {
        Ok(self.stage_costs(func, inlines)?.iter().map(|s| s.cost).collect())
    }

    /// The region a stage loops over, one interval per loop variable.
    fn stage_box(&self, func: &str, stage: usize, bounds: &DimBounds) -> Result<Region> {
        let f = lookup(self.env, func)?;
        f.stage_loop_vars(stage)?
            .into_iter()
            .map(|var| match bounds.get(&var) {
                Some(i) => Ok(i.clone()),
                None => MissingBoundSnafu { func, var }.fail()
            })
            .collect()
    }

    fn area(&self, func: &str, stage: usize, bounds: &DimBounds) -> Result<Estimate> {
        let stage_box = self.stage_box(func, stage, bounds)?;
        let area = box_area(&stage_box);
        if !area.is_known() {
            warn!(func, stage, region = %display_region(&stage_box), "region has symbolic extent");
        }
        Ok(area)
    }

    /// Cost of computing `stage` of `func` at every point of `bounds`, which
    /// must bound every loop variable of the stage.
    pub fn stage_region_cost(
        &mut self,
        func: &str,
        stage: usize,
        bounds: &DimBounds,
        inlines: &BTreeSet<String>
    ) -> Result<Cost> {
        let area = self.area(func, stage, bounds)?;
        Ok(self.stage_cost(func, stage, inlines)?.cost.scale(area))
    }

    /// As `stage_region_cost`, with the pure dimensions given as a box.
    pub fn stage_region_cost_box(
        &mut self,
        func: &str,
        stage: usize,
        region: &[Interval],
        inlines: &BTreeSet<String>
    ) -> Result<Cost> {
        let f = lookup(self.env, func)?;
        let bounds = get_stage_bounds(f, stage, &pure_bounds(f, region)?)?;
        self.stage_region_cost(func, stage, &bounds, inlines)
    }

    /// Cost of computing every stage of `func` over `region`.
    pub fn region_cost(&mut self, func: &str, region: &[Interval], inlines: &BTreeSet<String>) -> Result<Cost> {
        let f = lookup(self.env, func)?;
        let all_bounds = get_all_stage_bounds(f, &pure_bounds(f, region)?)?;
        let mut total = Cost::zero();
        for (stage, bounds) in all_bounds.iter().enumerate() {
            total += self.stage_region_cost(func, stage, bounds, inlines)?;
        }
        Ok(total)
    }

    /// Total cost of a group of functions. Functions in `inlines` are
    /// costed inside their consumers instead.
    pub fn region_cost_map(&mut self, regions: &BTreeMap<String, Region>, inlines: &BTreeSet<String>) -> Result<Cost> {
        let mut total = Cost::zero();
        for (func, region) in regions.iter().filter(|(f, _)| !inlines.contains(*f)) {
            total += self.region_cost(func, region, inlines)?;
        }
        Ok(total)
    }

    /// Elements loaded from each producer to compute one element of `stage`.
    pub fn stage_detailed_load_costs(
        &mut self,
        func: &str,
        stage: usize,
        inlines: &BTreeSet<String>
    ) -> Result<BTreeMap<String, Estimate>> {
        let loads = &self.stage_cost(func, stage, inlines)?.loads;
        Ok(loads.iter().map(|(name, count)| (name.clone(), Estimate::Known(*count))).collect())
    }

    /// Elements loaded from each producer to compute `stage` over `bounds`.
    pub fn stage_detailed_load_costs_bounded(
        &mut self,
        func: &str,
        stage: usize,
        bounds: &DimBounds,
        inlines: &BTreeSet<String>
    ) -> Result<BTreeMap<String, Estimate>> {
        let area = self.area(func, stage, bounds)?;
        let mut loads = self.stage_detailed_load_costs(func, stage, inlines)?;
        for count in loads.values_mut() {
            *count = *count * area;
        }
        Ok(loads)
    }

    /// Elements loaded from each producer to compute every stage of `func` over `region`.
    pub fn detailed_load_costs(
        &mut self,
        func: &str,
        region: &[Interval],
        inlines: &BTreeSet<String>
    ) -> Result<BTreeMap<String, Estimate>> {
        let f = lookup(self.env, func)?;
        let all_bounds = get_all_stage_bounds(f, &pure_bounds(f, region)?)?;
        let mut result = BTreeMap::new();
        for (stage, bounds) in all_bounds.iter().enumerate() {
            let partial = self.stage_detailed_load_costs_bounded(func, stage, bounds, inlines)?;
            combine_load_costs(&mut result, &partial);
        }
        Ok(result)
    }

    pub fn detailed_load_costs_map(
        &mut self,
        regions: &BTreeMap<String, Region>,
        inlines: &BTreeSet<String>
    ) -> Result<BTreeMap<String, Estimate>> {
        let mut result = BTreeMap::new();
        for (func, region) in regions.iter().filter(|(f, _)| !inlines.contains(*f)) {
            let partial = self.detailed_load_costs(func, region, inlines)?;
            combine_load_costs(&mut result, &partial);
        }
        Ok(result)
    }

    /// Bytes needed to store `func` over `region`.
    pub fn region_size(&self, func: &str, region: &[Interval]) -> Result<Estimate> {
        let f = lookup(self.env, func)?;
        check_dimensions(f, region)?;
        Ok(box_area(region) * Estimate::Known(f.bytes_per_element()))
    }

    /// Peak bytes live at once while realizing the functions of `regions`
    /// in realization order. A function is freed once every consumer of it
    /// in `regions` has been realized. Inlined functions take no storage.
    pub fn region_footprint(&self, regions: &BTreeMap<String, Region>, inlined: &BTreeSet<String>) -> Result<Estimate> {
        let mut num_consumers: BTreeMap<&str, usize> = regions.keys().map(|f| (f.as_str(), 0)).collect();
        for func in regions.keys() {
            for producer in find_direct_calls(lookup(self.env, func)?) {
                if let Some(count) = num_consumers.get_mut(producer.as_str()) {
                    *count += 1;
                }
            }
        }

        let mut func_sizes: BTreeMap<&str, i64> = BTreeMap::new();
        for (func, region) in regions {
            let size = if inlined.contains(func) { Estimate::Known(0) } else { self.region_size(func, region)? };
            match size.known() {
                Some(bytes) => func_sizes.insert(func.as_str(), bytes),
                None => return Ok(Estimate::Unknown)
            };
        }

        let outputs: Vec<&str> = num_consumers.iter().filter(|(_, n)| **n == 0).map(|(f, _)| *f).collect();
        let order = realization_order(&outputs, self.env)?;

        let mut working_set = 0;
        let mut current = 0;
        for func in order.iter().filter(|f| regions.contains_key(*f)) {
            current += func_sizes[func.as_str()];
            working_set = working_set.max(current);
            for producer in find_direct_calls(lookup(self.env, func)?) {
                if let Some(count) = num_consumers.get_mut(producer.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        current -= func_sizes[producer.as_str()];
                    }
                }
            }
        }
        Ok(Estimate::Known(working_set))
    }

    /// Bytes of `input` read over `region`.
    pub fn input_region_size(&self, input: &str, region: &[Interval]) -> Result<Estimate> {
        match self.inputs.get(input) {
            Some(type_) => Ok(box_area(region) * Estimate::Known(type_.bytes())),
            None => UnknownInputSnafu { name: input }.fail()
        }
    }

    pub fn input_region_size_map(&self, input_regions: &BTreeMap<String, Region>) -> Result<Estimate> {
        let mut total = Estimate::Known(0);
        for (input, region) in input_regions {
            total += self.input_region_size(input, region)?;
        }
        Ok(total)
    }

    /// Logs every cached stage cost.
    pub fn log_func_costs(&self) {
        for ((func, inlines), costs) in &self.func_cost {
            for (stage, stage_cost) in costs.iter().enumerate() {
                debug!(func = %func, stage, ?inlines, cost = %stage_cost.cost, loads = ?stage_cost.loads, "func cost");
            }
        }
    }
}

fn check_dimensions(f: &Function, region: &[Interval]) -> Result<()> {
    ensure!(
        region.len() == f.dimensions(),
        DimensionMismatchSnafu { func: f.name(), expected: f.dimensions(), actual: region.len() }
    );
    Ok(())
}

/// Bounds for the pure arguments of `f`, from a box over them.
pub fn pure_bounds(f: &Function, region: &[Interval]) -> Result<DimBounds> {
    check_dimensions(f, region)?;
    Ok(f.args().iter().cloned().zip(region.iter().cloned()).collect())
}

/// Bounds for every loop variable of `stage`: the pure bounds, plus the
/// full range of each reduction variable of an update.
pub fn get_stage_bounds(f: &Function, stage: usize, pure_bounds: &DimBounds) -> Result<DimBounds> {
    let mut bounds = pure_bounds.clone();
    if let Some(domain) = f.stage(stage)?.reduction_domain() {
        for rv in domain.domain() {
            bounds.insert(rv.var.clone(), Interval::from_extent(&rv.min, &rv.extent));
        }
    }
    Ok(bounds)
}

pub fn get_all_stage_bounds(f: &Function, pure_bounds: &DimBounds) -> Result<Vec<DimBounds>> {
    (0..f.num_stages()).map(|stage| get_stage_bounds(f, stage, pure_bounds)).collect()
}

/// Adds the counts in `partial` to `result`.
pub fn combine_load_costs(result: &mut BTreeMap<String, Estimate>, partial: &BTreeMap<String, Estimate>) {
    for (name, count) in partial {
        *result.entry(name.clone()).or_insert(Estimate::Known(0)) += *count;
    }
}

pub fn log_regions(regions: &BTreeMap<String, Region>) {
    for (func, region) in regions {
        debug!(func = %func, region = %display_region(region), "region");
    }
}
