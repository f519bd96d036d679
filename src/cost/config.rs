/// Unit costs used when costing expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostConfig {
    /// Arithmetic units per operator, comparison, select or cast.
    pub arith_op: i64,
    /// Memory units per element loaded from a function or input.
    pub load: i64,
    /// Arithmetic units per extern or intrinsic call.
    pub extern_call: i64
}

impl Default for CostConfig {
    fn default() -> Self {
        CostConfig { arith_op: 1, load: 1, extern_call: 1 }
    }
}

impl CostConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `PRISM_COST_ARITH_OP` - Cost of an arithmetic operation (default: 1)
    /// * `PRISM_COST_LOAD` - Cost of a load (default: 1)
    /// * `PRISM_COST_EXTERN_CALL` - Cost of an extern call (default: 1)
    pub fn from_env() -> Self {
        let defaults = CostConfig::default();
        let arith_op = std::env::var("PRISM_COST_ARITH_OP").ok().and_then(|s| s.parse().ok()).unwrap_or(defaults.arith_op);
        let load = std::env::var("PRISM_COST_LOAD").ok().and_then(|s| s.parse().ok()).unwrap_or(defaults.load);
        let extern_call =
            std::env::var("PRISM_COST_EXTERN_CALL").ok().and_then(|s| s.parse().ok()).unwrap_or(defaults.extern_call);

        CostConfig { arith_op, load, extern_call }
    }
}
