//! Cost estimates for computing pipeline functions over regions, used to
//! compare candidate schedules without generating code.

pub use self::config::*;
pub use self::estimate::*;
pub use self::expr_cost::*;
pub use self::interval::*;
pub use self::region_costs::*;

mod config;
mod estimate;
mod expr_cost;
mod interval;
mod region_costs;
