//! Pipeline functions, their definitions and schedules, and the analyses
//! that relate functions to one another.

pub use self::call_graph::*;
pub use self::function::*;
pub use self::inline::*;
pub use self::reduction::*;
pub use self::schedule::*;

mod call_graph;
mod function;
mod inline;
mod reduction;
mod schedule;
