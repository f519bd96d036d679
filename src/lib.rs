//! Core of a toy Halide: an IR of reference-counted expression and
//! statement nodes, pipeline functions with their schedules, and a cost
//! model for regions of those functions.
// TODO: lowering of Function + Schedule into a loop nest Stmt

pub mod ptr;
pub mod error;
#[macro_use]
pub mod ir;
pub mod func;
pub mod cost;

pub use crate::error::{Error, Result};
pub use crate::ptr::*;
