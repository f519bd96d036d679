//! The intermediate representation: expressions, statements and the
//! passes over them that the rest of the crate relies on.

pub use self::dsl::*;
pub use self::expr::*;
pub use self::pretty_print::*;
pub use self::simplify::*;
pub use self::stmt::*;
pub use self::substitute::*;
pub use self::types::*;
pub use self::visitor::*;

#[macro_use]
mod dsl;
mod expr;
mod pretty_print;
mod simplify;
mod stmt;
mod substitute;
mod types;
mod visitor;
