pub mod executor;
pub mod parser;

pub use executor::{Executor, QueryOutcome, ResultKind};
pub use parser::{Command, CompareOp, Condition, Direction, Parser, SetOperator};
