pub mod types;
pub mod parser;
pub mod global;
pub mod input;
pub mod job;
pub mod spawn;
pub mod eval;

pub use crate::eval::{ExecError, Executor};
pub use crate::global::Config;
pub use crate::job::{Job, StageExit};
pub use crate::types::{Pipeline, Stage};
