//! Execution environment for evolved stack-language programs.
//!
//! This crate provides:
//! - The multi-stack `State` threaded through every instruction
//! - The instruction `Registry` with the uniform no-op-on-underflow contract
//! - The `Interpreter` that drains the exec stack, with an optional step
//!   budget so pathological self-replicating programs fail loudly instead
//!   of hanging

pub mod interpreter;
pub mod registry;
pub mod state;

pub use interpreter::{load_program, Interpreter, RunConfig};
pub use registry::{invoke, OpFn, Registry, EXEC_DUP, EXEC_IF};
pub use state::{ImageData, ImageValue, StackId, State, Value};
