//! Core types and utilities shared across the Daub program-evolution workspace.

pub mod error;
pub mod fitness;
pub mod types;

pub use error::{Error, Result};
pub use fitness::*;
pub use types::*;
