//! Program representation for evolved stack-language genomes.
//!
//! A genome is a flat-or-nested sequence of elements: literals, symbolic
//! instruction identifiers, and nested sub-programs that the interpreter
//! splices back into the pending-work stack. The representation is designed
//! to be:
//! - Variation-friendly: crossover and mutation operate on element positions
//! - Homoiconic: sub-programs are ordinary data until executed
//! - Compact: serde + bincode round-trips for storage and transmission

pub mod element;
pub mod generate;
pub mod program;
pub mod variation;

pub use element::{Element, InstructionId};
pub use generate::{random_program, Catalog, CatalogEntry};
pub use program::Program;
pub use variation::{
    two_point_crossover, uniform_addition, uniform_crossover, uniform_deletion, OperatorWeights,
    VariationConfig, VariationOp,
};
