//! Generational evolutionary search over stack-language programs.
//!
//! The engine wires together random synthesis, parent selection, and the
//! genetic operators into an externally steppable state machine. Fitness
//! scoring and per-generation reporting stay behind the `Evaluator` and
//! `Reporter` contracts, so the image-specific collaborators plug in
//! without the engine knowing about pixels.

pub mod evolution;
pub mod individual;
pub mod selection;

pub use evolution::{Evaluator, Evolution, EvolutionConfig, LogReporter, Reporter, Status};
pub use individual::Individual;
pub use selection::{lexicase, select, tournament, SelectionConfig};
