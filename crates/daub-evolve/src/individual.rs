//! Candidate programs paired with their measured fitness.

use daub_core::{fitness, IndividualId};
use daub_lang::Program;
use serde::{Deserialize, Serialize};

/// A candidate program plus its per-case penalties.
///
/// Freshly created individuals are unevaluated: empty `errors`, zero
/// `total_error`. They live for exactly one generation; breeding produces
/// new individuals and the old population is dropped wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub id: IndividualId,
    pub program: Program,
    pub errors: Vec<f64>,
    pub total_error: f64,
}

impl Individual {
    pub fn new(program: Program) -> Self {
        Self {
            id: IndividualId::new(),
            program,
            errors: Vec::new(),
            total_error: 0.0,
        }
    }

    /// Attach evaluation results, replacing any previous ones.
    pub fn with_errors(mut self, errors: Vec<f64>) -> Self {
        self.total_error = fitness::total_error(&errors);
        self.errors = errors;
        self
    }

    pub fn is_evaluated(&self) -> bool {
        !self.errors.is_empty()
    }

    /// A solution scored zero on every case; an unevaluated individual
    /// never counts, even though its total is (vacuously) zero.
    pub fn is_solution(&self) -> bool {
        self.is_evaluated() && self.total_error == 0.0
    }
}
