//! Genetic operators over programs.
//!
//! All four operators consume and produce plain programs; wrapping the
//! result into a fresh unevaluated individual is the breeding loop's job.
//! Crossover walks top-level element positions, so a nested block moves as
//! a single unit.

use crate::element::Element;
use crate::generate::Catalog;
use crate::program::Program;
use daub_core::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Per-element probabilities for the addition and deletion operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationConfig {
    /// Probability of inserting a fresh catalog sample after an element.
    pub insertion_rate: f64,
    /// Probability of deleting an element.
    pub deletion_rate: f64,
}

impl Default for VariationConfig {
    fn default() -> Self {
        Self {
            insertion_rate: 0.05,
            deletion_rate: 0.05,
        }
    }
}

/// The operator drawn for one breeding event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariationOp {
    UniformCrossover,
    TwoPointCrossover,
    UniformAddition,
    UniformDeletion,
}

/// Operator dispatch probabilities: four non-overlapping ranges that must
/// sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorWeights {
    pub uniform_crossover: f64,
    pub two_point_crossover: f64,
    pub uniform_addition: f64,
    pub uniform_deletion: f64,
}

impl Default for OperatorWeights {
    fn default() -> Self {
        Self {
            uniform_crossover: 0.25,
            two_point_crossover: 0.25,
            uniform_addition: 0.25,
            uniform_deletion: 0.25,
        }
    }
}

impl OperatorWeights {
    /// Check that every weight is a probability and that they partition 1.0.
    pub fn validate(&self) -> Result<()> {
        let weights = [
            self.uniform_crossover,
            self.two_point_crossover,
            self.uniform_addition,
            self.uniform_deletion,
        ];
        if weights.iter().any(|w| !(0.0..=1.0).contains(w)) {
            return Err(Error::Validation(
                "operator weights must lie in [0, 1]".to_string(),
            ));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(Error::Validation(format!(
                "operator weights must sum to 1.0, got {}",
                sum
            )));
        }
        Ok(())
    }

    /// Draw one operator from the cumulative ranges.
    pub fn pick(&self, rng: &mut impl Rng) -> VariationOp {
        let draw = rng.gen::<f64>();
        let mut boundary = self.uniform_crossover;
        if draw < boundary {
            return VariationOp::UniformCrossover;
        }
        boundary += self.two_point_crossover;
        if draw < boundary {
            return VariationOp::TwoPointCrossover;
        }
        boundary += self.uniform_addition;
        if draw < boundary {
            return VariationOp::UniformAddition;
        }
        VariationOp::UniformDeletion
    }
}

/// Position-by-position crossover: at each aligned position the child takes
/// either parent's element with equal probability; once the shorter parent
/// is exhausted, each remaining element of the longer one is kept
/// independently with probability 0.5.
pub fn uniform_crossover(a: &Program, b: &Program, rng: &mut impl Rng) -> Program {
    let common = a.len().min(b.len());
    let mut elements = Vec::with_capacity(a.len().max(b.len()));

    for i in 0..common {
        let el = if rng.gen_bool(0.5) {
            &a.elements()[i]
        } else {
            &b.elements()[i]
        };
        elements.push(el.clone());
    }

    let tail = if a.len() > common {
        &a.elements()[common..]
    } else {
        &b.elements()[common..]
    };
    for el in tail {
        if rng.gen_bool(0.5) {
            elements.push(el.clone());
        }
    }

    Program::from_elements(elements)
}

/// Two sorted cut positions in `[0, len)`; both collapse to 0 when the
/// program has fewer than two elements.
fn cut_points(len: usize, rng: &mut impl Rng) -> (usize, usize) {
    if len <= 1 {
        return (0, 0);
    }
    let first = rng.gen_range(0..len);
    let mut second = rng.gen_range(0..len);
    while second == first {
        second = rng.gen_range(0..len);
    }
    (first.min(second), first.max(second))
}

/// Two-point crossover: the child is B's prefix up to its first cut, A's
/// segment between its two cuts, and B's suffix from its second cut. Each
/// parent draws its own cut pair.
pub fn two_point_crossover(a: &Program, b: &Program, rng: &mut impl Rng) -> Program {
    let (a1, a2) = cut_points(a.len(), rng);
    let (b1, b2) = cut_points(b.len(), rng);

    let mut elements = Vec::with_capacity(b1 + (a2 - a1) + (b.len() - b2));
    elements.extend_from_slice(&b.elements()[..b1]);
    elements.extend_from_slice(&a.elements()[a1..a2]);
    elements.extend_from_slice(&b.elements()[b2..]);

    Program::from_elements(elements)
}

/// After each element, insert a fresh catalog sample with the configured
/// insertion rate; one more may be appended at the end with the same rate.
pub fn uniform_addition(
    program: &Program,
    catalog: &Catalog,
    config: &VariationConfig,
    rng: &mut impl Rng,
) -> Program {
    let mut elements: Vec<Element> = Vec::with_capacity(program.len() + 1);
    for el in program.iter() {
        elements.push(el.clone());
        if rng.gen_bool(config.insertion_rate) {
            elements.push(catalog.sample(rng));
        }
    }
    if rng.gen_bool(config.insertion_rate) {
        elements.push(catalog.sample(rng));
    }
    Program::from_elements(elements)
}

/// Drop each element independently with the configured deletion rate.
pub fn uniform_deletion(program: &Program, config: &VariationConfig, rng: &mut impl Rng) -> Program {
    program
        .iter()
        .filter(|_| !rng.gen_bool(config.deletion_rate))
        .cloned()
        .collect()
}
