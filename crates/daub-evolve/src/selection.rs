//! Parent selection over an evaluated candidate pool.
//!
//! Both algorithms take the pool as a slice of references so the breeding
//! loop can hand in the full population for the first parent and the same
//! population minus that exact parent for the second. The pool must be
//! non-empty and fully evaluated with a uniform case count.

use crate::individual::Individual;
use daub_core::fitness::case_std_dev;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Which parent-selection algorithm the engine runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectionConfig {
    /// `size` uniform samples with replacement; minimum total error wins.
    Tournament { size: usize },
    /// Epsilon-lexicase: case-by-case filtering in a random order, with a
    /// per-case tolerance of `epsilon_factor` times the pool's standard
    /// deviation on that case.
    Lexicase { epsilon_factor: f64 },
}

impl Default for SelectionConfig {
    fn default() -> Self {
        SelectionConfig::Lexicase {
            epsilon_factor: 1.0,
        }
    }
}

/// Select one parent from the pool with the configured algorithm.
pub fn select<'a>(
    candidates: &[&'a Individual],
    config: &SelectionConfig,
    rng: &mut impl Rng,
) -> &'a Individual {
    match config {
        SelectionConfig::Tournament { size } => tournament(candidates, *size, rng),
        SelectionConfig::Lexicase { epsilon_factor } => {
            lexicase(candidates, *epsilon_factor, rng)
        }
    }
}

/// Minimum total error, ties broken by encounter order (strict `<` keeps
/// the earlier individual).
fn best_of<'a>(sampled: impl IntoIterator<Item = &'a Individual>) -> Option<&'a Individual> {
    let mut best: Option<&Individual> = None;
    for candidate in sampled {
        match best {
            Some(current) if candidate.total_error >= current.total_error => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Tournament selection: `size` uniform samples with replacement, best
/// total error wins.
pub fn tournament<'a>(
    candidates: &[&'a Individual],
    size: usize,
    rng: &mut impl Rng,
) -> &'a Individual {
    assert!(!candidates.is_empty(), "selection pool must not be empty");
    let sampled = (0..size.max(1)).map(|_| candidates[rng.gen_range(0..candidates.len())]);
    best_of(sampled).expect("tournament draws at least one sample")
}

/// Epsilon-lexicase selection.
///
/// One random permutation of case indices is drawn per call and applied to
/// every candidate. Each case keeps only the candidates within
/// `min + epsilon` of the best on that case, where epsilon derives from the
/// original pool's standard deviation on the case. A single survivor is
/// returned immediately; an emptied pool falls back to a uniform pick from
/// the original pool; survivors past the last case are picked uniformly.
pub fn lexicase<'a>(
    candidates: &[&'a Individual],
    epsilon_factor: f64,
    rng: &mut impl Rng,
) -> &'a Individual {
    assert!(!candidates.is_empty(), "selection pool must not be empty");

    let case_count = candidates[0].errors.len();
    let mut order: Vec<usize> = (0..case_count).collect();
    order.shuffle(rng);

    let mut survivors: Vec<&Individual> = candidates.to_vec();
    for case in order {
        let column: Vec<f64> = candidates.iter().map(|ind| ind.errors[case]).collect();
        let epsilon = epsilon_factor * case_std_dev(&column);
        let best = survivors
            .iter()
            .map(|ind| ind.errors[case])
            .fold(f64::INFINITY, f64::min);

        survivors.retain(|ind| ind.errors[case] <= best + epsilon);

        match survivors.len() {
            1 => return survivors[0],
            0 => return candidates[rng.gen_range(0..candidates.len())],
            _ => {}
        }
    }

    survivors[rng.gen_range(0..survivors.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use daub_lang::{Element, Program};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn individual(errors: Vec<f64>) -> Individual {
        Individual::new(Program::from_elements(vec![Element::Int(0)])).with_errors(errors)
    }

    fn pool(individuals: &[Individual]) -> Vec<&Individual> {
        individuals.iter().collect()
    }

    #[test]
    fn test_best_of_breaks_ties_by_encounter_order() {
        let individuals = vec![
            individual(vec![5.0]),
            individual(vec![2.0]),
            individual(vec![8.0]),
            individual(vec![2.0]),
        ];
        let best = best_of(individuals.iter()).unwrap();
        assert_eq!(best.total_error, 2.0);
        assert_eq!(best.id, individuals[1].id);
    }

    #[test]
    fn test_tournament_selects_minimum_total_error() {
        let individuals = vec![
            individual(vec![5.0]),
            individual(vec![2.0]),
            individual(vec![8.0]),
            individual(vec![2.0]),
        ];
        let candidates = pool(&individuals);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        // 64 samples with replacement make missing every minimum a
        // (1/2)^64 event; across 20 rounds the winner is always a 2.
        for _ in 0..20 {
            let winner = tournament(&candidates, 64, &mut rng);
            assert_eq!(winner.total_error, 2.0);
        }
    }

    #[test]
    fn test_tournament_favors_best_statistically() {
        let individuals = vec![
            individual(vec![5.0]),
            individual(vec![2.0]),
            individual(vec![8.0]),
        ];
        let candidates = pool(&individuals);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let mut best_count = 0;
        for _ in 0..100 {
            if tournament(&candidates, 3, &mut rng).total_error == 2.0 {
                best_count += 1;
            }
        }
        assert!(best_count >= 50, "best won only {}/100", best_count);
    }

    #[test]
    fn test_lexicase_reduces_to_outlier() {
        let individuals = vec![
            individual(vec![5.0, 5.0]),
            individual(vec![5.0, 5.0]),
            individual(vec![0.0, 0.0]),
        ];
        let candidates = pool(&individuals);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        // Whatever case comes first, only the outlier survives it.
        for _ in 0..20 {
            let winner = lexicase(&candidates, 1.0, &mut rng);
            assert_eq!(winner.id, individuals[2].id);
        }
    }

    #[test]
    fn test_lexicase_epsilon_keeps_near_best() {
        let individuals = vec![
            individual(vec![0.0]),
            individual(vec![1.0]),
            individual(vec![10.0]),
        ];
        let candidates = pool(&individuals);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        // std dev of [0, 1, 10] is ~4.5, so 1.0 survives the filter and
        // 10.0 never does.
        for _ in 0..50 {
            let winner = lexicase(&candidates, 1.0, &mut rng);
            assert!(winner.total_error <= 1.0);
        }
    }

    #[test]
    fn test_lexicase_zero_cases_picks_uniformly() {
        let individuals = vec![individual(vec![]), individual(vec![])];
        let candidates = pool(&individuals);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        // No cases to filter on: still returns some member of the pool.
        let winner = lexicase(&candidates, 1.0, &mut rng);
        assert!(individuals.iter().any(|ind| ind.id == winner.id));
    }

    #[test]
    fn test_select_dispatches_on_config() {
        let individuals = vec![individual(vec![3.0]), individual(vec![1.0])];
        let candidates = pool(&individuals);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let winner = select(
            &candidates,
            &SelectionConfig::Tournament { size: 32 },
            &mut rng,
        );
        assert_eq!(winner.total_error, 1.0);

        let winner = select(
            &candidates,
            &SelectionConfig::Lexicase {
                epsilon_factor: 0.0,
            },
            &mut rng,
        );
        assert_eq!(winner.total_error, 1.0);
    }
}
