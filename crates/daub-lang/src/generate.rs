//! Random program synthesis from an instruction catalog.

use crate::element::{Element, InstructionId};
use crate::program::Program;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One sampleable entry of the generation catalog.
///
/// Literal entries draw a fresh value every time they are sampled, so the
/// same catalog yields diverse constants across a population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CatalogEntry {
    /// A registered instruction, emitted by name.
    Instruction(InstructionId),
    /// A boolean literal, drawn uniformly.
    RandomBool,
    /// An integer literal, drawn uniformly from `lo..=hi`.
    RandomInt { lo: i64, hi: i64 },
}

/// The catalog of instructions and literal kinds that random synthesis and
/// the addition operator draw from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: CatalogEntry) {
        self.entries.push(entry);
    }

    /// Shorthand for adding an instruction entry.
    pub fn push_instruction(&mut self, name: impl Into<InstructionId>) {
        self.entries.push(CatalogEntry::Instruction(name.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Iterate over the instruction identifiers the catalog can emit.
    pub fn instruction_ids(&self) -> impl Iterator<Item = &InstructionId> {
        self.entries.iter().filter_map(|entry| match entry {
            CatalogEntry::Instruction(id) => Some(id),
            _ => None,
        })
    }

    /// Materialize one element from a uniformly drawn entry.
    ///
    /// The catalog must be non-empty; `Evolution::new` rejects empty
    /// catalogs before any sampling happens.
    pub fn sample(&self, rng: &mut impl Rng) -> Element {
        assert!(!self.entries.is_empty(), "catalog must not be empty");
        match &self.entries[rng.gen_range(0..self.entries.len())] {
            CatalogEntry::Instruction(id) => Element::Instruction(id.clone()),
            CatalogEntry::RandomBool => Element::Bool(rng.gen()),
            CatalogEntry::RandomInt { lo, hi } => Element::Int(rng.gen_range(*lo..=*hi)),
        }
    }
}

/// Generate a random program: a uniform length in `[1, max_initial_size]`,
/// then that many independent catalog samples.
///
/// No structural constraints are enforced; malformed programs are expected
/// and execute as underflow no-ops.
pub fn random_program(catalog: &Catalog, max_initial_size: usize, rng: &mut impl Rng) -> Program {
    let len = rng.gen_range(1..=max_initial_size.max(1));
    (0..len).map(|_| catalog.sample(rng)).collect()
}
