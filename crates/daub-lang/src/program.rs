//! Program structure for candidate genomes.

use crate::element::Element;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered, possibly nested, sequence of elements.
///
/// Programs are immutable once constructed; the genetic operators always
/// build new programs rather than editing in place.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    elements: Vec<Element>,
}

impl Program {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    pub fn from_elements(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    /// Number of top-level elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    /// Total element count including nested block contents.
    pub fn total_elements(&self) -> usize {
        self.elements.iter().map(Element::size).sum()
    }

    /// Serialize the program to bytes.
    pub fn to_bytes(&self) -> daub_core::Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize a program from bytes.
    pub fn from_bytes(bytes: &[u8]) -> daub_core::Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, el) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", el)?;
        }
        write!(f, "]")
    }
}

impl FromIterator<Element> for Program {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}
