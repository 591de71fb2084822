//! Program elements: literals, instruction identifiers, nested blocks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbolic name of an instruction, resolved by the runtime registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstructionId(pub String);

impl InstructionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InstructionId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for InstructionId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for InstructionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One element of a program.
///
/// A `Block` is a sub-program: ordinary data until the interpreter pops it
/// from the pending-work stack and splices its contents back in. This is the
/// sole control-flow primitive of the language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element {
    Bool(bool),
    Int(i64),
    Instruction(InstructionId),
    Block(Vec<Element>),
}

impl Element {
    /// Shorthand for an instruction element.
    pub fn instruction(name: impl Into<InstructionId>) -> Self {
        Element::Instruction(name.into())
    }

    /// Number of elements in this subtree, counting the element itself.
    pub fn size(&self) -> usize {
        match self {
            Element::Block(elements) => 1 + elements.iter().map(Element::size).sum::<usize>(),
            _ => 1,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Bool(b) => write!(f, "{}", b),
            Element::Int(i) => write!(f, "{}", i),
            Element::Instruction(id) => write!(f, "{}", id),
            Element::Block(elements) => {
                write!(f, "(")?;
                for (i, el) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", el)?;
                }
                write!(f, ")")
            }
        }
    }
}
