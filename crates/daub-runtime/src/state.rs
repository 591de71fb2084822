//! The multi-stack machine state threaded through every instruction.

use daub_lang::Element;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque pixel payload carried on the image stack.
///
/// Concrete pixel types live in the image collaborator crate; the core only
/// moves handles between stacks. `as_any` gives the collaborator its
/// concrete type back.
pub trait ImageData: fmt::Debug + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Shared handle to an image payload.
///
/// Cloning is cheap (shared buffer). Instructions that edit pixels in place
/// must confine the edit to a value they pop and push back; a collaborator
/// that wants to keep a borrowed input pristine copies it first.
#[derive(Clone, Debug)]
pub struct ImageValue(Arc<RwLock<Box<dyn ImageData>>>);

impl ImageValue {
    pub fn new(data: impl ImageData) -> Self {
        Self(Arc::new(RwLock::new(Box::new(data))))
    }

    /// Read access to the payload.
    pub fn with<R>(&self, f: impl FnOnce(&dyn ImageData) -> R) -> R {
        f(&**self.0.read())
    }

    /// Write access to the payload, for in-place pixel edits.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut dyn ImageData) -> R) -> R {
        f(&mut **self.0.write())
    }

    /// Whether two handles share the same underlying buffer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ImageValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// Names of the four LIFO stacks.
///
/// The `input` map is not a stack: it is append-only, keyed by synthetic
/// contiguous names, and accessed through its own methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackId {
    Exec,
    Integer,
    Bool,
    Image,
}

impl StackId {
    pub const ALL: [StackId; 4] = [StackId::Exec, StackId::Integer, StackId::Bool, StackId::Image];

    fn index(self) -> usize {
        match self {
            StackId::Exec => 0,
            StackId::Integer => 1,
            StackId::Bool => 2,
            StackId::Image => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StackId::Exec => "exec",
            StackId::Integer => "integer",
            StackId::Bool => "bool",
            StackId::Image => "image",
        }
    }
}

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A value on one of the stacks.
///
/// `Exec` wraps a pending program element; only the exec stack carries it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Image(ImageValue),
    Exec(Element),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageValue> {
        match self {
            Value::Image(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Value::Exec(el) => Some(el),
            _ => None,
        }
    }
}

/// The machine state: four LIFO stacks (top = last pushed) plus the
/// append-only input map with synthetic keys `in1, in2, …`.
#[derive(Debug, Clone, Default)]
pub struct State {
    stacks: [Vec<Value>; 4],
    input: Vec<Value>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a value, making it the new top.
    pub fn push(&mut self, stack: StackId, value: Value) {
        self.stacks[stack.index()].push(value);
    }

    /// Remove and return the top value; `None` (and no mutation) when the
    /// stack is empty. Underflow is never an error.
    pub fn pop(&mut self, stack: StackId) -> Option<Value> {
        self.stacks[stack.index()].pop()
    }

    /// The top value, or `None` as the no-value sentinel.
    pub fn peek(&self, stack: StackId) -> Option<&Value> {
        self.stacks[stack.index()].last()
    }

    pub fn len(&self, stack: StackId) -> usize {
        self.stacks[stack.index()].len()
    }

    pub fn is_empty(&self, stack: StackId) -> bool {
        self.stacks[stack.index()].is_empty()
    }

    /// Remove the value `depth` positions below the top (depth 0 = top).
    pub fn remove_at_depth(&mut self, stack: StackId, depth: usize) -> Option<Value> {
        let entries = &mut self.stacks[stack.index()];
        if depth >= entries.len() {
            return None;
        }
        let index = entries.len() - 1 - depth;
        Some(entries.remove(index))
    }

    /// Pop one value from each requested stack, in request order.
    ///
    /// All-or-nothing: succeeds only if every stack holds enough values,
    /// counting repetitions when the same stack is requested twice; on
    /// shortfall returns `None` and mutates nothing. Every instruction
    /// relies on this to avoid partial side effects.
    pub fn take_args(&mut self, stacks: &[StackId]) -> Option<Vec<Value>> {
        let mut needed = [0usize; 4];
        for stack in stacks {
            needed[stack.index()] += 1;
        }
        for (index, need) in needed.iter().enumerate() {
            if self.stacks[index].len() < *need {
                return None;
            }
        }
        Some(
            stacks
                .iter()
                .map(|stack| {
                    self.stacks[stack.index()]
                        .pop()
                        .expect("stack length checked above")
                })
                .collect(),
        )
    }

    pub fn push_bool(&mut self, value: bool) {
        self.push(StackId::Bool, Value::Bool(value));
    }

    pub fn push_int(&mut self, value: i64) {
        self.push(StackId::Integer, Value::Int(value));
    }

    pub fn push_image(&mut self, value: ImageValue) {
        self.push(StackId::Image, Value::Image(value));
    }

    /// Append a value to the input map at the next synthetic key, and
    /// return that key.
    pub fn push_input(&mut self, value: Value) -> String {
        self.input.push(value);
        Self::input_key(self.input.len() - 1)
    }

    /// Look up an input by its synthetic name (`in1`, `in2`, …).
    pub fn input(&self, name: &str) -> Option<&Value> {
        let ordinal: usize = name.strip_prefix("in")?.parse().ok()?;
        if ordinal == 0 {
            return None;
        }
        self.input.get(ordinal - 1)
    }

    pub fn input_len(&self) -> usize {
        self.input.len()
    }

    /// The synthetic key for a zero-based input index.
    pub fn input_key(index: usize) -> String {
        format!("in{}", index + 1)
    }
}
