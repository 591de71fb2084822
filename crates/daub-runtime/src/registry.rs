//! The instruction registry: named operations over the machine state.
//!
//! Every instruction is a `State -> State` mutation that must be a no-op
//! when its argument stacks lack sufficient elements, and otherwise pops
//! exactly its declared arguments and pushes exactly one result. The
//! `invoke` combinator builds that shape; only the two control intrinsics
//! (`exec_dup`, `exec_if`) reach into the exec stack directly.

use crate::state::{StackId, State, Value};
use daub_core::{Error, Result};
use daub_lang::{Element, InstructionId, Program};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Identifier of the exec-duplication intrinsic.
pub const EXEC_DUP: &str = "exec_dup";
/// Identifier of the conditional intrinsic.
pub const EXEC_IF: &str = "exec_if";

/// The uniform instruction contract.
pub type OpFn = Arc<dyn Fn(&mut State) + Send + Sync>;

/// Pop one argument from each stack in `args` (atomically), apply `f` to
/// the values in popped order, and push the single result onto `ret`.
/// Insufficient arguments leave the state untouched.
pub fn invoke<F>(state: &mut State, args: &[StackId], ret: StackId, f: F)
where
    F: Fn(Vec<Value>) -> Value,
{
    if let Some(values) = state.take_args(args) {
        let result = f(values);
        state.push(ret, result);
    }
}

/// Catalog of named operations, resolved once at startup.
#[derive(Clone, Default)]
pub struct Registry {
    ops: HashMap<InstructionId, OpFn>,
}

impl Registry {
    /// An empty registry, without even the control intrinsics.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the two control intrinsics.
    pub fn with_intrinsics() -> Self {
        let mut registry = Self::new();
        registry.register(EXEC_DUP, Arc::new(exec_dup));
        registry.register(EXEC_IF, Arc::new(exec_if));
        registry
    }

    pub fn register(&mut self, name: impl Into<InstructionId>, op: OpFn) {
        self.ops.insert(name.into(), op);
    }

    /// Register an instruction built from the `invoke` combinator:
    /// declared argument stacks, a return stack, and a value transform.
    pub fn register_fn<F>(
        &mut self,
        name: impl Into<InstructionId>,
        args: Vec<StackId>,
        ret: StackId,
        f: F,
    ) where
        F: Fn(Vec<Value>) -> Value + Send + Sync + 'static,
    {
        self.register(
            name,
            Arc::new(move |state: &mut State| invoke(state, &args, ret, &f)),
        );
    }

    pub fn resolve(&self, id: &InstructionId) -> Option<&OpFn> {
        self.ops.get(id)
    }

    pub fn contains(&self, id: &InstructionId) -> bool {
        self.ops.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &InstructionId> {
        self.ops.keys()
    }

    /// Check that every instruction identifier in the program, including
    /// inside nested blocks, resolves here. Reports the first offender so
    /// malformed catalogs fail before a run instead of mid-search.
    pub fn validate_program(&self, program: &Program) -> Result<()> {
        for element in program.iter() {
            self.validate_element(element)?;
        }
        Ok(())
    }

    fn validate_element(&self, element: &Element) -> Result<()> {
        match element {
            Element::Instruction(id) if !self.contains(id) => Err(Error::Validation(format!(
                "unregistered instruction '{}'",
                id
            ))),
            Element::Block(elements) => {
                for el in elements {
                    self.validate_element(el)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.ops.keys().map(|id| id.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("Registry").field("ops", &names).finish()
    }
}

/// Duplicate the top pending exec element in place.
///
/// No-op when the exec stack is empty, or when the top element is the
/// `exec_dup` identifier itself (which would otherwise self-duplicate
/// forever when two `exec_dup`s run back to back).
fn exec_dup(state: &mut State) {
    let duplicate = match state.peek(StackId::Exec) {
        None => return,
        Some(Value::Exec(Element::Instruction(id))) if id.as_str() == EXEC_DUP => return,
        Some(top) => top.clone(),
    };
    state.push(StackId::Exec, duplicate);
}

/// Conditional over the next two pending exec elements.
///
/// Requires a boolean and at least two pending elements; otherwise no-op.
/// True keeps the first pending element as the continuation and discards
/// the second; false discards the first and keeps the rest.
fn exec_if(state: &mut State) {
    if state.is_empty(StackId::Bool) || state.len(StackId::Exec) < 2 {
        return;
    }
    let condition = match state.pop(StackId::Bool) {
        Some(Value::Bool(b)) => b,
        _ => return,
    };
    if condition {
        state.remove_at_depth(StackId::Exec, 1);
    } else {
        state.pop(StackId::Exec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub_registry() -> Registry {
        let mut registry = Registry::with_intrinsics();
        registry.register_fn(
            "int_sub",
            vec![StackId::Integer, StackId::Integer],
            StackId::Integer,
            |values| {
                let a = values[0].as_int().unwrap_or(0);
                let b = values[1].as_int().unwrap_or(0);
                Value::Int(a - b)
            },
        );
        registry
    }

    fn apply(registry: &Registry, name: &str, state: &mut State) {
        let op = registry.resolve(&name.into()).expect("registered");
        op(state);
    }

    #[test]
    fn test_invoke_pops_in_order_and_pushes_result() {
        let registry = sub_registry();
        let mut state = State::new();
        state.push_int(2);
        state.push_int(3);

        // 3 is popped first, so the transform sees [3, 2].
        apply(&registry, "int_sub", &mut state);
        assert_eq!(state.pop(StackId::Integer), Some(Value::Int(1)));
        assert_eq!(state.len(StackId::Integer), 0);
    }

    #[test]
    fn test_invoke_insufficient_args_is_noop() {
        let registry = sub_registry();
        let mut state = State::new();
        state.push_int(2);

        apply(&registry, "int_sub", &mut state);
        assert_eq!(state.len(StackId::Integer), 1);
        assert_eq!(state.peek(StackId::Integer), Some(&Value::Int(2)));
    }

    #[test]
    fn test_exec_dup_duplicates_top() {
        let registry = Registry::with_intrinsics();
        let mut state = State::new();
        state.push(StackId::Exec, Value::Exec(Element::Int(3)));

        apply(&registry, EXEC_DUP, &mut state);
        assert_eq!(state.len(StackId::Exec), 2);
        assert_eq!(state.peek(StackId::Exec), Some(&Value::Exec(Element::Int(3))));
    }

    #[test]
    fn test_exec_dup_empty_is_noop() {
        let registry = Registry::with_intrinsics();
        let mut state = State::new();
        apply(&registry, EXEC_DUP, &mut state);
        assert_eq!(state.len(StackId::Exec), 0);
    }

    #[test]
    fn test_exec_dup_guard_against_self() {
        let registry = Registry::with_intrinsics();
        let mut state = State::new();
        state.push(StackId::Exec, Value::Exec(Element::instruction(EXEC_DUP)));

        apply(&registry, EXEC_DUP, &mut state);
        assert_eq!(state.len(StackId::Exec), 1);
    }

    #[test]
    fn test_exec_if_true_discards_second() {
        let registry = Registry::with_intrinsics();
        let mut state = State::new();
        state.push(StackId::Exec, Value::Exec(Element::Int(2)));
        state.push(StackId::Exec, Value::Exec(Element::Int(1)));
        state.push_bool(true);

        apply(&registry, EXEC_IF, &mut state);
        assert_eq!(state.len(StackId::Bool), 0);
        assert_eq!(state.len(StackId::Exec), 1);
        assert_eq!(state.peek(StackId::Exec), Some(&Value::Exec(Element::Int(1))));
    }

    #[test]
    fn test_exec_if_false_discards_first() {
        let registry = Registry::with_intrinsics();
        let mut state = State::new();
        state.push(StackId::Exec, Value::Exec(Element::Int(2)));
        state.push(StackId::Exec, Value::Exec(Element::Int(1)));
        state.push_bool(false);

        apply(&registry, EXEC_IF, &mut state);
        assert_eq!(state.len(StackId::Exec), 1);
        assert_eq!(state.peek(StackId::Exec), Some(&Value::Exec(Element::Int(2))));
    }

    #[test]
    fn test_exec_if_preconditions() {
        let registry = Registry::with_intrinsics();

        // Missing boolean: untouched.
        let mut state = State::new();
        state.push(StackId::Exec, Value::Exec(Element::Int(2)));
        state.push(StackId::Exec, Value::Exec(Element::Int(1)));
        apply(&registry, EXEC_IF, &mut state);
        assert_eq!(state.len(StackId::Exec), 2);

        // Only one pending element: the boolean stays too.
        let mut state = State::new();
        state.push(StackId::Exec, Value::Exec(Element::Int(1)));
        state.push_bool(true);
        apply(&registry, EXEC_IF, &mut state);
        assert_eq!(state.len(StackId::Exec), 1);
        assert_eq!(state.len(StackId::Bool), 1);
    }

    #[test]
    fn test_image_op_confines_side_effects() {
        use crate::state::{ImageData, ImageValue};
        use std::any::Any;

        #[derive(Debug)]
        struct Canvas {
            pixels: Vec<u8>,
        }

        impl ImageData for Canvas {
            fn as_any(&self) -> &dyn Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }

        // An image collaborator op: pop one image, edit its pixels in
        // place, push the same handle back.
        let mut registry = Registry::with_intrinsics();
        registry.register_fn(
            "image_invert",
            vec![StackId::Image],
            StackId::Image,
            |values| {
                let image = values[0].as_image().unwrap().clone();
                image.with_mut(|data| {
                    let canvas = data.as_any_mut().downcast_mut::<Canvas>().unwrap();
                    for px in &mut canvas.pixels {
                        *px = 255 - *px;
                    }
                });
                Value::Image(image)
            },
        );

        let mut state = State::new();
        state.push_image(ImageValue::new(Canvas {
            pixels: vec![0, 128, 255],
        }));

        apply(&registry, "image_invert", &mut state);
        assert_eq!(state.len(StackId::Image), 1);

        let top = state.peek(StackId::Image).unwrap().as_image().unwrap();
        top.with(|data| {
            let canvas = data.as_any().downcast_ref::<Canvas>().unwrap();
            assert_eq!(canvas.pixels, vec![255, 127, 0]);
        });

        // Underflow leaves the (now empty) image stack untouched.
        let mut empty = State::new();
        apply(&registry, "image_invert", &mut empty);
        assert_eq!(empty.len(StackId::Image), 0);
    }

    #[test]
    fn test_validate_program_reports_nested_offender() {
        let registry = Registry::with_intrinsics();
        let program = daub_lang::Program::from_elements(vec![
            Element::instruction(EXEC_DUP),
            Element::Block(vec![Element::Int(1), Element::instruction("mystery")]),
        ]);

        let err = registry.validate_program(&program).unwrap_err();
        assert!(err.to_string().contains("mystery"));

        let fine = daub_lang::Program::from_elements(vec![Element::instruction(EXEC_DUP)]);
        assert!(registry.validate_program(&fine).is_ok());
    }
}
