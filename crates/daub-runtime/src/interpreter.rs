//! The interpreter: drains the exec stack one element at a time.

use crate::registry::Registry;
use crate::state::{StackId, State, Value};
use daub_core::{Error, Result};
use daub_lang::{Element, Program};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Execution limits for one program run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Maximum interpreter steps per run. `None` removes the bound and
    /// restores the pure drain-until-empty semantics, in which a
    /// self-replicating program runs forever.
    pub max_steps: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_steps: Some(500_000),
        }
    }
}

/// Push a program onto the exec stack ahead of any pending work.
///
/// Elements are pushed in program order, so the last element lands on top
/// and executes first; pre-existing pending work runs after the whole
/// program has drained.
pub fn load_program(state: &mut State, program: &Program) {
    for element in program.iter() {
        state.push(StackId::Exec, Value::Exec(element.clone()));
    }
}

/// Executes programs against a state until the exec stack is empty.
pub struct Interpreter {
    registry: Registry,
    config: RunConfig,
}

impl Interpreter {
    pub fn new(registry: Registry, config: RunConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Load `program` and step until the exec stack drains; the resulting
    /// state is the program's output.
    pub fn run(&self, program: &Program, mut state: State) -> Result<State> {
        load_program(&mut state, program);

        let mut steps: u64 = 0;
        loop {
            if let Some(limit) = self.config.max_steps {
                if steps >= limit && !state.is_empty(StackId::Exec) {
                    return Err(Error::StepLimit { limit });
                }
            }
            if !self.step(&mut state, steps)? {
                break;
            }
            steps += 1;
        }

        debug!(steps, "program halted");
        Ok(state)
    }

    /// Execute one step: pop the top pending element and dispatch on it.
    /// Returns `false` when the exec stack was already empty (halted).
    /// `step` is the zero-based step index, used in diagnostics.
    pub fn step(&self, state: &mut State, step: u64) -> Result<bool> {
        let element = match state.pop(StackId::Exec) {
            None => return Ok(false),
            Some(Value::Exec(element)) => element,
            Some(other) => {
                return Err(Error::InvalidState(format!(
                    "non-program value {:?} on the exec stack",
                    other
                )))
            }
        };

        match element {
            Element::Bool(b) => state.push_bool(b),
            Element::Int(i) => state.push_int(i),
            Element::Block(elements) => {
                // Splice so the block's first sub-element is on top and
                // executes next, preserving internal order.
                for el in elements.into_iter().rev() {
                    state.push(StackId::Exec, Value::Exec(el));
                }
            }
            Element::Instruction(id) => {
                let op = self
                    .registry
                    .resolve(&id)
                    .ok_or_else(|| Error::UnknownInstruction {
                        name: id.to_string(),
                        step,
                    })?;
                op(state);
            }
        }

        Ok(true)
    }
}
