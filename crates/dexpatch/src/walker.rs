//! Follow method references from one method to the next.
//!
//! Some targets have no stable shape of their own (synthetic accessors,
//! lambdas, obfuscated helpers) but are always called from a method that
//! does. The walker starts at a resolved method and follows references
//! through the pool until it reaches them.

use tracing::debug;

use crate::bytecode::{ClassPool, Instruction, Method, MethodId, Opcode};
use crate::error::{Error, Result};

/// Which method references a walk step counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepFilter {
    /// Any instruction carrying a method reference
    AnyMethod,
    /// Only invokes with this opcode
    Invoke(Opcode),
    /// Only references to methods of this class
    DefinedIn(String),
}

impl StepFilter {
    pub fn accepts(&self, instruction: &Instruction) -> bool {
        let Some(reference) = instruction.method_ref() else {
            return false;
        };
        match self {
            StepFilter::AnyMethod => true,
            StepFilter::Invoke(opcode) => instruction.opcode == *opcode,
            StepFilter::DefinedIn(class) => reference.defining_class == *class,
        }
    }
}

/// Follow the `nth` matching method reference (1-indexed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkStep {
    pub filter: StepFilter,
    pub nth: usize,
}

impl WalkStep {
    pub fn nth(nth: usize) -> Self {
        Self {
            filter: StepFilter::AnyMethod,
            nth,
        }
    }

    pub fn with_filter(mut self, filter: StepFilter) -> Self {
        self.filter = filter;
        self
    }
}

#[derive(Debug, Clone)]
pub struct MethodWalker<'a> {
    pool: &'a ClassPool,
    current: MethodId,
    steps: usize,
}

impl<'a> MethodWalker<'a> {
    pub fn new(pool: &'a ClassPool, start: MethodId) -> Self {
        Self {
            pool,
            current: start,
            steps: 0,
        }
    }

    /// Method reached so far
    pub fn method_id(&self) -> MethodId {
        self.current
    }

    pub fn method(&self) -> &'a Method {
        self.pool.method(self.current)
    }

    /// Follow the method reference of the instruction at `index`
    pub fn next_method(mut self, index: usize) -> Result<Self> {
        let method = self.method();
        let instruction = method.instruction(index)?;
        if instruction.method_ref().is_none() {
            return Err(Error::UnexpectedInstruction {
                method: method.descriptor(),
                index,
                expected: "a method reference".to_string(),
                found: instruction.to_string(),
            });
        }

        self.steps += 1;
        self.follow(instruction)?;
        Ok(self)
    }

    /// Follow the `nth` method reference accepted by the step's filter
    pub fn step(mut self, step: &WalkStep) -> Result<Self> {
        if step.nth == 0 {
            return Err(Error::InvalidWalkStep(
                "occurrences are counted from 1".to_string(),
            ));
        }

        self.steps += 1;
        let method = self.method();
        let instruction = method
            .instructions
            .iter()
            .filter(|i| step.filter.accepts(i))
            .nth(step.nth - 1)
            .ok_or_else(|| Error::ReferenceNotFound {
                method: method.descriptor(),
                step: self.steps,
                nth: step.nth,
            })?;

        self.follow(instruction)?;
        Ok(self)
    }

    /// Apply every step in order and return the method reached
    pub fn walk(self, steps: &[WalkStep]) -> Result<MethodId> {
        let mut walker = self;
        for step in steps {
            walker = walker.step(step)?;
        }
        Ok(walker.current)
    }

    fn follow(&mut self, instruction: &Instruction) -> Result<()> {
        let Some(reference) = instruction.method_ref() else {
            return Err(Error::InvalidWalkStep(format!(
                "{} carries no method reference",
                instruction
            )));
        };

        let target = self
            .pool
            .find_method(reference)
            .ok_or_else(|| Error::UnresolvableReference {
                reference: reference.to_string(),
            })?;

        debug!(
            "Walked from {} to {}",
            self.method().descriptor(),
            reference
        );
        self.current = target;
        Ok(())
    }
}
