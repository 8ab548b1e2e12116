//! Shared hook points: places in a method where several patches add calls.
//!
//! A patch that finds an interesting spot registers it once under a name;
//! later patches inject `invoke-static` calls there without repeating the
//! search. Calls run in the order they were injected.

use std::collections::BTreeMap;

use tracing::debug;

use crate::bytecode::{ClassPool, Instruction, Method, MethodId, MethodRef, register_width};
use crate::error::{Error, Result};

/// Most registers an `invoke-static` can take without `/range`
const MAX_INVOKE_REGISTERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Anchor {
    /// Calls go at the start of the method
    Entry,
    /// Calls go behind this instruction
    After { instruction: Instruction, index: usize },
}

/// A named insertion point and the registers every call receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookPoint {
    pub method: MethodId,
    anchor: Anchor,
    registers: Vec<u16>,
    injected: usize,
}

impl HookPoint {
    pub fn at_entry(method: MethodId, registers: impl Into<Vec<u16>>) -> Self {
        Self {
            method,
            anchor: Anchor::Entry,
            registers: registers.into(),
            injected: 0,
        }
    }

    /// Calls go right behind the instruction now at `index` of `body`
    ///
    /// The instruction itself is remembered, so the point survives code
    /// being inserted in front of it.
    pub fn after(
        method: MethodId,
        body: &Method,
        index: usize,
        registers: impl Into<Vec<u16>>,
    ) -> Result<Self> {
        let instruction = body.instruction(index)?.clone();
        Ok(Self {
            method,
            anchor: Anchor::After { instruction, index },
            registers: registers.into(),
            injected: 0,
        })
    }

    pub fn registers(&self) -> &[u16] {
        &self.registers
    }

    /// Calls injected so far
    pub fn injected(&self) -> usize {
        self.injected
    }

    /// Index the next call goes to, re-finding the anchor if it moved
    fn next_index(&mut self, body: &Method) -> Result<usize> {
        let Anchor::After { instruction, index } = &mut self.anchor else {
            return Ok(self.injected);
        };
        let instruction: &Instruction = instruction;
        if body.instructions.get(*index) != Some(instruction) {
            *index = body
                .find_index(|i| i == instruction)
                .ok_or_else(|| Error::HookPointLost {
                    method: body.descriptor(),
                    anchor: instruction.to_string(),
                })?;
        }
        Ok(*index + 1 + self.injected)
    }
}

/// Hook points by name
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    points: BTreeMap<String, HookPoint>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `point` under `name`, replacing an earlier one
    pub fn register(&mut self, name: impl Into<String>, point: HookPoint) {
        let name = name.into();
        debug!("Registering hook point {}", name);
        self.points.insert(name, point);
    }

    pub fn get(&self, name: &str) -> Option<&HookPoint> {
        self.points.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.points.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.points.keys().map(String::as_str)
    }

    /// Add `invoke-static {registers}, descriptor` at the named point
    ///
    /// The descriptor's parameters must fill exactly the point's registers.
    /// Returns the index the call was inserted at.
    pub fn inject(&mut self, pool: &mut ClassPool, name: &str, descriptor: &str) -> Result<usize> {
        let point = self
            .points
            .get_mut(name)
            .ok_or_else(|| Error::HookNotFound(name.to_string()))?;

        let target: MethodRef = descriptor.parse()?;
        let width: usize = target
            .parameters
            .iter()
            .map(|p| register_width(p) as usize)
            .sum();
        if width != point.registers.len() || width > MAX_INVOKE_REGISTERS {
            return Err(Error::InvalidMethod(format!(
                "{} cannot take the {} register(s) of hook point {}",
                target,
                point.registers.len(),
                name
            )));
        }

        let method = pool.method_mut(point.method);
        let index = point.next_index(method)?;
        let registers = point
            .registers
            .iter()
            .map(|r| format!("v{}", r))
            .collect::<Vec<_>>()
            .join(", ");
        method.add_instruction(index, &format!("invoke-static {{{}}}, {}", registers, target))?;
        point.injected += 1;

        debug!("Injected {} at {}[{}]", target, method.descriptor(), index);
        Ok(index)
    }
}
