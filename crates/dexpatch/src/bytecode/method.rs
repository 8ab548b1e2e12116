use serde::{Deserialize, Serialize};

use super::access::AccessFlags;
use super::instruction::Instruction;
use super::reference::{MethodRef, register_width};
use crate::error::{Error, Result};

/// A method and its mutable body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub defining_class: String,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    pub return_type: String,
    #[serde(default)]
    pub access_flags: AccessFlags,
    /// Total register count, parameters included
    #[serde(default)]
    pub registers: u16,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

impl Method {
    pub fn new(
        defining_class: impl Into<String>,
        name: impl Into<String>,
        parameters: Vec<String>,
        return_type: impl Into<String>,
        access_flags: AccessFlags,
    ) -> Self {
        Self {
            defining_class: defining_class.into(),
            name: name.into(),
            parameters,
            return_type: return_type.into(),
            access_flags,
            registers: 0,
            instructions: Vec::new(),
        }
    }

    pub fn method_ref(&self) -> MethodRef {
        MethodRef::new(
            self.defining_class.clone(),
            self.name.clone(),
            self.parameters.clone(),
            self.return_type.clone(),
        )
    }

    /// Smali descriptor, e.g. `La;->b(I)V`
    pub fn descriptor(&self) -> String {
        self.method_ref().to_string()
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(AccessFlags::STATIC)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>" || self.name == "<clinit>"
    }

    /// Registers taken by the parameters, including `this` for instance methods
    pub fn parameter_register_count(&self) -> u16 {
        let receiver = if self.is_static() { 0 } else { 1 };
        receiver + self.parameters.iter().map(|p| register_width(p)).sum::<u16>()
    }

    /// Map parameter register `pN` to its absolute register number
    pub fn parameter_register(&self, n: u16) -> Option<u16> {
        let count = self.parameter_register_count();
        if n >= count || self.registers < count {
            return None;
        }
        Some(self.registers - count + n)
    }

    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    pub fn instruction(&self, index: usize) -> Result<&Instruction> {
        let len = self.instructions.len();
        self.instructions
            .get(index)
            .ok_or_else(|| self.out_of_bounds(index, len))
    }

    pub fn instruction_mut(&mut self, index: usize) -> Result<&mut Instruction> {
        let len = self.instructions.len();
        if index >= len {
            return Err(self.out_of_bounds(index, len));
        }
        Ok(&mut self.instructions[index])
    }

    /// First register operand of the instruction at `index`
    pub fn register_at(&self, index: usize) -> Result<u16> {
        let instruction = self.instruction(index)?;
        instruction
            .register_a()
            .ok_or_else(|| Error::UnexpectedInstruction {
                method: self.descriptor(),
                index,
                expected: "an instruction with a register operand".to_string(),
                found: instruction.to_string(),
            })
    }

    pub fn find_index<F>(&self, predicate: F) -> Option<usize>
    where
        F: Fn(&Instruction) -> bool,
    {
        self.instructions.iter().position(predicate)
    }

    pub fn rfind_index<F>(&self, predicate: F) -> Option<usize>
    where
        F: Fn(&Instruction) -> bool,
    {
        self.instructions.iter().rposition(predicate)
    }

    /// Splice instructions in at `index`
    ///
    /// Everything at or after `index` moves up by `items.len()`, and existing
    /// branch targets follow the instruction they point at. Targets inside
    /// `items` must already be absolute in the resulting list.
    pub fn insert_instructions(&mut self, index: usize, items: Vec<Instruction>) -> Result<()> {
        let len = self.instructions.len();
        if index > len {
            return Err(self.out_of_bounds(index, len));
        }
        let count = items.len();
        if count == 0 {
            return Ok(());
        }

        for instruction in &mut self.instructions {
            if let Some(target) = instruction.target.as_mut()
                && *target >= index
            {
                *target += count;
            }
        }

        self.instructions.splice(index..index, items);
        Ok(())
    }

    /// Remove `count` instructions starting at `index`
    ///
    /// Branches into the removed span are retargeted to the instruction that
    /// follows it.
    pub fn remove_instructions(&mut self, index: usize, count: usize) -> Result<()> {
        let len = self.instructions.len();
        let end = index.checked_add(count).filter(|end| *end <= len);
        let Some(end) = end else {
            return Err(self.out_of_bounds(index.saturating_add(count), len));
        };

        self.instructions.drain(index..end);
        for instruction in &mut self.instructions {
            if let Some(target) = instruction.target.as_mut() {
                if *target >= end {
                    *target -= count;
                } else if *target > index {
                    *target = index;
                }
            }
        }
        Ok(())
    }

    pub fn replace_instruction(&mut self, index: usize, instruction: Instruction) -> Result<()> {
        *self.instruction_mut(index)? = instruction;
        Ok(())
    }

    fn out_of_bounds(&self, index: usize, len: usize) -> Error {
        Error::IndexOutOfBounds {
            method: self.descriptor(),
            index,
            len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Opcode;

    fn sample() -> Method {
        let mut method = Method::new("La;", "run", vec!["J".into(), "I".into()], "V", AccessFlags::PUBLIC);
        method.registers = 6;
        method.instructions = vec![
            Instruction::new(Opcode::Move).with_registers([0, 1]),
            Instruction::new(Opcode::IfEqz).with_registers([0]).with_target(3),
            Instruction::new(Opcode::MoveResult).with_registers([0]),
            Instruction::new(Opcode::ReturnVoid),
        ];
        method
    }

    #[test]
    fn test_parameter_registers() {
        let method = sample();
        // this + J (wide) + I
        assert_eq!(method.parameter_register_count(), 4);
        assert_eq!(method.parameter_register(0), Some(2));
        assert_eq!(method.parameter_register(3), Some(5));
        assert_eq!(method.parameter_register(4), None);

        let mut stat = method.clone();
        stat.access_flags |= AccessFlags::STATIC;
        assert_eq!(stat.parameter_register_count(), 3);
        assert_eq!(stat.parameter_register(0), Some(3));
    }

    #[test]
    fn test_insert_shifts_following_instructions() {
        let mut method = sample();
        let moved = method.instructions[2].clone();
        method
            .insert_instructions(2, vec![Instruction::new(Opcode::Nop), Instruction::new(Opcode::Nop)])
            .unwrap();
        assert_eq!(method.instruction_count(), 6);
        assert_eq!(method.instructions[4], moved);
        // branch keeps pointing at return-void
        assert_eq!(method.instructions[1].target, Some(5));
        assert_eq!(method.instructions[5].opcode, Opcode::ReturnVoid);
    }

    #[test]
    fn test_insert_at_end_and_past_end() {
        let mut method = sample();
        method.insert_instructions(4, vec![Instruction::new(Opcode::Nop)]).unwrap();
        assert_eq!(method.instructions[4].opcode, Opcode::Nop);

        let err = method.insert_instructions(9, vec![Instruction::new(Opcode::Nop)]);
        assert!(matches!(err, Err(Error::IndexOutOfBounds { index: 9, len: 5, .. })));
    }

    #[test]
    fn test_remove_retargets_branches() {
        let mut method = sample();
        method.instructions[0] = Instruction::new(Opcode::Goto).with_target(2);
        method.remove_instructions(2, 1).unwrap();
        assert_eq!(method.instruction_count(), 3);
        // goto pointed at the removed instruction, now at its successor
        assert_eq!(method.instructions[0].target, Some(2));
        assert_eq!(method.instructions[1].target, Some(2));
        assert!(method.remove_instructions(2, 5).is_err());
    }

    #[test]
    fn test_register_at() {
        let method = sample();
        assert_eq!(method.register_at(2).unwrap(), 0);
        assert!(matches!(
            method.register_at(3),
            Err(Error::UnexpectedInstruction { index: 3, .. })
        ));
        assert!(matches!(method.register_at(10), Err(Error::IndexOutOfBounds { .. })));
    }
}
