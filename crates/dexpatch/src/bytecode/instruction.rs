use std::fmt;

use serde::{Deserialize, Serialize};

use super::opcode::{Format, Opcode};
use super::reference::{FieldRef, MethodRef, Reference};

/// One decoded instruction of a method body
///
/// Branch targets are absolute indices into the owning method's instruction
/// list, so they move together with the instruction they point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registers: Vec<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<usize>,
    /// Call-site prototype of `invoke-polymorphic`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prototype: Option<String>,
}

impl Instruction {
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            registers: Vec::new(),
            literal: None,
            reference: None,
            target: None,
            prototype: None,
        }
    }

    pub fn with_registers(mut self, registers: impl Into<Vec<u16>>) -> Self {
        self.registers = registers.into();
        self
    }

    pub fn with_literal(mut self, literal: i64) -> Self {
        self.literal = Some(literal);
        self
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_target(mut self, target: usize) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_prototype(mut self, prototype: impl Into<String>) -> Self {
        self.prototype = Some(prototype.into());
        self
    }

    pub fn register_a(&self) -> Option<u16> {
        self.registers.first().copied()
    }

    pub fn register_b(&self) -> Option<u16> {
        self.registers.get(1).copied()
    }

    pub fn register_c(&self) -> Option<u16> {
        self.registers.get(2).copied()
    }

    pub fn method_ref(&self) -> Option<&MethodRef> {
        match &self.reference {
            Some(Reference::Method(method)) => Some(method),
            _ => None,
        }
    }

    pub fn field_ref(&self) -> Option<&FieldRef> {
        match &self.reference {
            Some(Reference::Field(field)) => Some(field),
            _ => None,
        }
    }

    pub fn type_ref(&self) -> Option<&str> {
        match &self.reference {
            Some(Reference::Type(descriptor)) => Some(descriptor),
            _ => None,
        }
    }

    pub fn string(&self) -> Option<&str> {
        match &self.reference {
            Some(Reference::String(value)) => Some(value),
            _ => None,
        }
    }
}

fn write_registers(f: &mut fmt::Formatter<'_>, registers: &[u16]) -> fmt::Result {
    let list = registers
        .iter()
        .map(|r| format!("v{}", r))
        .collect::<Vec<_>>()
        .join(", ");
    f.write_str(&list)
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.mnemonic())?;

        match self.opcode.format() {
            Format::NoRegisters => return Ok(()),
            Format::RegisterList | Format::RegisterListPrototype => {
                f.write_str(" {")?;
                write_registers(f, &self.registers)?;
                f.write_str("}")?;
            }
            Format::RegisterRange | Format::RegisterRangePrototype => match (self.registers.first(), self.registers.last()) {
                (Some(first), Some(last)) => write!(f, " {{v{} .. v{}}}", first, last)?,
                _ => f.write_str(" {}")?,
            },
            _ => {
                f.write_str(" ")?;
                write_registers(f, &self.registers)?;
            }
        }

        if let Some(literal) = self.literal {
            if literal < 0 {
                write!(f, ", -0x{:x}", literal.unsigned_abs())?;
            } else {
                write!(f, ", 0x{:x}", literal)?;
            }
        }
        if let Some(reference) = &self.reference {
            write!(f, ", {}", reference)?;
        }
        if let Some(prototype) = &self.prototype {
            write!(f, ", {}", prototype)?;
        }
        if let Some(target) = self.target {
            write!(f, ", :L{}", target)?;
        }
        Ok(())
    }
}
