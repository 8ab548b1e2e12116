//! Assemble smali instruction text against a target method.
//!
//! `pN` registers are mapped through the target method's register layout, so
//! the same text assembles differently for methods with different register
//! counts. Branch targets become absolute indices for the position the
//! instructions are going to be inserted at.

use std::collections::HashMap;

use crate::bytecode::{Format, Instruction, Method, Opcode, Reference, is_prototype};
use crate::error::{Error, Result};

/// A label bound to an instruction already present in the method
///
/// `index` is the instruction's position before the insertion happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLabel {
    pub name: String,
    pub index: usize,
}

impl ExternalLabel {
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

/// Assemble `text` as if it were inserted at index 0 of `method`
pub fn assemble(text: &str, method: &Method) -> Result<Vec<Instruction>> {
    assemble_at(text, method, 0, &[])
}

/// Assemble `text` for insertion at `base` in `method`
pub fn assemble_at(
    text: &str,
    method: &Method,
    base: usize,
    external: &[ExternalLabel],
) -> Result<Vec<Instruction>> {
    let lines = parse_lines(text)?;
    let count = lines.iter().filter(|l| matches!(l, Line::Instruction { .. })).count();

    let mut labels: HashMap<String, usize> = HashMap::new();
    for label in external {
        let target = if label.index >= base {
            label.index + count
        } else {
            label.index
        };
        labels.insert(label.name.clone(), target);
    }

    let mut position = base;
    for line in &lines {
        match line {
            Line::Label { name, line } => {
                if labels.insert(name.clone(), position).is_some() {
                    return Err(Error::smali(*line, format!("label ':{}' defined twice", name)));
                }
            }
            Line::Instruction { .. } => position += 1,
        }
    }

    let mut instructions = Vec::with_capacity(count);
    for line in &lines {
        if let Line::Instruction {
            line,
            opcode,
            operands,
        } = line
        {
            let assembler = LineAssembler {
                line: *line,
                method,
                labels: &labels,
            };
            instructions.push(assembler.assemble(*opcode, operands)?);
        }
    }
    Ok(instructions)
}

enum Line {
    Label {
        name: String,
        line: usize,
    },
    Instruction {
        line: usize,
        opcode: Opcode,
        operands: Vec<String>,
    },
}

fn parse_lines(text: &str) -> Result<Vec<Line>> {
    let mut lines = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let content = strip_comment(raw).trim();
        if content.is_empty() {
            continue;
        }

        if let Some(name) = content.strip_prefix(':') {
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(Error::smali(line, format!("invalid label '{}'", content)));
            }
            lines.push(Line::Label {
                name: name.to_string(),
                line,
            });
            continue;
        }

        let (mnemonic, rest) = match content.split_once(char::is_whitespace) {
            Some((mnemonic, rest)) => (mnemonic, rest.trim()),
            None => (content, ""),
        };
        let opcode: Opcode = mnemonic
            .parse()
            .map_err(|_| Error::smali(line, format!("unknown opcode '{}'", mnemonic)))?;

        lines.push(Line::Instruction {
            line,
            opcode,
            operands: split_operands(rest, line)?,
        });
    }

    Ok(lines)
}

/// Drop a trailing `#` comment that is not inside a string literal
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Split on commas that are not inside `{}`, `()` or a string literal
fn split_operands(text: &str, line: usize) -> Result<Vec<String>> {
    let mut operands = Vec::new();
    if text.is_empty() {
        return Ok(operands);
    }

    let mut current = String::new();
    let mut depth = 0usize;
    let mut parens = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::smali(line, "unbalanced '}'"))?;
            }
            '(' if !in_string => parens += 1,
            ')' if !in_string => parens = parens.saturating_sub(1),
            ',' if !in_string && depth == 0 && parens == 0 => {
                operands.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }

    if in_string || depth != 0 {
        return Err(Error::smali(line, "unterminated operand"));
    }
    operands.push(current.trim().to_string());
    Ok(operands)
}

struct LineAssembler<'a> {
    line: usize,
    method: &'a Method,
    labels: &'a HashMap<String, usize>,
}

impl LineAssembler<'_> {
    fn assemble(&self, opcode: Opcode, operands: &[String]) -> Result<Instruction> {
        let mut instruction = Instruction::new(opcode);

        let expected = match opcode.format() {
            Format::NoRegisters => 0,
            Format::OneRegister | Format::Branch => 1,
            Format::TwoRegisters
            | Format::RegisterLiteral
            | Format::RegisterReference
            | Format::RegisterList
            | Format::RegisterRange
            | Format::RegisterBranch
            | Format::RegisterPayload => 2,
            Format::ThreeRegisters
            | Format::TwoRegistersLiteral
            | Format::TwoRegistersReference
            | Format::TwoRegistersBranch
            | Format::RegisterListPrototype
            | Format::RegisterRangePrototype => 3,
        };
        if operands.len() != expected {
            return Err(self.error(format!(
                "{} takes {} operand(s), found {}",
                opcode,
                expected,
                operands.len()
            )));
        }

        match opcode.format() {
            Format::NoRegisters => {}
            Format::OneRegister | Format::TwoRegisters | Format::ThreeRegisters => {
                instruction.registers = self.registers(operands)?;
            }
            Format::RegisterLiteral | Format::TwoRegistersLiteral => {
                let (literal, registers) = operands.split_last().ok_or_else(|| self.error("missing literal"))?;
                instruction.registers = self.registers(registers)?;
                instruction.literal = Some(self.literal(literal)?);
            }
            Format::RegisterReference | Format::TwoRegistersReference => {
                let (reference, registers) = operands.split_last().ok_or_else(|| self.error("missing reference"))?;
                instruction.registers = self.registers(registers)?;
                instruction.reference = Some(self.reference(opcode, reference)?);
            }
            Format::RegisterList | Format::RegisterRange => {
                instruction.registers = self.register_list(&operands[0])?;
                instruction.reference = Some(self.reference(opcode, &operands[1])?);
            }
            Format::RegisterListPrototype | Format::RegisterRangePrototype => {
                instruction.registers = self.register_list(&operands[0])?;
                instruction.reference = Some(self.reference(opcode, &operands[1])?);
                let prototype = operands[2].trim();
                if !is_prototype(prototype) {
                    return Err(self.error(format!("invalid prototype '{}'", prototype)));
                }
                instruction.prototype = Some(prototype.to_string());
            }
            Format::Branch
            | Format::RegisterBranch
            | Format::TwoRegistersBranch
            | Format::RegisterPayload => {
                let (label, registers) = operands.split_last().ok_or_else(|| self.error("missing label"))?;
                instruction.registers = self.registers(registers)?;
                instruction.target = Some(self.label(label)?);
            }
        }

        Ok(instruction)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::smali(self.line, message)
    }

    fn registers(&self, operands: &[String]) -> Result<Vec<u16>> {
        operands.iter().map(|r| self.register(r)).collect()
    }

    fn register(&self, text: &str) -> Result<u16> {
        let text = text.trim();
        let parse = |digits: &str| {
            digits
                .parse::<u16>()
                .map_err(|_| self.error(format!("invalid register '{}'", text)))
        };

        if let Some(digits) = text.strip_prefix('v') {
            return parse(digits);
        }
        if let Some(digits) = text.strip_prefix('p') {
            let n = parse(digits)?;
            return self.method.parameter_register(n).ok_or_else(|| {
                self.error(format!(
                    "parameter register '{}' does not exist in {}",
                    text,
                    self.method.descriptor()
                ))
            });
        }
        Err(self.error(format!("invalid register '{}'", text)))
    }

    fn register_list(&self, text: &str) -> Result<Vec<u16>> {
        let inner = text
            .trim()
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
            .ok_or_else(|| self.error(format!("expected register list, found '{}'", text)))?
            .trim();

        if inner.is_empty() {
            return Ok(Vec::new());
        }

        if let Some((first, last)) = inner.split_once("..") {
            let first = self.register(first)?;
            let last = self.register(last)?;
            if last < first {
                return Err(self.error(format!("invalid register range '{}'", text)));
            }
            return Ok((first..=last).collect());
        }

        inner.split(',').map(|r| self.register(r)).collect()
    }

    fn literal(&self, text: &str) -> Result<i64> {
        let text = text.trim();
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let body = body.trim_end_matches(['L', 'l']);

        let magnitude = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => body.parse::<u64>(),
        }
        .map_err(|_| self.error(format!("invalid literal '{}'", text)))?;

        // wide literals such as 0xffffffffffffffffL wrap into i64
        let value = magnitude as i64;
        Ok(if negative { value.wrapping_neg() } else { value })
    }

    fn reference(&self, opcode: Opcode, text: &str) -> Result<Reference> {
        let kind = opcode
            .reference_kind()
            .ok_or_else(|| self.error(format!("{} takes no reference", opcode)))?;
        Reference::parse(kind, text).map_err(|e| self.error(e.to_string()))
    }

    fn label(&self, text: &str) -> Result<usize> {
        let name = text
            .trim()
            .strip_prefix(':')
            .ok_or_else(|| self.error(format!("expected label, found '{}'", text)))?;
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| self.error(format!("undefined label ':{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::AccessFlags;

    fn target() -> Method {
        let mut method = Method::new(
            "Lapp/Player;",
            "seek",
            vec!["J".into()],
            "Z",
            AccessFlags::PUBLIC,
        );
        method.registers = 5;
        method
    }

    #[test]
    fn test_assemble_invoke_with_parameter_registers() {
        let instructions = assemble(
            "invoke-virtual {p0, p1, p2, v0}, Lapp/Player;->seekTo(JLapp/Source;)Z\nmove-result p1",
            &target(),
        )
        .unwrap();
        assert_eq!(instructions.len(), 2);
        // 5 registers, 3 parameter registers: p0 = v2
        assert_eq!(instructions[0].registers, vec![2, 3, 4, 0]);
        assert_eq!(
            instructions[0].method_ref().map(|m| m.name.as_str()),
            Some("seekTo")
        );
        assert_eq!(instructions[1].registers, vec![3]);
    }

    #[test]
    fn test_assemble_literals_and_references() {
        let text = r#"
            const v0, 0x7f0b0012   # resource id
            const/4 v1, -0x1
            const-wide v2, 0x10L
            const-string v0, "a, b # c"
            sget-object v0, Lapp/Source;->a:Lapp/Source;
        "#;
        let instructions = assemble(text, &target()).unwrap();
        assert_eq!(instructions[0].literal, Some(0x7f0b0012));
        assert_eq!(instructions[1].literal, Some(-1));
        assert_eq!(instructions[2].literal, Some(16));
        assert_eq!(instructions[3].string(), Some("a, b # c"));
        assert_eq!(
            instructions[4].field_ref().map(|f| f.field_type.as_str()),
            Some("Lapp/Source;")
        );
    }

    #[test]
    fn test_assemble_range() {
        let instructions =
            assemble("invoke-static/range {v0 .. v2}, La;->b(III)V", &target()).unwrap();
        assert_eq!(instructions[0].registers, vec![0, 1, 2]);
    }

    #[test]
    fn test_assemble_arithmetic_and_array_forms() {
        let text = "
            add-int/2addr v0, v1
            rem-int/lit16 v0, v1, 0x3e8
            aget-wide v2, v0, v1
            fill-array-data v0, :data
            invoke-polymorphic {v0, v1}, Ljava/lang/invoke/MethodHandle;->invokeExact([Ljava/lang/Object;)Ljava/lang/Object;, (I)V
            const-method-type v0, (J)Z
            :data
            nop
        ";
        let instructions = assemble(text, &target()).unwrap();
        assert_eq!(instructions[0].opcode, Opcode::AddInt2addr);
        assert_eq!(instructions[0].registers, vec![0, 1]);
        assert_eq!(instructions[1].literal, Some(1000));
        assert_eq!(instructions[2].registers, vec![2, 0, 1]);
        assert_eq!(instructions[3].target, Some(6));
        assert_eq!(instructions[4].prototype.as_deref(), Some("(I)V"));
        assert_eq!(
            instructions[4].method_ref().map(|m| m.name.as_str()),
            Some("invokeExact")
        );
        assert_eq!(
            instructions[5].reference,
            Some(Reference::MethodType("(J)Z".to_string()))
        );

        let err = assemble(
            "invoke-polymorphic {v0}, La;->b()V, I",
            &target(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("prototype"));
    }

    #[test]
    fn test_call_site_commas_stay_in_one_operand() {
        let instructions = assemble(
            r#"invoke-custom {v0}, call_site_0("run", ()Ljava/lang/Runnable;)@Lapp/Boot;->bootstrap()Ljava/lang/invoke/CallSite;"#,
            &target(),
        )
        .unwrap();
        assert!(matches!(instructions[0].reference, Some(Reference::CallSite(_))));
    }

    #[test]
    fn test_internal_labels_are_absolute() {
        let text = "
            if-eqz v0, :skip
            const/4 v0, 0x1
            :skip
            return v0
        ";
        let instructions = assemble_at(text, &target(), 10, &[]).unwrap();
        assert_eq!(instructions[0].target, Some(12));
    }

    #[test]
    fn test_external_labels_account_for_the_insertion() {
        let labels = [
            ExternalLabel::new("before", 3),
            ExternalLabel::new("after", 10),
        ];
        let text = "if-eqz v0, :before\nif-nez v0, :after";
        let instructions = assemble_at(text, &target(), 5, &labels).unwrap();
        assert_eq!(instructions[0].target, Some(3));
        assert_eq!(instructions[1].target, Some(12));
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let err = assemble("nop\njump v0", &target()).unwrap_err();
        assert!(matches!(err, Error::Smali { line: 2, .. }));

        let err = assemble("move-result p7", &target()).unwrap_err();
        assert!(matches!(err, Error::Smali { line: 1, .. }));

        let err = assemble("goto :nowhere", &target()).unwrap_err();
        assert!(err.to_string().contains("undefined label"));

        let err = assemble("move-result v0, v1", &target()).unwrap_err();
        assert!(err.to_string().contains("operand"));
    }
}
