use serde::{Deserialize, Serialize};

use crate::bytecode::{Instruction, Opcode};

/// Matched opcode window, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternScanResult {
    pub start_index: usize,
    pub end_index: usize,
}

/// A required string and the index of the first instruction loading it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringMatch {
    pub string: String,
    pub index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternScanResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strings: Vec<StringMatch>,
}

/// Find the first window of `instructions` matching `pattern`
///
/// `None` entries in the pattern match any opcode. An empty pattern never
/// matches.
pub fn scan_opcodes(
    instructions: &[Instruction],
    pattern: &[Option<Opcode>],
) -> Option<PatternScanResult> {
    if pattern.is_empty() || instructions.len() < pattern.len() {
        return None;
    }

    let last = instructions.len() - pattern.len();
    'outer: for i in 0..=last {
        for (j, opcode) in pattern.iter().enumerate() {
            if let Some(expected) = opcode
                && instructions[i + j].opcode != *expected
            {
                continue 'outer;
            }
        }
        return Some(PatternScanResult {
            start_index: i,
            end_index: i + pattern.len() - 1,
        });
    }

    None
}

/// Locate every required string, in the order given
///
/// Returns `None` unless all of them are loaded somewhere in the method.
pub fn scan_strings(instructions: &[Instruction], strings: &[String]) -> Option<Vec<StringMatch>> {
    strings
        .iter()
        .map(|wanted| {
            instructions
                .iter()
                .position(|i| i.string() == Some(wanted.as_str()))
                .map(|index| StringMatch {
                    string: wanted.clone(),
                    index,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Reference;

    fn body(opcodes: &[Opcode]) -> Vec<Instruction> {
        opcodes.iter().map(|op| Instruction::new(*op)).collect()
    }

    #[test]
    fn test_scan_finds_first_window() {
        let instructions = body(&[
            Opcode::Move,
            Opcode::InvokeStatic,
            Opcode::MoveResult,
            Opcode::InvokeStatic,
            Opcode::MoveResult,
            Opcode::Return,
        ]);
        let result = scan_opcodes(
            &instructions,
            &[Some(Opcode::InvokeStatic), Some(Opcode::MoveResult)],
        );
        assert_eq!(
            result,
            Some(PatternScanResult {
                start_index: 1,
                end_index: 2
            })
        );
    }

    #[test]
    fn test_wildcard_matches_any_opcode() {
        let pattern = [Some(Opcode::Move), None, Some(Opcode::Return)];
        for middle in [Opcode::Nop, Opcode::IgetObject, Opcode::InvokeVirtual] {
            let instructions = body(&[Opcode::Nop, Opcode::Move, middle, Opcode::Return]);
            let result = scan_opcodes(&instructions, &pattern).unwrap();
            assert_eq!(result.start_index, 1);
            assert_eq!(result.end_index, 3);
        }
    }

    #[test]
    fn test_scan_edges() {
        let instructions = body(&[Opcode::Move, Opcode::Return]);
        assert!(scan_opcodes(&instructions, &[]).is_none());
        assert!(scan_opcodes(&instructions, &[None, None, None]).is_none());
        assert!(scan_opcodes(&instructions, &[Some(Opcode::Return), Some(Opcode::Move)]).is_none());
        let tail = scan_opcodes(&instructions, &[Some(Opcode::Return)]).unwrap();
        assert_eq!(tail.start_index, 1);
    }

    #[test]
    fn test_scan_strings() {
        let instructions = vec![
            Instruction::new(Opcode::ConstString)
                .with_registers([0])
                .with_reference(Reference::String("first".into())),
            Instruction::new(Opcode::Nop),
            Instruction::new(Opcode::ConstString)
                .with_registers([0])
                .with_reference(Reference::String("second".into())),
        ];

        let found = scan_strings(&instructions, &["second".into(), "first".into()]).unwrap();
        assert_eq!(found[0].index, 2);
        assert_eq!(found[1].index, 0);
        assert!(scan_strings(&instructions, &["third".into()]).is_none());
        assert_eq!(scan_strings(&instructions, &[]), Some(vec![]));
    }
}
