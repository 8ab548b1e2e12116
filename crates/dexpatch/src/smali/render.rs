use std::collections::BTreeSet;
use std::fmt::Write;

use crate::bytecode::{ClassDef, Method};

/// Render a method as a smali listing
///
/// Branch targets are printed as `:L<index>` labels in front of the
/// instruction they point at.
pub fn render_method(method: &Method) -> String {
    let mut out = String::new();
    let flags = method.access_flags.keywords();
    let header = if flags.is_empty() {
        format!(".method {}", signature(method))
    } else {
        format!(".method {} {}", flags, signature(method))
    };

    let _ = writeln!(out, "{}", header);
    let _ = writeln!(out, "    .registers {}", method.registers);

    let targets: BTreeSet<usize> = method
        .instructions
        .iter()
        .filter_map(|i| i.target)
        .collect();

    for (index, instruction) in method.instructions.iter().enumerate() {
        if targets.contains(&index) {
            let _ = writeln!(out, "    :L{}", index);
        }
        let _ = writeln!(out, "    {}", instruction);
    }
    // a branch may point one past the last instruction
    if targets.contains(&method.instructions.len()) {
        let _ = writeln!(out, "    :L{}", method.instructions.len());
    }

    out.push_str(".end method\n");
    out
}

/// Render a class header followed by every method
pub fn render_class(class: &ClassDef) -> String {
    let mut out = String::new();
    let flags = class.access_flags.keywords();
    if flags.is_empty() {
        let _ = writeln!(out, ".class {}", class.descriptor);
    } else {
        let _ = writeln!(out, ".class {} {}", flags, class.descriptor);
    }
    if let Some(superclass) = &class.superclass {
        let _ = writeln!(out, ".super {}", superclass);
    }
    if let Some(source) = &class.source_file {
        let _ = writeln!(out, ".source \"{}\"", source);
    }

    for method in &class.methods {
        out.push('\n');
        out.push_str(&render_method(method));
    }
    out
}

fn signature(method: &Method) -> String {
    format!(
        "{}({}){}",
        method.name,
        method.parameters.concat(),
        method.return_type
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{AccessFlags, Instruction, Opcode};

    #[test]
    fn test_render_method_with_labels() {
        let mut method = Method::new(
            "La;",
            "check",
            vec!["I".into()],
            "Z",
            AccessFlags::PUBLIC | AccessFlags::STATIC,
        );
        method.registers = 2;
        method.instructions = vec![
            Instruction::new(Opcode::IfEqz).with_registers([1]).with_target(2),
            Instruction::new(Opcode::Const4).with_registers([1]).with_literal(1),
            Instruction::new(Opcode::Return).with_registers([1]),
        ];

        let listing = render_method(&method);
        let expected = "\
.method public static check(I)Z
    .registers 2
    if-eqz v1, :L2
    const/4 v1, 0x1
    :L2
    return v1
.end method
";
        assert_eq!(listing, expected);
    }

    #[test]
    fn test_render_class_header() {
        let class = ClassDef::new("Lapp/Player;");
        let listing = render_class(&class);
        assert!(listing.starts_with(".class public Lapp/Player;\n.super Ljava/lang/Object;\n"));
    }
}
