use crate::bytecode::{AccessFlags, Method, is_type_descriptor};
use crate::error::{Error, Result};

/// Builder for a method synthesized from scratch
///
/// ```ignore
/// let seek = MethodBuilder::new("seekTo", "Z")
///     .parameters(["J"])
///     .access_flags(AccessFlags::PUBLIC | AccessFlags::FINAL)
///     .registers(4)
///     .body("
///         const/4 v0, 0x1
///         return v0
///     ")
///     .build("Lapp/Player;")?;
/// pool.add_method(class, seek)?;
/// ```
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    name: String,
    parameters: Vec<String>,
    return_type: String,
    access_flags: AccessFlags,
    registers: Option<u16>,
    body: Option<String>,
}

impl MethodBuilder {
    pub fn new(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: return_type.into(),
            access_flags: AccessFlags::PUBLIC,
            registers: None,
            body: None,
        }
    }

    pub fn parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    pub fn access_flags(mut self, flags: AccessFlags) -> Self {
        self.access_flags = flags;
        self
    }

    /// Total register count, parameters included
    ///
    /// Defaults to just the parameter registers.
    pub fn registers(mut self, registers: u16) -> Self {
        self.registers = Some(registers);
        self
    }

    /// Smali body, assembled against the new method's register layout
    pub fn body(mut self, smali: impl Into<String>) -> Self {
        self.body = Some(smali.into());
        self
    }

    pub fn build(self, defining_class: &str) -> Result<Method> {
        if self.name.is_empty() {
            return Err(Error::InvalidMethod("method name is empty".to_string()));
        }
        if !is_type_descriptor(&self.return_type) {
            return Err(Error::InvalidDescriptor(self.return_type));
        }
        if let Some(parameter) = self
            .parameters
            .iter()
            .find(|p| p.as_str() == "V" || !is_type_descriptor(p))
        {
            return Err(Error::InvalidDescriptor(parameter.clone()));
        }

        let mut method = Method::new(
            defining_class,
            self.name,
            self.parameters,
            self.return_type,
            self.access_flags,
        );
        let needed = method.parameter_register_count();
        method.registers = self.registers.unwrap_or(needed);
        if method.registers < needed {
            return Err(Error::InvalidMethod(format!(
                "{} needs at least {} registers, got {}",
                method.descriptor(),
                needed,
                method.registers
            )));
        }

        if let Some(body) = &self.body {
            method.add_instructions(0, body)?;
        }
        Ok(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{ClassDef, ClassPool, Opcode};

    #[test]
    fn test_build_seek_helper() {
        let method = MethodBuilder::new("seekTo", "Z")
            .parameters(["J"])
            .access_flags(AccessFlags::PUBLIC | AccessFlags::FINAL)
            .registers(4)
            .body(
                "
                sget-object v0, Lapp/Source;->a:Lapp/Source;
                invoke-virtual {p0, p1, p2, v0}, Lapp/Player;->seek(JLapp/Source;)Z
                move-result p1
                return p1
                ",
            )
            .build("Lapp/Player;")
            .unwrap();

        assert_eq!(method.descriptor(), "Lapp/Player;->seekTo(J)Z");
        assert_eq!(method.instruction_count(), 4);
        assert_eq!(method.instructions[1].registers, vec![1, 2, 3, 0]);
        assert_eq!(method.instructions[3].opcode, Opcode::Return);

        let mut pool = ClassPool::from_classes(vec![ClassDef::new("Lapp/Player;")]);
        let class = pool.find_class("Lapp/Player;").unwrap();
        let id = pool.add_method(class, method.clone()).unwrap();
        assert_eq!(pool.method(id).name, "seekTo");
        assert!(matches!(
            pool.add_method(class, method),
            Err(Error::DuplicateMethod(_))
        ));
    }

    #[test]
    fn test_build_rejects_bad_shapes() {
        let too_few = MethodBuilder::new("seekTo", "Z").parameters(["J"]).registers(2);
        assert!(matches!(too_few.build("La;"), Err(Error::InvalidMethod(_))));

        let bad_param = MethodBuilder::new("f", "V").parameters(["V"]);
        assert!(matches!(bad_param.build("La;"), Err(Error::InvalidDescriptor(_))));

        let bad_body = MethodBuilder::new("f", "V").body("return-void v0");
        assert!(matches!(bad_body.build("La;"), Err(Error::Smali { .. })));
    }

    #[test]
    fn test_default_registers_cover_parameters() {
        let method = MethodBuilder::new("f", "V")
            .parameters(["I", "D"])
            .access_flags(AccessFlags::PUBLIC | AccessFlags::STATIC)
            .build("La;")
            .unwrap();
        assert_eq!(method.registers, 3);
        assert!(method.instructions.is_empty());
    }
}
