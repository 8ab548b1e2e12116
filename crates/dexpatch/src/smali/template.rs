use std::collections::HashMap;
use std::fmt::Display;

use crate::error::{Error, Result};

/// Smali text with `${name}` placeholders
///
/// Placeholders are bound to values (registers, descriptors, resource ids)
/// before the text is assembled. The `${` form never collides with inner
/// class descriptors such as `Lapp/Player$Listener;`.
#[derive(Debug, Clone, Default)]
pub struct Template {
    text: String,
    bindings: HashMap<String, String>,
}

impl Template {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bindings: HashMap::new(),
        }
    }

    pub fn bind(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.bindings.insert(name.into(), value.to_string());
        self
    }

    /// Bind a register number as `vN`
    pub fn bind_register(self, name: impl Into<String>, register: u16) -> Self {
        self.bind(name, format!("v{}", register))
    }

    /// Substitute every placeholder; unbound placeholders are an error
    pub fn render(&self) -> Result<String> {
        let mut output = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();
        let mut line = 1;

        while let Some(start) = rest.find("${") {
            let (before, after) = rest.split_at(start);
            line += before.matches('\n').count();
            output.push_str(before);

            let end = after
                .find('}')
                .ok_or_else(|| Error::smali(line, "unterminated placeholder"))?;
            let name = &after[2..end];
            let value = self
                .bindings
                .get(name)
                .ok_or_else(|| Error::smali(line, format!("unbound placeholder '${{{}}}'", name)))?;
            output.push_str(value);
            rest = &after[end + 1..];
        }

        output.push_str(rest);
        Ok(output)
    }
}
