//! References carried by instructions: methods, fields, types, strings, and
//! the method handles, method types and call sites of `invoke-custom` code.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::opcode::ReferenceKind;
use crate::error::{Error, Result};

const PRIMITIVES: &str = "ZBSCIJFDV";

/// Split a concatenated list of type descriptors, e.g. `JLjava/lang/String;[I`
pub fn parse_type_list(descriptors: &str) -> Result<Vec<String>> {
    let mut types = Vec::new();
    let mut chars = descriptors.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let mut current = c;
        // array dimensions prefix the element type
        while current == '[' {
            match chars.next() {
                Some((_, next)) => current = next,
                None => return Err(Error::InvalidDescriptor(descriptors.to_string())),
            }
        }

        let end = if current == 'L' {
            loop {
                match chars.next() {
                    Some((i, ';')) => break i + 1,
                    Some(_) => continue,
                    None => return Err(Error::InvalidDescriptor(descriptors.to_string())),
                }
            }
        } else if PRIMITIVES.contains(current) {
            match chars.peek() {
                Some((i, _)) => *i,
                None => descriptors.len(),
            }
        } else {
            return Err(Error::InvalidDescriptor(descriptors.to_string()));
        };

        types.push(descriptors[start..end].to_string());
    }

    Ok(types)
}

/// Check that a string is exactly one type descriptor
pub fn is_type_descriptor(descriptor: &str) -> bool {
    matches!(parse_type_list(descriptor), Ok(types) if types.len() == 1)
}

/// Number of registers a value of this type occupies
pub fn register_width(descriptor: &str) -> u16 {
    match descriptor {
        "J" | "D" => 2,
        _ => 1,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MethodRef {
    pub defining_class: String,
    pub name: String,
    pub parameters: Vec<String>,
    pub return_type: String,
}

impl MethodRef {
    pub fn new(
        defining_class: impl Into<String>,
        name: impl Into<String>,
        parameters: Vec<String>,
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            defining_class: defining_class.into(),
            name: name.into(),
            parameters,
            return_type: return_type.into(),
        }
    }

    /// Same name, parameters and return type, ignoring the defining class
    pub fn same_signature(&self, other: &MethodRef) -> bool {
        self.name == other.name
            && self.parameters == other.parameters
            && self.return_type == other.return_type
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}->{}({}){}",
            self.defining_class,
            self.name,
            self.parameters.concat(),
            self.return_type
        )
    }
}

impl FromStr for MethodRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidDescriptor(s.to_string());
        let (class, rest) = s.trim().split_once("->").ok_or_else(invalid)?;
        let open = rest.find('(').ok_or_else(invalid)?;
        let close = rest.rfind(')').ok_or_else(invalid)?;
        if close < open || open == 0 {
            return Err(invalid());
        }

        let return_type = &rest[close + 1..];
        if !is_type_descriptor(class) || !is_type_descriptor(return_type) {
            return Err(invalid());
        }

        Ok(Self {
            defining_class: class.to_string(),
            name: rest[..open].to_string(),
            parameters: parse_type_list(&rest[open + 1..close])?,
            return_type: return_type.to_string(),
        })
    }
}

impl TryFrom<String> for MethodRef {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MethodRef> for String {
    fn from(value: MethodRef) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldRef {
    pub defining_class: String,
    pub name: String,
    pub field_type: String,
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}:{}", self.defining_class, self.name, self.field_type)
    }
}

impl FromStr for FieldRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidDescriptor(s.to_string());
        let (class, rest) = s.trim().split_once("->").ok_or_else(invalid)?;
        let (name, field_type) = rest.split_once(':').ok_or_else(invalid)?;
        if name.is_empty() || !is_type_descriptor(class) || !is_type_descriptor(field_type) {
            return Err(invalid());
        }

        Ok(Self {
            defining_class: class.to_string(),
            name: name.to_string(),
            field_type: field_type.to_string(),
        })
    }
}

impl TryFrom<String> for FieldRef {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FieldRef> for String {
    fn from(value: FieldRef) -> Self {
        value.to_string()
    }
}

/// Reference operand of an instruction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reference {
    Method(MethodRef),
    Field(FieldRef),
    Type(String),
    String(String),
    /// `invoke-static@La;->b()V`
    MethodHandle(String),
    /// A bare prototype, `(I)V`
    MethodType(String),
    /// Call site as smali prints it; never resolved
    CallSite(String),
}

impl Reference {
    pub fn kind(&self) -> ReferenceKind {
        match self {
            Reference::Method(_) => ReferenceKind::Method,
            Reference::Field(_) => ReferenceKind::Field,
            Reference::Type(_) => ReferenceKind::Type,
            Reference::String(_) => ReferenceKind::String,
            Reference::MethodHandle(_) => ReferenceKind::MethodHandle,
            Reference::MethodType(_) => ReferenceKind::MethodType,
            Reference::CallSite(_) => ReferenceKind::CallSite,
        }
    }

    /// Parse the reference operand of an instruction of the given kind
    pub fn parse(kind: ReferenceKind, text: &str) -> Result<Self> {
        let text = text.trim();
        match kind {
            ReferenceKind::Method => Ok(Reference::Method(text.parse()?)),
            ReferenceKind::Field => Ok(Reference::Field(text.parse()?)),
            ReferenceKind::Type if is_type_descriptor(text) => Ok(Reference::Type(text.to_string())),
            ReferenceKind::Type => Err(Error::InvalidDescriptor(text.to_string())),
            ReferenceKind::String => unquote(text).map(Reference::String),
            // `invoke-*@` handles name a method, `*-get@` / `*-put@` handles a field
            ReferenceKind::MethodHandle => match text.split_once('@') {
                Some((kind, member))
                    if !kind.is_empty()
                        && (member.parse::<MethodRef>().is_ok()
                            || member.parse::<FieldRef>().is_ok()) =>
                {
                    Ok(Reference::MethodHandle(text.to_string()))
                }
                _ => Err(Error::InvalidDescriptor(text.to_string())),
            },
            ReferenceKind::MethodType if is_prototype(text) => {
                Ok(Reference::MethodType(text.to_string()))
            }
            ReferenceKind::MethodType => Err(Error::InvalidDescriptor(text.to_string())),
            ReferenceKind::CallSite if !text.is_empty() => Ok(Reference::CallSite(text.to_string())),
            ReferenceKind::CallSite => Err(Error::InvalidDescriptor(text.to_string())),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Method(method) => method.fmt(f),
            Reference::Field(field) => field.fmt(f),
            Reference::Type(descriptor) => f.write_str(descriptor),
            Reference::String(value) => write!(f, "\"{}\"", escape(value)),
            Reference::MethodHandle(text)
            | Reference::MethodType(text)
            | Reference::CallSite(text) => f.write_str(text),
        }
    }
}

/// `(params)return`, e.g. `(ILjava/lang/String;)V`
pub fn is_prototype(text: &str) -> bool {
    let Some(rest) = text.strip_prefix('(') else {
        return false;
    };
    match rest.split_once(')') {
        Some((parameters, return_type)) => {
            parse_type_list(parameters).is_ok() && is_type_descriptor(return_type)
        }
        None => false,
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn unquote(text: &str) -> Result<String> {
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .ok_or_else(|| Error::InvalidDescriptor(text.to_string()))?;

    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some(other) => value.push(other),
            None => return Err(Error::InvalidDescriptor(text.to_string())),
        }
    }
    Ok(value)
}
