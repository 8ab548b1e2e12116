use serde::{Deserialize, Serialize};

use super::access::AccessFlags;
use super::method::Method;
use super::reference::MethodRef;

/// A class definition with its methods in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    /// Type descriptor, e.g. `Lcom/example/Player;`
    pub descriptor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(default)]
    pub access_flags: AccessFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(default)]
    pub methods: Vec<Method>,
}

impl ClassDef {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            superclass: Some("Ljava/lang/Object;".to_string()),
            access_flags: AccessFlags::PUBLIC,
            source_file: None,
            methods: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// Position of the method with the same name and signature
    pub fn method_index(&self, reference: &MethodRef) -> Option<usize> {
        self.methods.iter().position(|m| {
            m.name == reference.name
                && m.parameters == reference.parameters
                && m.return_type == reference.return_type
        })
    }

    /// Position of the first method with this name
    pub fn method_index_by_name(&self, name: &str) -> Option<usize> {
        self.methods.iter().position(|m| m.name == name)
    }

    /// Position of the first constructor
    pub fn constructor_index(&self) -> Option<usize> {
        self.methods.iter().position(|m| m.name == "<init>")
    }
}
