use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Fingerprint '{fingerprint}' did not match any method")]
    ResolutionFailed { fingerprint: String },

    #[error("Fingerprint '{fingerprint}' is scoped to '{parent}', which is not resolved")]
    ParentNotResolved { fingerprint: String, parent: String },

    #[error("Fingerprint '{fingerprint}' declares no opcode pattern")]
    NoPatternScan { fingerprint: String },

    #[error("Reference #{nth} not found in {method} (walk step {step})")]
    ReferenceNotFound {
        method: String,
        step: usize,
        nth: usize,
    },

    #[error("Referenced method is not part of the class pool: {reference}")]
    UnresolvableReference { reference: String },

    #[error("Invalid opcode pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid walk step: {0}")]
    InvalidWalkStep(String),

    #[error("Resource not found: {resource_type}/{name}")]
    ResourceNotFound { resource_type: String, name: String },

    #[error("Invalid resource table: {0}")]
    InvalidResourceTable(String),

    #[error("Index {index} is out of bounds for {method} ({len} instructions)")]
    IndexOutOfBounds {
        method: String,
        index: usize,
        len: usize,
    },

    #[error("Unexpected instruction at {method}[{index}]: expected {expected}, found {found}")]
    UnexpectedInstruction {
        method: String,
        index: usize,
        expected: String,
        found: String,
    },

    #[error("Class not found: {0}")]
    ClassNotFound(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Class already exists: {0}")]
    DuplicateClass(String),

    #[error("Method already exists: {0}")]
    DuplicateMethod(String),

    #[error("Invalid method definition: {0}")]
    InvalidMethod(String),

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Mark #{0} belongs to another editor")]
    ForeignMark(usize),

    #[error("Hook point not registered: {0}")]
    HookNotFound(String),

    #[error("Hook point in {method} lost its anchor `{anchor}`")]
    HookPointLost { method: String, anchor: String },

    #[error("Smali error on line {line}: {message}")]
    Smali { line: usize, message: String },

    #[error("No patch named '{0}'")]
    PatchNotFound(String),

    #[error("Patch '{patch}' depends on unknown patch '{dependency}'")]
    UnknownDependency { patch: String, dependency: String },

    #[error("Dependency cycle involving patch '{0}'")]
    DependencyCycle(String),

    #[error("Patch '{patch}' failed: {source}")]
    PatchFailed {
        patch: String,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn smali(line: usize, message: impl Into<String>) -> Self {
        Error::Smali {
            line,
            message: message.into(),
        }
    }

    /// Check if this error means a fingerprint or walk target was not found
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::ResolutionFailed { .. }
            | Error::ParentNotResolved { .. }
            | Error::ReferenceNotFound { .. }
            | Error::UnresolvableReference { .. } => true,
            Error::PatchFailed { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_not_found() {
        let err = Error::ResolutionFailed {
            fingerprint: "VideoEnd".to_string(),
        };
        assert!(err.is_not_found());

        let wrapped = Error::PatchFailed {
            patch: "video-information".to_string(),
            source: Box::new(err),
        };
        assert!(wrapped.is_not_found());

        let other = Error::ClassNotFound("Lfoo;".to_string());
        assert!(!other.is_not_found());
    }

    #[test]
    fn test_patch_failed_message_includes_cause() {
        let err = Error::PatchFailed {
            patch: "wide-search-bar".to_string(),
            source: Box::new(Error::ResolutionFailed {
                fingerprint: "LayoutSwitch".to_string(),
            }),
        };
        let message = err.to_string();
        assert!(message.contains("wide-search-bar"));
        assert!(message.contains("LayoutSwitch"));
    }
}
