use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_AMBIGUOUS_NAMING: &str = "SEL-ERR-NAME-001";
pub const ERR_DUPLICATE_NAME: &str = "SEL-ERR-NAME-002";
pub const ERR_INVALID_NAME: &str = "SEL-ERR-NAME-003";
pub const ERR_UNKNOWN_REFERENCE: &str = "SEL-ERR-SCOPE-001";
pub const ERR_INVALID_DIRECTIVE: &str = "SEL-ERR-SPEC-001";
pub const ERR_UNKNOWN_FUNCTION: &str = "SEL-ERR-SPEC-002";
pub const ERR_JSON: &str = "SEL-ERR-SPEC-003";

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILE ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration errors found while compiling or loading a specification.
///
/// Every variant aborts the whole compilation; no partial selector mapping
/// is ever produced.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("node \"{node}\" declares both _name and _names")]
    AmbiguousNaming { node: String },

    #[error("selector name already in use: {name}")]
    DuplicateSelectorName { name: String },

    #[error("node \"{node}\" declares invalid selector name \"{name}\"")]
    InvalidSelectorName { node: String, name: String },

    #[error("node \"{node}\" references unknown selector \"{reference}\" in _stateToProps")]
    UnknownSelectorReference { node: String, reference: String },

    #[error("node \"{node}\" has invalid {directive}: {reason}")]
    InvalidDirective {
        node: String,
        directive: String,
        reason: String,
    },

    #[error("node \"{node}\" references unregistered function \"{name}\"")]
    UnknownFunction { node: String, name: String },

    #[error("specification is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CompileError {
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::AmbiguousNaming { .. } => ERR_AMBIGUOUS_NAMING,
            CompileError::DuplicateSelectorName { .. } => ERR_DUPLICATE_NAME,
            CompileError::InvalidSelectorName { .. } => ERR_INVALID_NAME,
            CompileError::UnknownSelectorReference { .. } => ERR_UNKNOWN_REFERENCE,
            CompileError::InvalidDirective { .. } => ERR_INVALID_DIRECTIVE,
            CompileError::UnknownFunction { .. } => ERR_UNKNOWN_FUNCTION,
            CompileError::Json(_) => ERR_JSON,
        }
    }

    /// The property of a compiled mapping that this error protects.
    pub fn guarantee(&self) -> &'static str {
        get_guarantee(self.code())
    }

    pub(crate) fn invalid_directive(node: &str, directive: &str, reason: impl Into<String>) -> Self {
        CompileError::InvalidDirective {
            node: node.to_string(),
            directive: directive.to_string(),
            reason: reason.into(),
        }
    }
}

fn get_guarantee(code: &str) -> &'static str {
    match code {
        ERR_AMBIGUOUS_NAMING => "A node is named either by _name or by _names, never both.",
        ERR_DUPLICATE_NAME => {
            "Every exported node resolves to exactly one selector name in the mapping."
        }
        ERR_INVALID_NAME => "Explicit selector names are plain identifiers.",
        ERR_UNKNOWN_REFERENCE => "Injected props are computed only from ancestors or nodes compiled earlier.",
        ERR_INVALID_DIRECTIVE => "Reserved directive keys carry payloads of their declared type.",
        ERR_UNKNOWN_FUNCTION => "Functions named by a loaded specification are registered.",
        ERR_JSON => "Specifications are loaded from well-formed JSON.",
        _ => "Unknown invariant.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAME VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

/// Checks an explicit `_name`, `_names` entry or `_alternative` value.
pub fn validate_explicit_name(node: &str, name: &str) -> Result<(), CompileError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(CompileError::InvalidSelectorName {
            node: node.to_string(),
            name: name.to_string(),
        })
    }
}
