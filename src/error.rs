//! Error kinds surfaced to callers. None of them are fatal.

use thiserror::Error;

use crate::model::{BlockId, Uuid, ValueType};

/// Tree edit rejected; the program is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("block {0} not found")]
    BlockNotFound(BlockId),

    #[error("index {index} out of range for a block of {len} statements")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("statement {0} cannot be moved into its own nested block")]
    CyclicMove(Uuid),

    #[error("procedure `{0}` already exists")]
    ProcedureExists(String),
}

/// User-variable form errors; `field()` names the offending input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariableError {
    #[error("variable name is missing")]
    NameMissing,

    #[error("variable `{0}` already exists")]
    NameExists(String),

    #[error("variable value is missing")]
    ValueMissing,

    #[error("variables cannot have type `{0}`")]
    UnsupportedType(ValueType),
}

impl VariableError {
    pub fn field(&self) -> &'static str {
        match self {
            VariableError::NameMissing | VariableError::NameExists(_) => "name",
            VariableError::ValueMissing => "value",
            VariableError::UnsupportedType(_) => "type",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("name `{0}` is already taken")]
    NameTaken(String),
}

/// Import failed; whatever was loaded before stays untouched.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{path}: {message}")]
    Malformed { path: String, message: String },

    #[error("procedures already exist: {}", .0.join(", "))]
    DuplicateProcedures(Vec<String>),
}

impl ImportError {
    pub(crate) fn malformed(path: &str, message: impl Into<String>) -> Self {
        ImportError::Malformed {
            path: path.to_string(),
            message: message.into(),
        }
    }
}
