use std::fmt;

use crate::registry::Namespace;

/// Errors raised while building a run. Evaluation itself never fails:
/// numeric hazards are clamped where they arise.
#[derive(Debug, Clone, PartialEq)]
pub enum SetupError {
    UnknownIdentifier { namespace: Namespace, name: String },
    MissingParameter(String),
    InvalidConfiguration(String),
}

impl SetupError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SetupError::InvalidConfiguration(msg.into())
    }
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::UnknownIdentifier { namespace, name } => {
                write!(f, "unknown {namespace} '{name}'")
            }
            SetupError::MissingParameter(name) => write!(f, "missing parameter '{name}'"),
            SetupError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for SetupError {}

pub type Result<T> = std::result::Result<T, SetupError>;
