use thiserror::Error;

use super::span::SourceSpan;

pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown compilation error";

/// Why a compile produced no CSS.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Structured compiler error pointing into the input.
    #[error("{message}")]
    Exception { message: String, span: SourceSpan },
    /// Anything else the compiler raised, with whatever text it carried.
    #[error("{}", .0.as_deref().unwrap_or(UNKNOWN_ERROR_MESSAGE))]
    Unknown(Option<String>),
}

impl CompileError {
    pub fn span(&self) -> Option<&SourceSpan> {
        match self {
            CompileError::Exception { span, .. } => Some(span),
            CompileError::Unknown(_) => None,
        }
    }
}
