//! Gate formula parse errors.

use super::error_code::{self, TrialscanErrorCode};

/// Errors from parsing a boolean gate/stop-rule formula.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    #[error("Unexpected token `{found}` at position {pos}")]
    UnexpectedToken { pos: usize, found: String },

    #[error("Formula ended unexpectedly")]
    UnexpectedEnd,

    #[error("Unknown signal id `{id}`")]
    UnknownSignal { id: String },

    #[error("Trailing input at position {pos}")]
    TrailingInput { pos: usize },
}

impl TrialscanErrorCode for ExprError {
    fn error_code(&self) -> &'static str {
        error_code::EXPR_PARSE
    }
}
