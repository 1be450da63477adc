//! Calibration config errors. All fatal at load time: no trial may be
//! scored against a partially-valid config.

use super::error_code::{self, TrialscanErrorCode};
use super::expr_error::ExprError;

/// Errors from loading or validating a `CalibrationConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse config {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Invalid config value for {field}: {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Missing required bound: global.{field}")]
    MissingBound { field: String },

    #[error("Non-positive likelihood ratio for {context}: {value}")]
    NonPositiveLr { context: String, value: f64 },

    #[error("Failed to canonicalize config for hashing: {message}")]
    CanonicalizeFailed { message: String },

    #[error("Formula for {context} is invalid: {source}")]
    BadFormula {
        context: String,
        #[source]
        source: ExprError,
    },
}

impl TrialscanErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => error_code::CONFIG_NOT_FOUND,
            Self::ParseError { .. } => error_code::CONFIG_PARSE,
            Self::ValidationFailed { .. }
            | Self::MissingBound { .. }
            | Self::NonPositiveLr { .. }
            | Self::CanonicalizeFailed { .. }
            | Self::BadFormula { .. } => error_code::CONFIG_VALIDATION,
        }
    }
}
