//! Pipeline errors. Aggregates subsystem errors via `From` conversions.
//!
//! Note the deliberate asymmetry: config problems are fatal, while missing
//! or malformed per-trial evidence is never an error; detectors simply do
//! not fire. Formula parse errors surface as `ConfigError::BadFormula`
//! since formulas only ever arrive through the calibration config.

use super::config_error::ConfigError;
use super::error_code::TrialscanErrorCode;

/// Errors that can abort a scoring run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl TrialscanErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
        }
    }
}
