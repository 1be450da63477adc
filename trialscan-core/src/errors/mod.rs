//! Error handling for Trialscan.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod error_code;
pub mod expr_error;
pub mod pipeline_error;

pub use config_error::ConfigError;
pub use error_code::TrialscanErrorCode;
pub use expr_error::ExprError;
pub use pipeline_error::PipelineError;
