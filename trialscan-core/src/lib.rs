//! Core types, errors, calibration config, and tracing for Trialscan.
//!
//! Everything the scoring engine shares with its host lives here: the
//! read-only evidence record (`StudyCard`), the emitted result records
//! (`SignalResult`, `GateEvaluation`, `ScoreResult`), the boolean formula
//! language used by gates and stop rules, and the versioned
//! `CalibrationConfig` with its load-time validation.

pub mod config;
pub mod errors;
pub mod expr;
pub mod logging;
pub mod types;

pub use config::{CalibrationConfig, ResolvedBounds, SignalThresholds};
pub use errors::{ConfigError, ExprError, PipelineError, TrialscanErrorCode};
pub use expr::GateExpr;
pub use types::{
    AuditPayload, EvidenceRef, GateEvaluation, ScoreResult, Severity, SignalContext, SignalId,
    SignalResult, StudyCard,
};
