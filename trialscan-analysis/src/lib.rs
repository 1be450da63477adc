//! Evidence analysis for clinical-trial study cards: nine primitive signal
//! detectors, a declarative gate catalog, and a clamped log-odds scorer
//! producing an audit-replayable failure probability.
//!
//! The pipeline is strictly layered. Detectors read a [`StudyCard`] plus
//! read-only context and emit independent [`SignalResult`]s; gates combine
//! fired signals through configured boolean formulas; the scoring engine
//! folds gate likelihood ratios into the caller's prior under contractual
//! clamp bounds. Every number that feeds the final probability lands in the
//! audit payload, and [`audit::replay`] reproduces the result from that
//! payload alone.
//!
//! [`StudyCard`]: trialscan_core::types::StudyCard
//! [`SignalResult`]: trialscan_core::types::SignalResult

pub mod audit;
pub mod gates;
pub mod num;
pub mod pipeline;
pub mod scoring;
pub mod signals;

pub use audit::replay;
pub use gates::GateEngine;
pub use pipeline::{Pipeline, TrialEvaluation, TrialInput};
pub use scoring::ScoringEngine;
pub use signals::{SignalEvaluator, SignalRegistry};
