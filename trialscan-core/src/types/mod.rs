//! Shared record types: the evidence record consumed by the engine and the
//! immutable result records it emits.

pub mod audit;
pub mod context;
pub mod gate;
pub mod score;
pub mod signal;
pub mod study_card;

pub use audit::{AuditPayload, FiredSignalAudit, LrTerm, LrTermKind, StopRuleOutcome};
pub use context::{ClassHistory, SignalContext};
pub use gate::GateEvaluation;
pub use score::ScoreResult;
pub use signal::{EvidenceRef, Severity, SignalId, SignalResult};
pub use study_card::{
    AnalysisOutcome, AnalysisPlan, Blinding, EndpointKind, EndpointSpec, PowerAssumptions,
    StudyCard, SubgroupResult, SurvivalOutcome, TrialDesign, TrialResults, VersionEntry,
};
