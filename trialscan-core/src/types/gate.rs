//! Per-gate evaluation records.

use serde::{Deserialize, Serialize};

use super::signal::{EvidenceRef, SignalId};

/// Result of evaluating one gate formula against the fired-signal set.
/// Derived deterministically from SignalResults plus CalibrationConfig;
/// exists only for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateEvaluation {
    pub gate_id: String,
    pub fired: bool,
    /// Fired signals referenced by the gate's formula.
    pub supporting_signal_ids: Vec<SignalId>,
    /// Resolved likelihood ratio before winsorization. 1.0 for a gate that
    /// did not fire (log-LR contribution of zero).
    pub lr_used: f64,
    pub rationale: String,
    /// Aggregated from the supporting signals' evidence.
    pub evidence_refs: Vec<EvidenceRef>,
}
