//! The replayable audit payload.
//!
//! Carries every number and rule used to produce the final probability, so
//! `p_fail_final` can be recomputed byte-for-byte without re-reading the
//! original StudyCard.

use serde::{Deserialize, Serialize};

use crate::config::ResolvedBounds;
use super::signal::{EvidenceRef, Severity, SignalId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LrTermKind {
    /// LR contributed by a fired gate.
    Gate,
    /// LR contributed by a fired signal listed in `primitives`.
    Primitive,
}

/// One multiplicative evidence term, recorded before and after
/// winsorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LrTerm {
    /// Gate id ("G1") or signal id ("S9") depending on `kind`.
    pub source_id: String,
    pub kind: LrTermKind,
    pub lr_resolved: f64,
    pub lr_winsorized: f64,
    pub log_lr: f64,
}

/// Outcome of one stop rule against the fired-signal set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopRuleOutcome {
    pub rule_id: String,
    pub fired: bool,
    pub level: f64,
}

/// Raw inputs of one firing detector, captured for the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredSignalAudit {
    pub signal_id: SignalId,
    pub severity: Severity,
    pub value: Option<f64>,
    pub low_certainty: bool,
    pub evidence_refs: Vec<EvidenceRef>,
    pub rationale: String,
}

/// Complete replayable record for one (trial, run).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditPayload {
    pub trial_id: String,
    pub run_id: String,
    pub config_revision: String,
    pub config_hash: String,
    /// Clamp bounds in force for this run.
    pub bounds: ResolvedBounds,
    pub prior_supplied: f64,
    pub prior_clamped: f64,
    pub prior_was_clamped: bool,
    pub logit_prior: f64,
    pub lr_terms: Vec<LrTerm>,
    pub sum_log_lr: f64,
    pub logit_unclamped: f64,
    pub logit_post: f64,
    pub logit_was_clamped: bool,
    pub p_fail_base: f64,
    /// Every stop rule evaluated, fired or not.
    pub stop_rules: Vec<StopRuleOutcome>,
    pub p_fail_final: f64,
    pub fired_signals: Vec<FiredSignalAudit>,
}

impl AuditPayload {
    /// Serialize for persistence by the host.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialize a persisted payload.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
