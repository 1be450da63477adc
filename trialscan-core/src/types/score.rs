//! The final score record for one (trial, run).

use serde::{Deserialize, Serialize};

use super::audit::AuditPayload;

/// Immutable scoring outcome. Persistence is the host's concern; this crate
/// only emits the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub trial_id: String,
    pub run_id: String,
    /// Prior after clamping to `[prior_floor, prior_ceil]`.
    pub prior_pi: f64,
    pub logit_prior: f64,
    pub sum_log_lr: f64,
    pub logit_post: f64,
    /// Posterior before stop-rule overrides.
    pub p_fail_base: f64,
    /// Final probability, `>= p_fail_base` by construction.
    pub p_fail: f64,
    /// Ids of stop rules that fired.
    pub stop_rules_applied: Vec<String>,
    pub audit: AuditPayload,
}
