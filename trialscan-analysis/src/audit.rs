//! Audit replay.
//!
//! The payload assembled by the scoring engine carries every number used to
//! produce the final probability. `replay` recomputes `p_fail_final` from
//! those embedded numbers alone (same helpers, same order), so a persisted
//! payload reproduces the original value exactly.

use trialscan_core::types::AuditPayload;

use crate::num::{logit, sigmoid, winsorize};

/// Recompute the final failure probability from the payload's raw numbers,
/// without the original StudyCard.
pub fn replay(payload: &AuditPayload) -> f64 {
    let b = payload.bounds;

    let prior = if payload.prior_supplied.is_finite() {
        payload.prior_supplied.clamp(b.prior_floor, b.prior_ceil)
    } else {
        b.prior_floor
    };
    let logit_prior = logit(prior);

    let sum_log_lr: f64 = payload
        .lr_terms
        .iter()
        .map(|t| winsorize(t.lr_resolved, b.lr_min, b.lr_max).ln())
        .sum();

    let logit_post = (logit_prior + sum_log_lr).clamp(b.logit_min, b.logit_max);
    let mut p_fail = sigmoid(logit_post);
    for rule in payload.stop_rules.iter().filter(|r| r.fired) {
        p_fail = p_fail.max(rule.level);
    }
    p_fail
}
