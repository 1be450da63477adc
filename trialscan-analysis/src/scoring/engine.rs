//! ScoringEngine: clamped log-odds Bayesian combiner.
//!
//! Contractual clamp order: clamp the prior, winsorize each LR into
//! `[lr_min, lr_max]` before its logarithm, sum the log-LRs without
//! intermediate clamping, clamp the summed logit into
//! `[logit_min, logit_max]`, then apply stop-rule overrides. Stop-rule
//! application is monotone: the final probability never falls below the
//! base posterior.

use rustc_hash::FxHashSet;

use trialscan_core::config::{CalibrationConfig, ResolvedBounds};
use trialscan_core::errors::ConfigError;
use trialscan_core::types::{
    AuditPayload, FiredSignalAudit, GateEvaluation, LrTerm, LrTermKind, ScoreResult,
    SignalId, SignalResult,
};

use crate::num::{logit, sigmoid, winsorize};

use super::stop_rules::{self, CompiledStopRule};

pub struct ScoringEngine {
    bounds: ResolvedBounds,
    stop_rules: Vec<CompiledStopRule>,
    config_revision: String,
    config_hash: String,
    primitive_lrs: Vec<(SignalId, f64)>,
}

impl ScoringEngine {
    pub fn new(config: &CalibrationConfig) -> Result<Self, ConfigError> {
        let bounds = config.resolved_bounds()?;
        let stop_rules = stop_rules::compile(config)?;

        // Primitive contributions, resolved once; validation guarantees a
        // default LR exists for listed signals without an override.
        let mut primitive_lrs = Vec::new();
        for id in &config.primitives.signals {
            let Some(signal_id) = SignalId::parse(id) else {
                return Err(ConfigError::ValidationFailed {
                    field: "primitives.signals".to_string(),
                    message: format!("unknown signal id `{id}`"),
                });
            };
            let lr = config
                .primitives
                .overrides
                .get(id)
                .copied()
                .or(config.primitives.default_lr);
            let Some(lr) = lr else {
                return Err(ConfigError::ValidationFailed {
                    field: "primitives.default_lr".to_string(),
                    message: format!("no LR available for `{id}`"),
                });
            };
            primitive_lrs.push((signal_id, lr));
        }

        Ok(Self {
            bounds,
            stop_rules,
            config_revision: config.revision.clone().unwrap_or_else(|| "unversioned".to_string()),
            config_hash: config.content_hash()?,
            primitive_lrs,
        })
    }

    /// Combine the prior with fired gates' (and primitives') LRs.
    pub fn score(
        &self,
        trial_id: &str,
        run_id: &str,
        prior_pi: f64,
        signals: &[SignalResult],
        gates: &[GateEvaluation],
    ) -> ScoreResult {
        let b = self.bounds;

        // 1. Clamp the prior. An out-of-range caller value is accepted but
        // the clamp is recorded, never hidden.
        let prior_clamped = if prior_pi.is_finite() {
            prior_pi.clamp(b.prior_floor, b.prior_ceil)
        } else {
            b.prior_floor
        };
        let prior_was_clamped = prior_clamped != prior_pi;
        if prior_was_clamped {
            tracing::warn!(
                trial = trial_id,
                supplied = prior_pi,
                clamped = prior_clamped,
                "prior clamped into configured range"
            );
        }
        let logit_prior = logit(prior_clamped);

        // 2. Winsorize each LR, then accumulate its logarithm. Gates first
        // (catalog order), then primitives (configured order).
        let mut lr_terms = Vec::new();
        for gate in gates.iter().filter(|g| g.fired) {
            lr_terms.push(Self::term(gate.gate_id.clone(), LrTermKind::Gate, gate.lr_used, b));
        }
        for (signal_id, lr) in &self.primitive_lrs {
            if signals.iter().any(|s| s.fired && s.signal_id == *signal_id) {
                lr_terms.push(Self::term(
                    signal_id.as_str().to_string(),
                    LrTermKind::Primitive,
                    *lr,
                    b,
                ));
            }
        }
        let sum_log_lr: f64 = lr_terms.iter().map(|t| t.log_lr).sum();

        // 3. Clamp only the summed logit, never partial sums.
        let logit_unclamped = logit_prior + sum_log_lr;
        let logit_post = logit_unclamped.clamp(b.logit_min, b.logit_max);
        let logit_was_clamped = logit_post != logit_unclamped;

        // 4. Base posterior.
        let p_fail_base = sigmoid(logit_post);

        // 5. Stop-rule overrides: monotone by construction.
        let fired_ids: FxHashSet<SignalId> = signals
            .iter()
            .filter(|s| s.fired)
            .map(|s| s.signal_id)
            .collect();
        let stop_outcomes = stop_rules::evaluate(&self.stop_rules, &fired_ids);
        let mut p_fail_final = p_fail_base;
        for outcome in stop_outcomes.iter().filter(|o| o.fired) {
            p_fail_final = p_fail_final.max(outcome.level);
        }
        let stop_rules_applied: Vec<String> = stop_outcomes
            .iter()
            .filter(|o| o.fired)
            .map(|o| o.rule_id.clone())
            .collect();

        let fired_signals = signals
            .iter()
            .filter(|s| s.fired)
            .map(|s| FiredSignalAudit {
                signal_id: s.signal_id,
                severity: s.severity,
                value: s.value,
                low_certainty: s.low_certainty,
                evidence_refs: s.evidence_refs.to_vec(),
                rationale: s.rationale.clone(),
            })
            .collect();

        let audit = AuditPayload {
            trial_id: trial_id.to_string(),
            run_id: run_id.to_string(),
            config_revision: self.config_revision.clone(),
            config_hash: self.config_hash.clone(),
            bounds: b,
            prior_supplied: prior_pi,
            prior_clamped,
            prior_was_clamped,
            logit_prior,
            lr_terms,
            sum_log_lr,
            logit_unclamped,
            logit_post,
            logit_was_clamped,
            p_fail_base,
            stop_rules: stop_outcomes,
            p_fail_final,
            fired_signals,
        };

        ScoreResult {
            trial_id: trial_id.to_string(),
            run_id: run_id.to_string(),
            prior_pi: prior_clamped,
            logit_prior,
            sum_log_lr,
            logit_post,
            p_fail_base,
            p_fail: p_fail_final,
            stop_rules_applied,
            audit,
        }
    }

    fn term(source_id: String, kind: LrTermKind, lr_resolved: f64, b: ResolvedBounds) -> LrTerm {
        let lr_winsorized = winsorize(lr_resolved, b.lr_min, b.lr_max);
        LrTerm {
            source_id,
            kind,
            lr_resolved,
            lr_winsorized,
            log_lr: lr_winsorized.ln(),
        }
    }
}
