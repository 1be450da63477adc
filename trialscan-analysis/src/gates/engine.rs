//! GateEngine: evaluates the configured gate catalog.
//!
//! Gates are boolean formulas over signal ids, evaluated generically with no
//! per-gate branches. A gate that does not fire is still recorded, with an
//! LR of 1 (log-LR contribution of zero).

use rustc_hash::FxHashSet;

use trialscan_core::config::{CalibrationConfig, SeverityLrs};
use trialscan_core::errors::ConfigError;
use trialscan_core::expr::GateExpr;
use trialscan_core::types::{GateEvaluation, Severity, SignalId, SignalResult};

/// One gate with its formula parsed.
pub struct CompiledGate {
    pub id: String,
    pub expr: GateExpr,
    pub lr: f64,
    pub by_severity: Option<SeverityLrs>,
}

/// Evaluates the gate catalog against a run's SignalResults.
pub struct GateEngine {
    gates: Vec<CompiledGate>,
}

impl GateEngine {
    /// Compile the catalog. The config is already validated, but formula
    /// errors are still surfaced rather than assumed away.
    pub fn new(config: &CalibrationConfig) -> Result<Self, ConfigError> {
        let gates = config
            .gates
            .iter()
            .map(|(id, spec)| {
                let expr =
                    GateExpr::parse(&spec.when).map_err(|e| ConfigError::BadFormula {
                        context: format!("gates.{id}"),
                        source: e,
                    })?;
                Ok(CompiledGate {
                    id: id.clone(),
                    expr,
                    lr: spec.lr,
                    by_severity: spec.by_severity,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { gates })
    }

    /// Evaluate every gate, in catalog order.
    pub fn evaluate(&self, signals: &[SignalResult]) -> Vec<GateEvaluation> {
        let fired_ids: FxHashSet<SignalId> = signals
            .iter()
            .filter(|s| s.fired)
            .map(|s| s.signal_id)
            .collect();

        self.gates
            .iter()
            .map(|gate| self.evaluate_gate(gate, signals, &fired_ids))
            .collect()
    }

    fn evaluate_gate(
        &self,
        gate: &CompiledGate,
        signals: &[SignalResult],
        fired_ids: &FxHashSet<SignalId>,
    ) -> GateEvaluation {
        if !gate.expr.eval(fired_ids) {
            return GateEvaluation {
                gate_id: gate.id.clone(),
                fired: false,
                supporting_signal_ids: Vec::new(),
                lr_used: 1.0,
                rationale: format!("formula `{}` not satisfied", gate.expr),
                evidence_refs: Vec::new(),
            };
        }

        let supporting: Vec<SignalId> = gate
            .expr
            .signals()
            .into_iter()
            .filter(|id| fired_ids.contains(id))
            .collect();
        let supporting_results: Vec<&SignalResult> = signals
            .iter()
            .filter(|s| s.fired && supporting.contains(&s.signal_id))
            .collect();

        // Severity-tiered LR: the maximum severity among supporting fired
        // signals picks the tier, conservative in the risk direction.
        let lr_used = match (&gate.by_severity, self.max_severity(&supporting_results)) {
            (Some(tiers), Some(severity)) => match severity {
                Severity::Low => tiers.low,
                Severity::Med => tiers.med,
                Severity::High => tiers.high,
            },
            _ => gate.lr,
        };

        let evidence_refs = supporting_results
            .iter()
            .flat_map(|s| s.evidence_refs.iter().cloned())
            .collect();
        let supporting_list = supporting
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        GateEvaluation {
            gate_id: gate.id.clone(),
            fired: true,
            supporting_signal_ids: supporting,
            lr_used,
            rationale: format!(
                "formula `{}` satisfied by fired signals [{supporting_list}] (LR {lr_used})",
                gate.expr
            ),
            evidence_refs,
        }
    }

    fn max_severity(&self, supporting: &[&SignalResult]) -> Option<Severity> {
        supporting.iter().map(|s| s.severity).max()
    }
}
