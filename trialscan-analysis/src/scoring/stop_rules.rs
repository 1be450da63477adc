//! Stop rules: named conditions that force the final probability to at
//! least a configured level.

use rustc_hash::FxHashSet;

use trialscan_core::config::CalibrationConfig;
use trialscan_core::errors::ConfigError;
use trialscan_core::expr::GateExpr;
use trialscan_core::types::{SignalId, StopRuleOutcome};

/// One stop rule with its condition parsed.
pub struct CompiledStopRule {
    pub id: String,
    pub expr: GateExpr,
    pub level: f64,
}

/// Compile the catalog, in stable id order.
pub fn compile(config: &CalibrationConfig) -> Result<Vec<CompiledStopRule>, ConfigError> {
    config
        .stop_rules
        .iter()
        .map(|(id, spec)| {
            let expr = GateExpr::parse(&spec.when).map_err(|e| ConfigError::BadFormula {
                context: format!("stop_rules.{id}"),
                source: e,
            })?;
            Ok(CompiledStopRule {
                id: id.clone(),
                expr,
                level: spec.level,
            })
        })
        .collect()
}

/// Evaluate every rule against the fired-signal set. Every rule is
/// recorded, fired or not, for the audit trail.
pub fn evaluate(
    rules: &[CompiledStopRule],
    fired_ids: &FxHashSet<SignalId>,
) -> Vec<StopRuleOutcome> {
    rules
        .iter()
        .map(|rule| StopRuleOutcome {
            rule_id: rule.id.clone(),
            fired: rule.expr.eval(fired_ids),
            level: rule.level,
        })
        .collect()
}
