//! End-to-end evaluation pipeline: signals, then gates, then scoring.
//!
//! A `Pipeline` is built once from a validated calibration config and is
//! immutable afterwards, so batch runs over many trials share one compiled
//! gate catalog and may fan out across threads.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use trialscan_core::config::{CalibrationConfig, SignalThresholds};
use trialscan_core::errors::PipelineError;
use trialscan_core::types::{
    GateEvaluation, ScoreResult, SignalContext, SignalResult, StudyCard,
};

use crate::gates::GateEngine;
use crate::scoring::ScoringEngine;
use crate::signals::SignalRegistry;

/// One trial to evaluate: the card, its read-only context, and the
/// caller-supplied base-rate prior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialInput {
    pub card: StudyCard,
    #[serde(default)]
    pub context: SignalContext,
    pub prior_pi: f64,
}

/// Full evaluation output for one trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialEvaluation {
    pub signals: Vec<SignalResult>,
    pub gates: Vec<GateEvaluation>,
    pub score: ScoreResult,
}

pub struct Pipeline {
    registry: SignalRegistry,
    gate_engine: GateEngine,
    scoring_engine: ScoringEngine,
    thresholds: SignalThresholds,
}

impl Pipeline {
    /// Build from a validated config. Formula compilation errors surface
    /// here, before any trial is touched.
    pub fn new(config: &CalibrationConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            registry: SignalRegistry::with_defaults(),
            gate_engine: GateEngine::new(config)?,
            scoring_engine: ScoringEngine::new(config)?,
            thresholds: config.signals.clone(),
        })
    }

    /// Replace the default detector set.
    pub fn with_registry(mut self, registry: SignalRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Evaluate one trial. Deterministic: the same input, config, and
    /// `run_id` produce a byte-identical evaluation.
    pub fn score_trial(&self, run_id: &str, input: &TrialInput) -> TrialEvaluation {
        let signals = self
            .registry
            .evaluate_all(&input.card, &input.context, &self.thresholds);
        let gates = self.gate_engine.evaluate(&signals);
        let score = self.scoring_engine.score(
            &input.card.trial_id,
            run_id,
            input.prior_pi,
            &signals,
            &gates,
        );
        tracing::info!(
            trial = %input.card.trial_id,
            run = run_id,
            fired = signals.iter().filter(|s| s.fired).count(),
            gates_fired = gates.iter().filter(|g| g.fired).count(),
            p_fail = score.p_fail,
            "trial scored"
        );
        TrialEvaluation {
            signals,
            gates,
            score,
        }
    }

    /// Evaluate a batch in parallel. Output order matches input order.
    pub fn score_trials(&self, run_id: &str, inputs: &[TrialInput]) -> Vec<TrialEvaluation> {
        inputs
            .par_iter()
            .map(|input| self.score_trial(run_id, input))
            .collect()
    }
}
