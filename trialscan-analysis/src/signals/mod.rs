//! Signal detectors S1-S9.
//!
//! Each detector is a pure function of the StudyCard plus read-only
//! context: identical inputs produce identical results, and detectors never
//! guess: missing evidence means `fired = false` with an explicit
//! rationale. Precision over recall is the governing policy.

pub mod endpoint_change;
pub mod interim;
pub mod plausibility;
pub mod populations;
pub mod power;
pub mod pvalue_heaping;
pub mod single_arm;
pub mod subgroup;
pub mod survival;

#[cfg(test)]
pub(crate) mod test_support;

use trialscan_core::config::SignalThresholds;
use trialscan_core::types::{SignalContext, SignalId, SignalResult, StudyCard};

pub use endpoint_change::EndpointChangeSignal;
pub use interim::InterimLooksSignal;
pub use plausibility::EffectPlausibilitySignal;
pub use populations::PopulationContradictionSignal;
pub use power::UnderpoweredSignal;
pub use pvalue_heaping::PvalueHeapingSignal;
pub use single_arm::SingleArmSignal;
pub use subgroup::SubgroupOnlyWinSignal;
pub use survival::OsPfsContradictionSignal;

/// A primitive evidence-pattern detector.
///
/// Implementations must be pure: no clock, no RNG, no I/O. They read the
/// shared immutable inputs and write one independent result, so the
/// registry may run them in any order, or in parallel, with identical
/// outcomes.
pub trait SignalEvaluator: Send + Sync {
    fn id(&self) -> SignalId;
    fn name(&self) -> &'static str;
    fn evaluate(
        &self,
        card: &StudyCard,
        ctx: &SignalContext,
        thresholds: &SignalThresholds,
    ) -> SignalResult;
}

/// Registry of the nine detectors, in stable id order.
pub struct SignalRegistry {
    evaluators: Vec<Box<dyn SignalEvaluator>>,
}

impl SignalRegistry {
    /// All nine default detectors.
    pub fn with_defaults() -> Self {
        let evaluators: Vec<Box<dyn SignalEvaluator>> = vec![
            Box::new(EndpointChangeSignal),
            Box::new(UnderpoweredSignal),
            Box::new(SubgroupOnlyWinSignal),
            Box::new(PopulationContradictionSignal),
            Box::new(EffectPlausibilitySignal),
            Box::new(InterimLooksSignal),
            Box::new(SingleArmSignal),
            Box::new(PvalueHeapingSignal),
            Box::new(OsPfsContradictionSignal),
        ];
        Self { evaluators }
    }

    /// A custom detector set (for hosts that disable or replace detectors).
    pub fn with_evaluators(evaluators: Vec<Box<dyn SignalEvaluator>>) -> Self {
        Self { evaluators }
    }

    /// Evaluate every registered detector, returning results sorted by
    /// signal id.
    pub fn evaluate_all(
        &self,
        card: &StudyCard,
        ctx: &SignalContext,
        thresholds: &SignalThresholds,
    ) -> Vec<SignalResult> {
        let mut results: Vec<SignalResult> = self
            .evaluators
            .iter()
            .map(|e| {
                let result = e.evaluate(card, ctx, thresholds);
                if result.fired {
                    tracing::debug!(
                        trial = %card.trial_id,
                        signal = %result.signal_id,
                        severity = %result.severity,
                        low_certainty = result.low_certainty,
                        "signal fired"
                    );
                }
                result
            })
            .collect();
        results.sort_by_key(|r| r.signal_id);
        results
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }
}

pub(crate) const INSUFFICIENT_EVIDENCE: &str = "insufficient evidence";
