//! S5: claimed effect size implausible against the historical graveyard.
//!
//! In a class flagged historically high-failure, a claimed effect at or
//! above what historically *successful* trials achieved is itself evidence
//! of trouble.

use smallvec::{smallvec, SmallVec};

use trialscan_core::config::SignalThresholds;
use trialscan_core::types::{
    EvidenceRef, Severity, SignalContext, SignalId, SignalResult, StudyCard,
};

use super::{SignalEvaluator, INSUFFICIENT_EVIDENCE};

pub struct EffectPlausibilitySignal;

impl SignalEvaluator for EffectPlausibilitySignal {
    fn id(&self) -> SignalId {
        SignalId::S5
    }

    fn name(&self) -> &'static str {
        "Effect size implausible vs. historical graveyard"
    }

    fn evaluate(
        &self,
        card: &StudyCard,
        ctx: &SignalContext,
        _thresholds: &SignalThresholds,
    ) -> SignalResult {
        let Some(history) = ctx.class_history.as_ref() else {
            return SignalResult::quiet(SignalId::S5, INSUFFICIENT_EVIDENCE);
        };
        let Some(effect) = card.results.claimed_effect_size else {
            return SignalResult::quiet(SignalId::S5, INSUFFICIENT_EVIDENCE);
        };
        if !history.graveyard {
            return SignalResult::quiet(
                SignalId::S5,
                "class is not flagged historically high-failure",
            );
        }
        let Some(p75) = history.success_p75 else {
            return SignalResult::quiet(SignalId::S5, INSUFFICIENT_EVIDENCE);
        };
        if effect < p75 {
            return SignalResult::quiet(
                SignalId::S5,
                format!(
                    "claimed effect {effect} is below the historical-success \
                     75th percentile {p75}"
                ),
            );
        }

        let at_p90 = history.success_p90.is_some_and(|p90| effect >= p90);
        let severity = if at_p90 { Severity::High } else { Severity::Med };
        let evidence: SmallVec<[EvidenceRef; 4]> = smallvec![
            EvidenceRef::new("results.claimed_effect_size", effect),
            EvidenceRef::new("context.class_history.success_p75", p75),
        ];
        SignalResult::fired(
            SignalId::S5,
            severity,
            Some(effect),
            evidence,
            format!(
                "claimed effect {effect} is at or above the {} percentile of \
                 historically successful effects in a graveyard class",
                if at_p90 { "90th" } else { "75th" }
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialscan_core::types::ClassHistory;
    use crate::signals::test_support::minimal_card;

    fn graveyard_ctx() -> SignalContext {
        SignalContext {
            class_history: Some(ClassHistory {
                graveyard: true,
                success_p75: Some(0.12),
                success_p90: Some(0.20),
            }),
            ..Default::default()
        }
    }

    fn card_with_effect(effect: f64) -> StudyCard {
        let mut card = minimal_card();
        card.results.claimed_effect_size = Some(effect);
        card
    }

    #[test]
    fn test_effect_at_p75_fires_med() {
        let result = EffectPlausibilitySignal.evaluate(
            &card_with_effect(0.13),
            &graveyard_ctx(),
            &SignalThresholds::default(),
        );
        assert!(result.fired);
        assert_eq!(result.severity, Severity::Med);
    }

    #[test]
    fn test_effect_at_p90_fires_high() {
        let result = EffectPlausibilitySignal.evaluate(
            &card_with_effect(0.22),
            &graveyard_ctx(),
            &SignalThresholds::default(),
        );
        assert!(result.fired);
        assert_eq!(result.severity, Severity::High);
    }

    #[test]
    fn test_modest_effect_is_quiet() {
        let result = EffectPlausibilitySignal.evaluate(
            &card_with_effect(0.08),
            &graveyard_ctx(),
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
    }

    #[test]
    fn test_non_graveyard_class_is_quiet() {
        let mut ctx = graveyard_ctx();
        ctx.class_history.as_mut().unwrap().graveyard = false;
        let result = EffectPlausibilitySignal.evaluate(
            &card_with_effect(0.30),
            &ctx,
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
    }

    #[test]
    fn test_missing_history_is_quiet() {
        let result = EffectPlausibilitySignal.evaluate(
            &card_with_effect(0.30),
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
        assert_eq!(result.rationale, INSUFFICIENT_EVIDENCE);
    }
}
