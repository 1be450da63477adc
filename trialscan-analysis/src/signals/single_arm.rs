//! S7: single-arm pivotal where randomized evidence is standard.

use smallvec::{smallvec, SmallVec};

use trialscan_core::config::SignalThresholds;
use trialscan_core::types::{
    EvidenceRef, Severity, SignalContext, SignalId, SignalResult, StudyCard,
};

use super::{SignalEvaluator, INSUFFICIENT_EVIDENCE};

pub struct SingleArmSignal;

impl SignalEvaluator for SingleArmSignal {
    fn id(&self) -> SignalId {
        SignalId::S7
    }

    fn name(&self) -> &'static str {
        "Single-arm pivotal without precedent"
    }

    fn evaluate(
        &self,
        card: &StudyCard,
        ctx: &SignalContext,
        _thresholds: &SignalThresholds,
    ) -> SignalResult {
        if !card.is_pivotal {
            return SignalResult::quiet(SignalId::S7, "not a pivotal trial");
        }
        if card.design.arms != 1 {
            return SignalResult::quiet(SignalId::S7, "trial has a comparator arm");
        }
        let Some(indication) = card.indication.as_deref() else {
            // Cannot check precedent without knowing the indication.
            return SignalResult::quiet(SignalId::S7, INSUFFICIENT_EVIDENCE);
        };

        let allowlisted = ctx
            .single_arm_allowlist
            .iter()
            .any(|i| i.eq_ignore_ascii_case(indication));
        if allowlisted {
            return SignalResult::quiet(
                SignalId::S7,
                format!("indication `{indication}` has single-arm precedent"),
            );
        }

        let evidence: SmallVec<[EvidenceRef; 4]> = smallvec![
            EvidenceRef::new("design.arms", card.design.arms),
            EvidenceRef::new("indication", indication),
        ];
        SignalResult::fired(
            SignalId::S7,
            Severity::Med,
            None,
            evidence,
            format!(
                "single-arm pivotal in `{indication}`, which has no precedent for \
                 single-arm acceptance"
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::test_support::minimal_card;

    fn single_arm_card() -> StudyCard {
        let mut card = minimal_card();
        card.design.arms = 1;
        card.design.randomized = false;
        card
    }

    #[test]
    fn test_single_arm_without_precedent_fires() {
        let result = SingleArmSignal.evaluate(
            &single_arm_card(),
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(result.fired);
    }

    #[test]
    fn test_allowlisted_indication_is_quiet() {
        let ctx = SignalContext {
            single_arm_allowlist: vec!["2L NSCLC".to_string()],
            ..Default::default()
        };
        let result = SingleArmSignal.evaluate(
            &single_arm_card(),
            &ctx,
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
    }

    #[test]
    fn test_allowlist_match_ignores_case() {
        let ctx = SignalContext {
            single_arm_allowlist: vec!["2l nsclc".to_string()],
            ..Default::default()
        };
        let result = SingleArmSignal.evaluate(
            &single_arm_card(),
            &ctx,
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
    }

    #[test]
    fn test_randomized_trial_is_quiet() {
        let result = SingleArmSignal.evaluate(
            &minimal_card(),
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
    }

    #[test]
    fn test_unknown_indication_is_quiet() {
        let mut card = single_arm_card();
        card.indication = None;
        let result = SingleArmSignal.evaluate(
            &card,
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
        assert_eq!(result.rationale, INSUFFICIENT_EVIDENCE);
    }
}
