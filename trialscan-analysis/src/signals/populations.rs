//! S4: ITT/PP contradiction with dropout asymmetry.
//!
//! A per-protocol win over a null ITT result is only suspicious when the
//! analysis populations actually diverged, so the detector additionally
//! requires arm-level dropout asymmetry.

use smallvec::{smallvec, SmallVec};

use trialscan_core::config::SignalThresholds;
use trialscan_core::types::{
    Blinding, EvidenceRef, Severity, SignalContext, SignalId, SignalResult, StudyCard,
};

use super::{SignalEvaluator, INSUFFICIENT_EVIDENCE};

pub struct PopulationContradictionSignal;

impl SignalEvaluator for PopulationContradictionSignal {
    fn id(&self) -> SignalId {
        SignalId::S4
    }

    fn name(&self) -> &'static str {
        "ITT/PP contradiction with dropout asymmetry"
    }

    fn evaluate(
        &self,
        card: &StudyCard,
        _ctx: &SignalContext,
        thresholds: &SignalThresholds,
    ) -> SignalResult {
        let alpha = thresholds.effective_significance_alpha();
        let results = &card.results;
        let (Some(itt), Some(pp)) = (results.itt.as_ref(), results.pp.as_ref()) else {
            return SignalResult::quiet(SignalId::S4, INSUFFICIENT_EVIDENCE);
        };
        let (Some(itt_p), Some(pp_p)) = (itt.p_value, pp.p_value) else {
            return SignalResult::quiet(SignalId::S4, INSUFFICIENT_EVIDENCE);
        };
        let (Some(drop_t), Some(drop_c)) =
            (results.dropout_treatment_pct, results.dropout_control_pct)
        else {
            return SignalResult::quiet(SignalId::S4, INSUFFICIENT_EVIDENCE);
        };

        let itt_null = itt_p >= alpha || itt.beneficial == Some(false);
        // Requires an affirmative benefit direction; an unstated direction
        // is insufficient evidence, not a presumed win.
        let pp_win = pp_p < alpha && pp.beneficial == Some(true);
        let asymmetry = (drop_t - drop_c).abs();

        if !(itt_null && pp_win) {
            return SignalResult::quiet(
                SignalId::S4,
                "no ITT/PP contradiction in stated results",
            );
        }
        if asymmetry < thresholds.effective_dropout_asymmetry_pp() {
            return SignalResult::quiet(
                SignalId::S4,
                format!(
                    "ITT/PP contradiction present but dropout asymmetry \
                     {asymmetry:.1}pp is below {:.1}pp",
                    thresholds.effective_dropout_asymmetry_pp()
                ),
            );
        }

        let subjective_unblinded = card.design.primary_endpoint.subjective
            && card.design.blinding == Blinding::Open;
        let severity = if asymmetry >= thresholds.effective_dropout_asymmetry_high_pp()
            || subjective_unblinded
        {
            Severity::High
        } else {
            Severity::Med
        };
        let evidence: SmallVec<[EvidenceRef; 4]> = smallvec![
            EvidenceRef::new("results.itt.p_value", itt_p),
            EvidenceRef::new("results.pp.p_value", pp_p),
            EvidenceRef::new("results.dropout_treatment_pct", drop_t),
            EvidenceRef::new("results.dropout_control_pct", drop_c),
        ];
        SignalResult::fired(
            SignalId::S4,
            severity,
            Some(asymmetry),
            evidence,
            format!(
                "ITT null (p = {itt_p}) vs per-protocol win (p = {pp_p}) with \
                 {asymmetry:.1}pp dropout asymmetry{}",
                if subjective_unblinded {
                    " on a subjective unblinded endpoint"
                } else {
                    ""
                }
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialscan_core::types::AnalysisOutcome;
    use crate::signals::test_support::minimal_card;

    fn contradiction_card(drop_t: f64, drop_c: f64) -> StudyCard {
        let mut card = minimal_card();
        card.results.itt = Some(AnalysisOutcome {
            p_value: Some(0.34),
            effect_size: None,
            beneficial: Some(false),
        });
        card.results.pp = Some(AnalysisOutcome {
            p_value: Some(0.02),
            effect_size: None,
            beneficial: Some(true),
        });
        card.results.dropout_treatment_pct = Some(drop_t);
        card.results.dropout_control_pct = Some(drop_c);
        card
    }

    #[test]
    fn test_contradiction_with_asymmetry_fires() {
        let result = PopulationContradictionSignal.evaluate(
            &contradiction_card(22.0, 10.0),
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(result.fired);
        assert_eq!(result.severity, Severity::Med);
        assert_eq!(result.value, Some(12.0));
    }

    #[test]
    fn test_large_asymmetry_is_high() {
        let result = PopulationContradictionSignal.evaluate(
            &contradiction_card(28.0, 10.0),
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(result.fired);
        assert_eq!(result.severity, Severity::High);
    }

    #[test]
    fn test_subjective_unblinded_is_high() {
        let mut card = contradiction_card(22.0, 10.0);
        card.design.primary_endpoint.subjective = true;
        card.design.blinding = Blinding::Open;
        let result = PopulationContradictionSignal.evaluate(
            &card,
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert_eq!(result.severity, Severity::High);
    }

    #[test]
    fn test_small_asymmetry_is_quiet() {
        let result = PopulationContradictionSignal.evaluate(
            &contradiction_card(14.0, 10.0),
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
    }

    #[test]
    fn test_unstated_pp_direction_is_quiet() {
        let mut card = contradiction_card(22.0, 10.0);
        card.results.pp.as_mut().unwrap().beneficial = None;
        let result = PopulationContradictionSignal.evaluate(
            &card,
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
    }

    #[test]
    fn test_missing_dropout_is_quiet() {
        let mut card = contradiction_card(22.0, 10.0);
        card.results.dropout_control_pct = None;
        let result = PopulationContradictionSignal.evaluate(
            &card,
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
        assert_eq!(result.rationale, INSUFFICIENT_EVIDENCE);
    }
}
