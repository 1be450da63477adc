//! S6: interim looks without alpha-spending control.

use smallvec::{smallvec, SmallVec};

use trialscan_core::config::SignalThresholds;
use trialscan_core::types::{
    EvidenceRef, Severity, SignalContext, SignalId, SignalResult, StudyCard,
};

use super::SignalEvaluator;

pub struct InterimLooksSignal;

impl SignalEvaluator for InterimLooksSignal {
    fn id(&self) -> SignalId {
        SignalId::S6
    }

    fn name(&self) -> &'static str {
        "Interim looks without alpha-spending control"
    }

    fn evaluate(
        &self,
        card: &StudyCard,
        _ctx: &SignalContext,
        thresholds: &SignalThresholds,
    ) -> SignalResult {
        let plan = &card.analysis_plan;
        let planned = plan.planned_interim_looks;
        let min_looks = thresholds.effective_interim_looks_min();

        if planned >= min_looks && !plan.alpha_spending_declared {
            let evidence: SmallVec<[EvidenceRef; 4]> = smallvec![
                EvidenceRef::new("analysis_plan.planned_interim_looks", planned),
                EvidenceRef::new(
                    "analysis_plan.alpha_spending_declared",
                    plan.alpha_spending_declared,
                ),
            ];
            return SignalResult::fired(
                SignalId::S6,
                Severity::Med,
                Some(planned as f64),
                evidence,
                format!(
                    "{planned} planned interim analyses with no declared \
                     alpha-spending function"
                ),
            );
        }

        if let Some(executed) = plan.executed_interim_looks {
            if executed > planned && !plan.alpha_reallocated {
                let evidence: SmallVec<[EvidenceRef; 4]> = smallvec![
                    EvidenceRef::new("analysis_plan.planned_interim_looks", planned),
                    EvidenceRef::new("analysis_plan.executed_interim_looks", executed),
                ];
                return SignalResult::fired(
                    SignalId::S6,
                    Severity::Med,
                    Some(executed as f64),
                    evidence,
                    format!(
                        "executed {executed} interim looks against {planned} planned \
                         without alpha re-allocation"
                    ),
                );
            }
        }

        SignalResult::quiet(SignalId::S6, "interim analysis plan is controlled")
    }
}
