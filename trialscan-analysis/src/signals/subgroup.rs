//! S3: subgroup-only win without multiplicity control.

use smallvec::{smallvec, SmallVec};

use trialscan_core::config::SignalThresholds;
use trialscan_core::types::{
    EvidenceRef, Severity, SignalContext, SignalId, SignalResult, StudyCard,
};

use super::{SignalEvaluator, INSUFFICIENT_EVIDENCE};

pub struct SubgroupOnlyWinSignal;

impl SignalEvaluator for SubgroupOnlyWinSignal {
    fn id(&self) -> SignalId {
        SignalId::S3
    }

    fn name(&self) -> &'static str {
        "Subgroup-only win without multiplicity control"
    }

    fn evaluate(
        &self,
        card: &StudyCard,
        _ctx: &SignalContext,
        thresholds: &SignalThresholds,
    ) -> SignalResult {
        let alpha = thresholds.effective_significance_alpha();
        let Some(itt_p) = card.results.itt.as_ref().and_then(|a| a.p_value) else {
            return SignalResult::quiet(SignalId::S3, INSUFFICIENT_EVIDENCE);
        };
        if itt_p < alpha {
            return SignalResult::quiet(
                SignalId::S3,
                format!("overall ITT result is significant (p = {itt_p})"),
            );
        }
        if card.results.subgroups.is_empty() {
            return SignalResult::quiet(SignalId::S3, INSUFFICIENT_EVIDENCE);
        }

        // Nominal subgroup wins with neither multiplicity adjustment nor a
        // pre-specified interaction test. The trial-level prespecified
        // interaction flag also clears a subgroup.
        let interaction_prespecified = card.analysis_plan.interaction_prespecified;
        let offending: Vec<_> = card
            .results
            .subgroups
            .iter()
            .filter(|s| {
                s.p_value < alpha
                    && !s.multiplicity_adjusted
                    && !s.prespecified_interaction
                    && !interaction_prespecified
            })
            .collect();

        let Some(first) = offending.first() else {
            return SignalResult::quiet(
                SignalId::S3,
                "no uncontrolled nominally-significant subgroup",
            );
        };

        let foregrounded = offending.iter().any(|s| s.foregrounded);
        let highlight = offending
            .iter()
            .find(|s| s.foregrounded)
            .unwrap_or(first);
        let evidence: SmallVec<[EvidenceRef; 4]> = smallvec![
            EvidenceRef::new("results.itt.p_value", itt_p),
            EvidenceRef::new(
                format!("results.subgroups[{}].p_value", highlight.name),
                highlight.p_value,
            ),
        ];
        let severity = if foregrounded {
            Severity::High
        } else {
            Severity::Med
        };
        SignalResult::fired(
            SignalId::S3,
            severity,
            Some(highlight.p_value),
            evidence,
            format!(
                "ITT non-significant (p = {itt_p}) while subgroup `{}` is nominally \
                 significant (p = {}) without multiplicity control{}",
                highlight.name,
                highlight.p_value,
                if foregrounded {
                    "; subgroup is foregrounded in the narrative"
                } else {
                    ""
                }
            ),
        )
    }
}
