//! S9: OS/PFS contradiction.
//!
//! A favorable progression signal alongside an overall-survival trend
//! toward harm, with enough OS events to mean something and little enough
//! crossover to blame.

use smallvec::{smallvec, SmallVec};

use trialscan_core::config::SignalThresholds;
use trialscan_core::types::{
    EvidenceRef, Severity, SignalContext, SignalId, SignalResult, StudyCard,
};

use super::{SignalEvaluator, INSUFFICIENT_EVIDENCE};

pub struct OsPfsContradictionSignal;

impl SignalEvaluator for OsPfsContradictionSignal {
    fn id(&self) -> SignalId {
        SignalId::S9
    }

    fn name(&self) -> &'static str {
        "OS/PFS contradiction"
    }

    fn evaluate(
        &self,
        card: &StudyCard,
        _ctx: &SignalContext,
        thresholds: &SignalThresholds,
    ) -> SignalResult {
        let alpha = thresholds.effective_significance_alpha();
        let results = &card.results;
        let (Some(pfs), Some(os)) = (results.pfs.as_ref(), results.os.as_ref()) else {
            return SignalResult::quiet(SignalId::S9, INSUFFICIENT_EVIDENCE);
        };

        let pfs_significant = pfs.p_value.is_some_and(|p| p < alpha);
        let pfs_ci_favorable = pfs
            .hazard_ratio
            .zip(pfs.ci_high)
            .is_some_and(|(hr, hi)| hr < 1.0 && hi < 1.0);
        if !(pfs_significant || pfs_ci_favorable) {
            return SignalResult::quiet(SignalId::S9, "PFS result is not favorable");
        }

        let Some(os_hr) = os.hazard_ratio else {
            return SignalResult::quiet(SignalId::S9, INSUFFICIENT_EVIDENCE);
        };
        let (Some(observed), Some(planned)) =
            (results.os_events_observed, results.os_events_planned)
        else {
            return SignalResult::quiet(SignalId::S9, INSUFFICIENT_EVIDENCE);
        };
        if planned == 0 {
            return SignalResult::quiet(SignalId::S9, INSUFFICIENT_EVIDENCE);
        }
        let Some(os_p) = os.p_value else {
            return SignalResult::quiet(SignalId::S9, INSUFFICIENT_EVIDENCE);
        };
        let Some(crossover) = results.crossover_pct else {
            return SignalResult::quiet(SignalId::S9, INSUFFICIENT_EVIDENCE);
        };

        let event_fraction = observed as f64 / planned as f64;
        let harm_trend = os_hr >= thresholds.effective_os_harm_hr()
            && event_fraction >= thresholds.effective_os_events_fraction()
            && os_p < thresholds.effective_os_p_max();
        let crossover_low = crossover <= thresholds.effective_crossover_max_pct();

        if !harm_trend {
            return SignalResult::quiet(
                SignalId::S9,
                format!(
                    "OS does not trend toward harm (HR {os_hr}, {:.0}% of planned \
                     events, p = {os_p})",
                    event_fraction * 100.0
                ),
            );
        }
        if !crossover_low {
            return SignalResult::quiet(
                SignalId::S9,
                format!(
                    "OS harm trend is confounded by {crossover}% crossover \
                     (limit {}%)",
                    thresholds.effective_crossover_max_pct()
                ),
            );
        }

        let severity = if os_hr >= thresholds.effective_os_harm_hr_high() {
            Severity::High
        } else {
            Severity::Med
        };
        let evidence: SmallVec<[EvidenceRef; 4]> = smallvec![
            EvidenceRef::new("results.pfs", format!("HR {:?}, p {:?}", pfs.hazard_ratio, pfs.p_value)),
            EvidenceRef::new("results.os.hazard_ratio", os_hr),
            EvidenceRef::new("results.os_events_observed", observed),
            EvidenceRef::new("results.crossover_pct", crossover),
        ];
        SignalResult::fired(
            SignalId::S9,
            severity,
            Some(os_hr),
            evidence,
            format!(
                "favorable PFS with OS trending toward harm (HR {os_hr}, {:.0}% of \
                 planned events, p = {os_p}) and low crossover ({crossover}%)",
                event_fraction * 100.0
            ),
        )
    }
}
