//! S2: underpowered pivotal trial.
//!
//! Two mutually exclusive computation paths selected by endpoint type:
//! a two-arm proportion approximation and the Freedman approximation for
//! time-to-event endpoints. Backstop-imputed inputs do not abort the
//! computation; they tag the result `low_certainty` and tighten the firing
//! bar.

use smallvec::{smallvec, SmallVec};

use trialscan_core::config::SignalThresholds;
use trialscan_core::types::{
    EndpointKind, EvidenceRef, Severity, SignalContext, SignalId, SignalResult, StudyCard,
};

use crate::num::{normal_cdf, z_alpha};

use super::{SignalEvaluator, INSUFFICIENT_EVIDENCE};

pub struct UnderpoweredSignal;

struct PowerEstimate {
    power: f64,
    low_certainty: bool,
    evidence: SmallVec<[EvidenceRef; 4]>,
    method: &'static str,
}

impl UnderpoweredSignal {
    /// Two-arm proportion: power ≈ Φ(|Δ|/SE − z_α) with
    /// SE = sqrt(p_t(1−p_t)/n_t + p_c(1−p_c)/n_c), p_t = p_c + Δ.
    fn proportion_power(card: &StudyCard) -> Option<PowerEstimate> {
        let design = &card.design;
        let assumptions = &card.analysis_plan.power;
        let n_t = design.n_treatment? as f64;
        let n_c = design.n_control? as f64;
        let p_c = assumptions.control_rate?;
        let delta = assumptions.absolute_delta?;
        let alpha = assumptions.alpha?;
        let one_sided = assumptions.one_sided.unwrap_or(false);

        if n_t <= 0.0 || n_c <= 0.0 || !(0.0..1.0).contains(&p_c) || delta == 0.0 {
            return None;
        }
        let p_t = (p_c + delta).clamp(1e-6, 1.0 - 1e-6);
        let se = (p_t * (1.0 - p_t) / n_t + p_c * (1.0 - p_c) / n_c).sqrt();
        if !(se.is_finite() && se > 0.0) {
            return None;
        }
        let z = z_alpha(alpha, one_sided)?;
        let power = normal_cdf(delta.abs() / se - z);

        let low_certainty = assumptions.is_imputed("control_rate")
            || assumptions.is_imputed("absolute_delta")
            || assumptions.is_imputed("alpha");
        let evidence: SmallVec<[EvidenceRef; 4]> = smallvec![
            EvidenceRef::new("design.n_treatment", n_t),
            EvidenceRef::new("design.n_control", n_c),
            EvidenceRef::new("analysis_plan.power.control_rate", p_c),
            EvidenceRef::new("analysis_plan.power.absolute_delta", delta),
        ];
        Some(PowerEstimate {
            power,
            low_certainty,
            evidence,
            method: "two-arm proportion",
        })
    }

    /// Freedman: power ≈ Φ(sqrt(D·ψ)·|ln(HR_alt)| − z_α), ψ = k/(1+k)².
    fn freedman_power(card: &StudyCard) -> Option<PowerEstimate> {
        let assumptions = &card.analysis_plan.power;
        let events = assumptions.planned_events?;
        let hr_alt = assumptions.hr_alt?;
        let alpha = assumptions.alpha?;
        let one_sided = assumptions.one_sided.unwrap_or(false);

        if events == 0 || hr_alt <= 0.0 || (hr_alt - 1.0).abs() < 1e-12 {
            return None;
        }
        // Allocation ratio defaults to 1:1 when unstated; that default is a
        // backstop and marks the estimate low-certainty.
        let (k, ratio_imputed) = match card.design.allocation_ratio {
            Some(k) if k > 0.0 => (k, false),
            Some(_) => return None,
            None => (1.0, true),
        };
        let psi = k / ((1.0 + k) * (1.0 + k));
        let z = z_alpha(alpha, one_sided)?;
        let power = normal_cdf((events as f64 * psi).sqrt() * hr_alt.ln().abs() - z);

        let low_certainty = ratio_imputed
            || assumptions.is_imputed("planned_events")
            || assumptions.is_imputed("hr_alt")
            || assumptions.is_imputed("alpha");
        let evidence: SmallVec<[EvidenceRef; 4]> = smallvec![
            EvidenceRef::new("analysis_plan.power.planned_events", events),
            EvidenceRef::new("analysis_plan.power.hr_alt", hr_alt),
            EvidenceRef::new("design.allocation_ratio", k),
        ];
        Some(PowerEstimate {
            power,
            low_certainty,
            evidence,
            method: "Freedman time-to-event",
        })
    }
}

impl SignalEvaluator for UnderpoweredSignal {
    fn id(&self) -> SignalId {
        SignalId::S2
    }

    fn name(&self) -> &'static str {
        "Underpowered pivotal"
    }

    fn evaluate(
        &self,
        card: &StudyCard,
        _ctx: &SignalContext,
        thresholds: &SignalThresholds,
    ) -> SignalResult {
        if !card.is_pivotal {
            return SignalResult::quiet(SignalId::S2, "not a pivotal trial");
        }

        let estimate = match card.design.primary_endpoint.kind {
            EndpointKind::Proportion => Self::proportion_power(card),
            EndpointKind::TimeToEvent => Self::freedman_power(card),
            EndpointKind::Continuous | EndpointKind::Unknown => None,
        };
        let Some(estimate) = estimate else {
            return SignalResult::quiet(SignalId::S2, INSUFFICIENT_EVIDENCE);
        };

        // Backstop inputs must meet a stricter bar.
        let bar = if estimate.low_certainty {
            thresholds.effective_power_fire_below_low_certainty()
        } else {
            thresholds.effective_power_fire_below()
        };

        if estimate.power < bar {
            let result = SignalResult::fired(
                SignalId::S2,
                Severity::Med,
                Some(estimate.power),
                estimate.evidence,
                format!(
                    "{} power {:.3} below {:.2} under stated assumptions",
                    estimate.method, estimate.power, bar
                ),
            );
            if estimate.low_certainty {
                result.with_low_certainty()
            } else {
                result
            }
        } else {
            SignalResult::quiet(
                SignalId::S2,
                format!(
                    "{} power {:.3} meets the {:.2} bar",
                    estimate.method, estimate.power, bar
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialscan_core::types::{
        AnalysisPlan, Blinding, EndpointSpec, PowerAssumptions, TrialDesign, TrialResults,
    };

    fn proportion_card(n: u64, p_c: f64, delta: f64) -> StudyCard {
        StudyCard {
            trial_id: "NCT0001".to_string(),
            version: 1,
            is_pivotal: true,
            sponsor: None,
            program_id: None,
            therapeutic_class: None,
            indication: None,
            design: TrialDesign {
                arms: 2,
                randomized: true,
                blinding: Blinding::Double,
                n_treatment: Some(n),
                n_control: Some(n),
                allocation_ratio: Some(1.0),
                primary_endpoint: EndpointSpec {
                    description: "ORR at 6 months".to_string(),
                    kind: EndpointKind::Proportion,
                    subjective: false,
                },
                start_date: None,
                primary_completion_date: None,
            },
            analysis_plan: AnalysisPlan {
                power: PowerAssumptions {
                    alpha: Some(0.025),
                    one_sided: Some(true),
                    control_rate: Some(p_c),
                    absolute_delta: Some(delta),
                    ..Default::default()
                },
                ..Default::default()
            },
            results: TrialResults::default(),
            versions: vec![],
        }
    }

    #[test]
    fn test_power_boundary_case_fires() {
        // n = 90/90, p_c = 0.20, Δ = 0.08, one-sided α = 0.025 ⇒ power < 0.70
        let card = proportion_card(90, 0.20, 0.08);
        let result = UnderpoweredSignal.evaluate(
            &card,
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(result.fired);
        let power = result.value.unwrap();
        assert!(power < 0.70, "power {power} should be < 0.70");
        assert!(!result.low_certainty);
    }

    #[test]
    fn test_well_powered_trial_is_quiet() {
        let card = proportion_card(500, 0.20, 0.15);
        let result = UnderpoweredSignal.evaluate(
            &card,
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
    }

    #[test]
    fn test_imputed_input_tightens_bar() {
        let mut card = proportion_card(90, 0.20, 0.08);
        card.analysis_plan.power.imputed_fields = vec!["control_rate".to_string()];
        let result = UnderpoweredSignal.evaluate(
            &card,
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        // Power ≈ 0.24 clears even the stricter 0.55 bar, so it still fires,
        // but flagged low-certainty.
        assert!(result.fired);
        assert!(result.low_certainty);

        // A borderline trial (power between 0.55 and 0.70) stops firing
        // once its inputs are imputed. n = 190/190, p_c = 0.20, Δ = 0.10
        // gives power ≈ 0.62, inside the band by construction.
        let mut borderline = proportion_card(190, 0.20, 0.10);
        let clean = UnderpoweredSignal.evaluate(
            &borderline,
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(clean.fired);
        let clean_power = clean.value.unwrap();
        assert!(
            (0.55..0.70).contains(&clean_power),
            "fixture power {clean_power} drifted out of the borderline band"
        );

        borderline.analysis_plan.power.imputed_fields = vec!["absolute_delta".to_string()];
        let flagged = UnderpoweredSignal.evaluate(
            &borderline,
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(!flagged.fired);
    }

    #[test]
    fn test_freedman_path() {
        let mut card = proportion_card(300, 0.20, 0.10);
        card.design.primary_endpoint.kind = EndpointKind::TimeToEvent;
        card.analysis_plan.power = PowerAssumptions {
            alpha: Some(0.025),
            one_sided: Some(true),
            hr_alt: Some(0.75),
            planned_events: Some(120),
            ..Default::default()
        };
        let result = UnderpoweredSignal.evaluate(
            &card,
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        // sqrt(120 * 0.25) * |ln 0.75| - 1.96 = 5.477 * 0.2877 - 1.96 ≈ -0.384
        // ⇒ power ≈ 0.35, fires.
        assert!(result.fired);
        assert!((result.value.unwrap() - 0.3505).abs() < 0.01);
    }

    #[test]
    fn test_missing_inputs_are_quiet_not_fatal() {
        let mut card = proportion_card(90, 0.20, 0.08);
        card.analysis_plan.power.control_rate = None;
        let result = UnderpoweredSignal.evaluate(
            &card,
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
        assert_eq!(result.rationale, INSUFFICIENT_EVIDENCE);
    }

    #[test]
    fn test_non_pivotal_is_quiet() {
        let mut card = proportion_card(30, 0.20, 0.08);
        card.is_pivotal = false;
        let result = UnderpoweredSignal.evaluate(
            &card,
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
    }
}
