//! S8: p-value cusp and program-level heaping.
//!
//! Two modes. Per-trial cusp: the primary p-value sits in the closed band
//! just under 0.05. Program-level heaping: pooled nominal p-values around
//! 0.05 pile up on the left side of the boundary more than chance allows,
//! tested with a one-sided binomial tail at p = 0.5.

use smallvec::{smallvec, SmallVec};

use trialscan_core::config::{HeapingKey, SignalThresholds};
use trialscan_core::types::{
    EvidenceRef, Severity, SignalContext, SignalId, SignalResult, StudyCard,
};

use crate::num::binomial_tail_ge;

use super::{SignalEvaluator, INSUFFICIENT_EVIDENCE};

pub struct PvalueHeapingSignal;

struct HeapingFinding {
    left: u64,
    right: u64,
    tail: f64,
}

impl PvalueHeapingSignal {
    fn cusp(card: &StudyCard, thresholds: &SignalThresholds) -> Option<f64> {
        let p = card.results.primary_p_value?;
        let lo = thresholds.effective_cusp_low();
        let hi = thresholds.effective_cusp_high();
        (p >= lo && p <= hi).then_some(p)
    }

    fn heaping(ctx: &SignalContext, thresholds: &SignalThresholds) -> Option<HeapingFinding> {
        let lo = thresholds.effective_heaping_window_low();
        let split = thresholds.effective_heaping_split();
        let hi = thresholds.effective_heaping_window_high();

        // Left band [lo, split), right band [split, hi].
        let left = ctx
            .pooled_p_values
            .iter()
            .filter(|p| **p >= lo && **p < split)
            .count() as u64;
        let right = ctx
            .pooled_p_values
            .iter()
            .filter(|p| **p >= split && **p <= hi)
            .count() as u64;

        if (left + right) < thresholds.effective_heaping_min_pooled() as u64 {
            return None;
        }
        if (left as f64) < thresholds.effective_heaping_left_multiple() * right as f64 {
            return None;
        }
        let tail = binomial_tail_ge(left, left + right, 0.5);
        (tail < thresholds.effective_heaping_tail_alpha())
            .then_some(HeapingFinding { left, right, tail })
    }
}

impl SignalEvaluator for PvalueHeapingSignal {
    fn id(&self) -> SignalId {
        SignalId::S8
    }

    fn name(&self) -> &'static str {
        "P-value cusp/heaping"
    }

    fn evaluate(
        &self,
        card: &StudyCard,
        ctx: &SignalContext,
        thresholds: &SignalThresholds,
    ) -> SignalResult {
        let cusp = Self::cusp(card, thresholds);
        let heaping = Self::heaping(ctx, thresholds);

        match (cusp, heaping) {
            (None, None) => {
                if card.results.primary_p_value.is_none() && ctx.pooled_p_values.is_empty() {
                    SignalResult::quiet(SignalId::S8, INSUFFICIENT_EVIDENCE)
                } else {
                    SignalResult::quiet(
                        SignalId::S8,
                        "no cusp primary p-value and no pooled heaping excess",
                    )
                }
            }
            (Some(p), None) => {
                let evidence: SmallVec<[EvidenceRef; 4]> =
                    smallvec![EvidenceRef::new("results.primary_p_value", p)];
                SignalResult::fired(
                    SignalId::S8,
                    Severity::Med,
                    Some(p),
                    evidence,
                    format!(
                        "primary p-value {p} sits in the cusp band [{}, {}]",
                        thresholds.effective_cusp_low(),
                        thresholds.effective_cusp_high()
                    ),
                )
            }
            (cusp, Some(finding)) => {
                let mut evidence: SmallVec<[EvidenceRef; 4]> = smallvec![
                    EvidenceRef::new("context.pooled_p_values.left_band", finding.left),
                    EvidenceRef::new("context.pooled_p_values.right_band", finding.right),
                ];
                if let Some(key) = ctx.pooled_key.as_deref() {
                    evidence.push(EvidenceRef::new("context.pooled_key", key));
                }
                let aggregation = match thresholds.effective_heaping_aggregation() {
                    HeapingKey::Program => "program",
                    HeapingKey::Sponsor => "sponsor",
                };
                let mut rationale = format!(
                    "p-values pooled by {aggregation} heap left of 0.05: {} vs {} \
                     (binomial tail {:.5})",
                    finding.left, finding.right, finding.tail
                );
                if let Some(p) = cusp {
                    evidence.push(EvidenceRef::new("results.primary_p_value", p));
                    rationale.push_str(&format!("; primary p-value {p} is also on the cusp"));
                }
                SignalResult::fired(
                    SignalId::S8,
                    Severity::Med,
                    Some(finding.tail),
                    evidence,
                    rationale,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::test_support::minimal_card;

    fn heaped_ctx() -> SignalContext {
        // 12 left-band values, 2 right-band: tail = P(X >= 12 | 14, 0.5)
        // = 106/16384 ≈ 0.0065 < 0.01.
        let mut pooled = vec![0.046; 6];
        pooled.extend(vec![0.048; 3]);
        pooled.extend(vec![0.049; 3]);
        pooled.extend(vec![0.052, 0.054]);
        // Out-of-window values are ignored entirely.
        pooled.extend(vec![0.031, 0.12, 0.10]);
        SignalContext {
            pooled_p_values: pooled,
            pooled_key: Some("ACME-101".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_cusp_primary_p_fires() {
        let mut card = minimal_card();
        card.results.primary_p_value = Some(0.047);
        let result = PvalueHeapingSignal.evaluate(
            &card,
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(result.fired);
        assert_eq!(result.value, Some(0.047));
    }

    #[test]
    fn test_clear_win_is_quiet() {
        let mut card = minimal_card();
        card.results.primary_p_value = Some(0.003);
        let result = PvalueHeapingSignal.evaluate(
            &card,
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
    }

    #[test]
    fn test_program_heaping_fires() {
        let result = PvalueHeapingSignal.evaluate(
            &minimal_card(),
            &heaped_ctx(),
            &SignalThresholds::default(),
        );
        assert!(result.fired);
        let tail = result.value.unwrap();
        assert!(tail < 0.01);
        assert!((tail - 106.0 / 16384.0).abs() < 1e-10);
    }

    #[test]
    fn test_small_pool_is_quiet() {
        let ctx = SignalContext {
            // L = 7, R = 2: left excess is there but the pool is below 10.
            pooled_p_values: vec![0.046; 7]
                .into_iter()
                .chain(vec![0.052, 0.054])
                .collect(),
            ..Default::default()
        };
        let result = PvalueHeapingSignal.evaluate(
            &minimal_card(),
            &ctx,
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
    }

    #[test]
    fn test_balanced_pool_is_quiet() {
        let ctx = SignalContext {
            pooled_p_values: vec![0.046; 6]
                .into_iter()
                .chain(vec![0.052; 6])
                .collect(),
            ..Default::default()
        };
        let result = PvalueHeapingSignal.evaluate(
            &minimal_card(),
            &ctx,
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
    }

    #[test]
    fn test_left_excess_without_significance_is_quiet() {
        // L = 8, R = 4 meets the pool and L >= 2R bars, but
        // P(X >= 8 | 12, 0.5) ≈ 0.194 is nowhere near 0.01.
        let ctx = SignalContext {
            pooled_p_values: vec![0.046; 8]
                .into_iter()
                .chain(vec![0.052; 4])
                .collect(),
            ..Default::default()
        };
        let result = PvalueHeapingSignal.evaluate(
            &minimal_card(),
            &ctx,
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
    }

    #[test]
    fn test_no_evidence_is_quiet() {
        let result = PvalueHeapingSignal.evaluate(
            &minimal_card(),
            &SignalContext::default(),
            &SignalThresholds::default(),
        );
        assert!(!result.fired);
        assert_eq!(result.rationale, INSUFFICIENT_EVIDENCE);
    }
}
