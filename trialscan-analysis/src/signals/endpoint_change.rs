//! S1: material & late primary endpoint change.
//!
//! Registered endpoint text is normalized into a concept tuple; wording
//! churn that maps to the same concept is ignored. A material change fires,
//! with severity driven by when the change happened relative to trial start
//! and estimated primary completion.

use smallvec::{smallvec, SmallVec};

use trialscan_core::config::SignalThresholds;
use trialscan_core::types::{
    EvidenceRef, Severity, SignalContext, SignalId, SignalResult, StudyCard, VersionEntry,
};

use super::{SignalEvaluator, INSUFFICIENT_EVIDENCE};

/// Normalized endpoint concept. Two descriptions are "the same endpoint"
/// iff their concepts are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConcept {
    pub class: EndpointClass,
    pub timepoint_months: Option<u32>,
    pub noninferiority: bool,
    pub open_label: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointClass {
    OverallSurvival,
    ProgressionFreeSurvival,
    ObjectiveResponseRate,
    Other,
}

impl EndpointClass {
    fn from_text(lower: &str) -> Self {
        if lower.contains("overall survival") || has_token(lower, "os") {
            Self::OverallSurvival
        } else if lower.contains("progression-free")
            || lower.contains("progression free")
            || has_token(lower, "pfs")
        {
            Self::ProgressionFreeSurvival
        } else if lower.contains("objective response")
            || lower.contains("response rate")
            || has_token(lower, "orr")
        {
            Self::ObjectiveResponseRate
        } else {
            Self::Other
        }
    }
}

fn has_token(text: &str, token: &str) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|w| w == token)
}

/// Normalize a registered endpoint description.
pub fn normalize_endpoint(text: &str) -> EndpointConcept {
    let lower = text.to_lowercase();
    EndpointConcept {
        class: EndpointClass::from_text(&lower),
        timepoint_months: parse_timepoint_months(&lower),
        noninferiority: lower.contains("non-inferior") || lower.contains("noninferior"),
        open_label: lower.contains("open-label") || lower.contains("open label"),
    }
}

/// Extract "at N months" / "N-month" / "N weeks" style timepoints,
/// normalized to whole months (weeks rounded down, minimum 1).
fn parse_timepoint_months(lower: &str) -> Option<u32> {
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    for window in words.windows(2) {
        if let Ok(n) = window[0].parse::<u32>() {
            match window[1] {
                "month" | "months" => return Some(n),
                "week" | "weeks" => return Some((n / 4).max(1)),
                "year" | "years" => return Some(n * 12),
                _ => {}
            }
        }
    }
    None
}

pub struct EndpointChangeSignal;

impl EndpointChangeSignal {
    /// Latest consecutive version pair whose concepts differ.
    fn latest_material_change<'a>(
        versions: &'a [VersionEntry],
    ) -> Option<(&'a VersionEntry, &'a VersionEntry)> {
        versions
            .windows(2)
            .rev()
            .find(|w| {
                normalize_endpoint(&w[0].primary_endpoint_text)
                    != normalize_endpoint(&w[1].primary_endpoint_text)
            })
            .map(|w| (&w[0], &w[1]))
    }
}

impl SignalEvaluator for EndpointChangeSignal {
    fn id(&self) -> SignalId {
        SignalId::S1
    }

    fn name(&self) -> &'static str {
        "Endpoint change (material & late)"
    }

    fn evaluate(
        &self,
        card: &StudyCard,
        _ctx: &SignalContext,
        thresholds: &SignalThresholds,
    ) -> SignalResult {
        if card.versions.len() < 2 {
            return SignalResult::quiet(SignalId::S1, INSUFFICIENT_EVIDENCE);
        }

        let Some((before, after)) = Self::latest_material_change(&card.versions) else {
            return SignalResult::quiet(
                SignalId::S1,
                "no material endpoint concept change across versions",
            );
        };

        let evidence: SmallVec<[EvidenceRef; 4]> = smallvec![
            EvidenceRef::new(
                format!("versions[{}].primary_endpoint_text", before.version),
                &before.primary_endpoint_text,
            ),
            EvidenceRef::new(
                format!("versions[{}].primary_endpoint_text", after.version),
                &after.primary_endpoint_text,
            ),
        ];

        let window = thresholds.effective_endpoint_change_window_days();
        let change_date = after.captured_date;
        let timing = match (change_date, card.design.start_date, card.design.primary_completion_date)
        {
            (Some(changed), start, completion) => {
                let after_start = start.is_some_and(|s| changed > s);
                let near_completion =
                    completion.is_some_and(|c| (changed - c).abs() <= window);
                Some(after_start || near_completion)
            }
            _ => None,
        };

        match timing {
            Some(true) => SignalResult::fired(
                SignalId::S1,
                Severity::High,
                None,
                evidence,
                format!(
                    "endpoint concept changed between versions {} and {} after trial start \
                     or within {window} days of primary completion",
                    before.version, after.version
                ),
            ),
            Some(false) => SignalResult::fired(
                SignalId::S1,
                Severity::Med,
                None,
                evidence,
                format!(
                    "endpoint concept changed between versions {} and {} before trial start",
                    before.version, after.version
                ),
            ),
            // Dates unavailable: the concept diff is material, but timing
            // cannot be established.
            None => SignalResult::fired(
                SignalId::S1,
                Severity::Med,
                None,
                evidence,
                format!(
                    "endpoint concept changed between versions {} and {}; \
                     change timing unavailable",
                    before.version, after.version
                ),
            )
            .with_low_certainty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::test_support::minimal_card;

    /// OS -> ORR across versions 1 and 2; the caller picks the change date.
    fn card_with_endpoint_swap(change_date: Option<i64>) -> StudyCard {
        let mut card = minimal_card();
        card.versions = vec![
            VersionEntry {
                version: 1,
                captured_date: Some(18_600),
                primary_endpoint_text: "Overall survival at 24 months".to_string(),
            },
            VersionEntry {
                version: 2,
                captured_date: change_date,
                primary_endpoint_text: "Objective response rate at 6 months".to_string(),
            },
        ];
        card
    }

    fn evaluate(card: &StudyCard) -> SignalResult {
        EndpointChangeSignal.evaluate(
            card,
            &SignalContext::default(),
            &SignalThresholds::default(),
        )
    }

    #[test]
    fn test_change_after_start_is_high() {
        // Start 19_000; the swap lands at 19_500.
        let result = evaluate(&card_with_endpoint_swap(Some(19_500)));
        assert!(result.fired);
        assert_eq!(result.severity, Severity::High);
        assert!(!result.low_certainty);
    }

    #[test]
    fn test_change_before_start_is_med() {
        // 18_700 is before start and 1400 days from completion (20_100),
        // well outside the 180-day window.
        let result = evaluate(&card_with_endpoint_swap(Some(18_700)));
        assert!(result.fired);
        assert_eq!(result.severity, Severity::Med);
        assert!(!result.low_certainty);
    }

    #[test]
    fn test_undated_change_fires_low_certainty() {
        let result = evaluate(&card_with_endpoint_swap(None));
        assert!(result.fired);
        assert_eq!(result.severity, Severity::Med);
        assert!(result.low_certainty);
    }

    #[test]
    fn test_wording_churn_across_versions_is_quiet() {
        let mut card = card_with_endpoint_swap(Some(19_500));
        card.versions[1].primary_endpoint_text = "OS, 24-month analysis".to_string();
        let result = evaluate(&card);
        assert!(!result.fired);
    }

    #[test]
    fn test_single_version_is_quiet() {
        let mut card = card_with_endpoint_swap(Some(19_500));
        card.versions.truncate(1);
        let result = evaluate(&card);
        assert!(!result.fired);
    }

    #[test]
    fn test_normalize_classes() {
        assert_eq!(
            normalize_endpoint("Overall survival at 24 months").class,
            EndpointClass::OverallSurvival
        );
        assert_eq!(
            normalize_endpoint("PFS per RECIST 1.1").class,
            EndpointClass::ProgressionFreeSurvival
        );
        assert_eq!(
            normalize_endpoint("ORR (confirmed)").class,
            EndpointClass::ObjectiveResponseRate
        );
        assert_eq!(
            normalize_endpoint("Change in HbA1c").class,
            EndpointClass::Other
        );
    }

    #[test]
    fn test_normalize_timepoint_and_flags() {
        let c = normalize_endpoint("Non-inferiority in ORR at 12 months, open-label");
        assert_eq!(c.timepoint_months, Some(12));
        assert!(c.noninferiority);
        assert!(c.open_label);
        assert_eq!(normalize_endpoint("OS at 2 years").timepoint_months, Some(24));
    }

    #[test]
    fn test_wording_churn_is_not_material() {
        let a = normalize_endpoint("Overall survival at 24 months");
        let b = normalize_endpoint("OS, 24-month analysis");
        assert_eq!(a, b);
    }
}
