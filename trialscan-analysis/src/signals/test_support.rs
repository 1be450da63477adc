//! Shared fixtures for detector unit tests.

use trialscan_core::types::{
    AnalysisPlan, Blinding, EndpointKind, EndpointSpec, StudyCard, TrialDesign, TrialResults,
};

/// A pivotal two-arm card with no results; tests fill in what they need.
pub fn minimal_card() -> StudyCard {
    StudyCard {
        trial_id: "NCT0001".to_string(),
        version: 1,
        is_pivotal: true,
        sponsor: Some("Acme Bio".to_string()),
        program_id: Some("ACME-101".to_string()),
        therapeutic_class: Some("checkpoint inhibitor".to_string()),
        indication: Some("2L NSCLC".to_string()),
        design: TrialDesign {
            arms: 2,
            randomized: true,
            blinding: Blinding::Double,
            n_treatment: Some(200),
            n_control: Some(200),
            allocation_ratio: Some(1.0),
            primary_endpoint: EndpointSpec {
                description: "Overall survival at 24 months".to_string(),
                kind: EndpointKind::TimeToEvent,
                subjective: false,
            },
            start_date: Some(19_000),
            primary_completion_date: Some(20_100),
        },
        analysis_plan: AnalysisPlan::default(),
        results: TrialResults::default(),
        versions: vec![],
    }
}
