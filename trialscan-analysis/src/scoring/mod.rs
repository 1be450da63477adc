//! Log-odds combination and stop-rule overrides.

pub mod engine;
pub mod stop_rules;

pub use engine::ScoringEngine;
pub use stop_rules::CompiledStopRule;
