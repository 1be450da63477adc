//! Versioned, immutable-per-run calibration configuration.

pub mod calibration;
pub mod signal_thresholds;

pub use calibration::{
    CalibrationConfig, GateSpec, GlobalBounds, PrimitiveSpec, ResolvedBounds, SeverityLrs,
    StopRuleSpec,
};
pub use signal_thresholds::{HeapingKey, SignalThresholds};
