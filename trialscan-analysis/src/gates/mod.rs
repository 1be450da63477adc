//! Declarative gate evaluation over the fired-signal set.

pub mod engine;

pub use engine::{CompiledGate, GateEngine};
