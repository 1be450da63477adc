//! Stable machine-readable error codes.
//!
//! Hosts log and route on these codes; they must never change once shipped.

pub const CONFIG_NOT_FOUND: &str = "TS-CONFIG-001";
pub const CONFIG_PARSE: &str = "TS-CONFIG-002";
pub const CONFIG_VALIDATION: &str = "TS-CONFIG-003";
pub const EXPR_PARSE: &str = "TS-EXPR-001";

/// Maps every Trialscan error to a stable machine-readable code.
pub trait TrialscanErrorCode {
    fn error_code(&self) -> &'static str;
}
