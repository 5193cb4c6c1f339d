//! Filesystem path constants.

/// Default scenario file read by `k3rs-sim`.
pub const DEFAULT_SCENARIO_CONFIG: &str = "scenario.yaml";
