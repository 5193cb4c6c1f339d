//! Scheduling and autoscaling constants.

/// Number of utilization samples an HPA keeps when no size is configured.
pub const DEFAULT_METRIC_WINDOW_SIZE: usize = 5;

/// Maximum length of an entity identifier.
pub const MAX_NAME_LEN: usize = 63;
