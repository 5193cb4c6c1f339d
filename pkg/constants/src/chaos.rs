//! Chaos event type names as they appear in scenario schedules.

pub const POD_CRASH: &str = "pod_crash";
pub const NODE_CORDON: &str = "node_cordon";
pub const NODE_DRAIN: &str = "node_drain";
pub const BURST_TRAFFIC: &str = "burst_traffic";
pub const OOM_STORM: &str = "oom_storm";
pub const NETPOL_LOCKOUT: &str = "netpol_lockout";
pub const PROBE_FAILURE: &str = "probe_failure";

/// Every event type the dispatcher knows, in dispatch-table order.
pub const SUPPORTED_EVENT_TYPES: &[&str] = &[
    POD_CRASH,
    NODE_CORDON,
    NODE_DRAIN,
    BURST_TRAFFIC,
    OOM_STORM,
    NETPOL_LOCKOUT,
    PROBE_FAILURE,
];
