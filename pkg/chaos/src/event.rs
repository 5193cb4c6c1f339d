//! Typed chaos events and the parse step from raw schedule entries.

use pkg_constants::chaos::{
    BURST_TRAFFIC, NETPOL_LOCKOUT, NODE_CORDON, NODE_DRAIN, OOM_STORM, POD_CRASH, PROBE_FAILURE,
    SUPPORTED_EVENT_TYPES,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Why a raw schedule entry could not become a [`ChaosEvent`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChaosError {
    #[error(
        "Unknown chaos event type: '{0}'. Supported types: {supported:?}",
        supported = SUPPORTED_EVENT_TYPES
    )]
    UnknownEventType(String),

    #[error("invalid {event_type} event: {message}")]
    InvalidPayload { event_type: String, message: String },
}

/// One chaos event with its typed payload.
///
/// Target identifiers are optional: a schedule entry that omits one is
/// still dispatched and reported as a missing target, the same way as an
/// identifier that names nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChaosEvent {
    PodCrash {
        #[serde(default)]
        pod_id: Option<String>,
    },
    NodeCordon {
        #[serde(default)]
        node_id: Option<String>,
    },
    /// Cordon only; running pods are not evicted.
    NodeDrain {
        #[serde(default)]
        node_id: Option<String>,
    },
    BurstTraffic {
        #[serde(default)]
        pod_ids: Vec<String>,
        /// Cores added to each pod
        #[serde(default)]
        cpu_increase: f64,
    },
    OomStorm {
        #[serde(default)]
        pod_ids: Vec<String>,
        /// Bytes added to each pod
        #[serde(default)]
        memory_increase: f64,
    },
    NetpolLockout {
        #[serde(default)]
        policy_id: Option<String>,
    },
    ProbeFailure {
        #[serde(default)]
        pod_id: Option<String>,
    },
}

impl ChaosEvent {
    /// Parse a raw schedule entry. Unknown types are rejected before any
    /// payload decoding.
    pub fn parse(raw: &Value) -> Result<Self, ChaosError> {
        let event_type = raw.get("type").and_then(Value::as_str).unwrap_or_default();
        if !SUPPORTED_EVENT_TYPES.contains(&event_type) {
            return Err(ChaosError::UnknownEventType(event_type.to_string()));
        }
        serde_json::from_value(raw.clone()).map_err(|e| ChaosError::InvalidPayload {
            event_type: event_type.to_string(),
            message: e.to_string(),
        })
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            ChaosEvent::PodCrash { .. } => POD_CRASH,
            ChaosEvent::NodeCordon { .. } => NODE_CORDON,
            ChaosEvent::NodeDrain { .. } => NODE_DRAIN,
            ChaosEvent::BurstTraffic { .. } => BURST_TRAFFIC,
            ChaosEvent::OomStorm { .. } => OOM_STORM,
            ChaosEvent::NetpolLockout { .. } => NETPOL_LOCKOUT,
            ChaosEvent::ProbeFailure { .. } => PROBE_FAILURE,
        }
    }
}

/// The tick a raw entry is scheduled for, if it has a usable one.
pub fn scheduled_tick(raw: &Value) -> Option<u64> {
    let tick = raw.get("tick")?;
    tick.as_u64().or_else(|| {
        tick.as_f64()
            .filter(|t| *t >= 0.0 && t.fract() == 0.0)
            .map(|t| t as u64)
    })
}
