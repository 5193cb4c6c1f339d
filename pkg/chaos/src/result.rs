//! Structured per-event results.

use pkg_types::StateError;
use pkg_types::pod::PodPhase;
use serde::Serialize;
use serde_json::Value;

use crate::event::ChaosError;

/// A schedule entry paired with what happened when it ran.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EventOutcome {
    pub event: Value,
    pub result: EventResult,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EventResult {
    Executed(EventDetail),
    Failed(EventFailure),
}

impl EventResult {
    pub fn is_executed(&self) -> bool {
        matches!(self, EventResult::Executed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, EventResult::Failed(_))
    }

    pub fn detail(&self) -> Option<&EventDetail> {
        match self {
            EventResult::Executed(detail) => Some(detail),
            EventResult::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&EventFailure> {
        match self {
            EventResult::Executed(_) => None,
            EventResult::Failed(failure) => Some(failure),
        }
    }
}

/// Handler-specific fields of an executed event.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum EventDetail {
    PodCrashed {
        pod_id: String,
        new_phase: PodPhase,
        restart_count: u32,
    },
    NodeCordoned {
        node_id: String,
        cordoned: bool,
    },
    CpuBurst {
        affected_count: usize,
        affected_pods: Vec<CpuBurstEntry>,
    },
    MemoryStorm {
        affected_count: usize,
        affected_pods: Vec<MemoryStormEntry>,
    },
    PolicyEnforced {
        policy_id: String,
        enforced: bool,
    },
    ProbeFailed {
        pod_id: String,
        last_probe_success: bool,
        phase: PodPhase,
        restart_count: u32,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CpuBurstEntry {
    pub pod_id: String,
    pub old_cpu_usage: f64,
    pub new_cpu_usage: f64,
    pub limit: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MemoryStormEntry {
    pub pod_id: String,
    pub old_mem_usage: f64,
    pub new_mem_usage: f64,
    pub limit: f64,
    pub crashed: bool,
    pub restart_count: u32,
}

/// Why an event produced no mutation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EventFailure {
    pub reason: String,
    /// Raw type string, set when the type itself was the problem
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    /// Identifier that failed to resolve
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
}

impl From<ChaosError> for EventFailure {
    fn from(err: ChaosError) -> Self {
        let event_type = match &err {
            ChaosError::UnknownEventType(t) => t.clone(),
            ChaosError::InvalidPayload { event_type, .. } => event_type.clone(),
        };
        Self {
            reason: err.to_string(),
            event_type: Some(event_type),
            target_id: None,
        }
    }
}

impl From<StateError> for EventFailure {
    fn from(err: StateError) -> Self {
        let target_id = match &err {
            StateError::NotFound { id, .. } => Some(id.clone()),
            _ => None,
        };
        Self {
            reason: err.to_string(),
            event_type: None,
            target_id,
        }
    }
}
