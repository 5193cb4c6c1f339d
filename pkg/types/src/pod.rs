use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{EntityKind, Result, StateError};

// --- Resource requirements ---

/// A cpu/memory pair. CPU is in cores, memory in bytes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct ResourceRequirements {
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub memory: f64,
}

impl ResourceRequirements {
    pub fn new(cpu: f64, memory: f64) -> Self {
        Self { cpu, memory }
    }
}

// --- Pod phase ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PodPhase {
    #[default]
    Pending,
    Running,
    CrashLoop,
    Succeeded,
}

impl std::fmt::Display for PodPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PodPhase::Pending => write!(f, "pending"),
            PodPhase::Running => write!(f, "running"),
            PodPhase::CrashLoop => write!(f, "crash_loop"),
            PodPhase::Succeeded => write!(f, "succeeded"),
        }
    }
}

// --- Pod ---

/// One pending or running unit of work.
///
/// Phase, node assignment, usage and restart count only change through the
/// methods below so that `running ⇒ assigned` and the monotonic restart
/// counter hold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pod {
    pub id: String,
    /// Owning workload
    pub workload_id: String,
    pub namespace: String,
    /// Labels presented as the source of ingress traffic
    #[serde(default)]
    pub labels: HashMap<String, String>,
    pub requests: ResourceRequirements,
    pub limits: ResourceRequirements,
    /// Simulated consumption, starts at the request values once placed
    #[serde(default)]
    usage: ResourceRequirements,
    #[serde(default)]
    phase: PodPhase,
    #[serde(default)]
    restart_count: u32,
    /// The node this pod is assigned to (set by scheduler)
    #[serde(default)]
    assigned_node: Option<String>,
    #[serde(default = "default_probe_success")]
    last_probe_success: bool,
}

fn default_probe_success() -> bool {
    true
}

impl Pod {
    /// A new pending pod with zero usage.
    pub fn new(
        id: impl Into<String>,
        workload_id: impl Into<String>,
        namespace: impl Into<String>,
        requests: ResourceRequirements,
        limits: ResourceRequirements,
    ) -> Self {
        Self {
            id: id.into(),
            workload_id: workload_id.into(),
            namespace: namespace.into(),
            labels: HashMap::new(),
            requests,
            limits,
            usage: ResourceRequirements::default(),
            phase: PodPhase::Pending,
            restart_count: 0,
            assigned_node: None,
            last_probe_success: true,
        }
    }

    pub fn with_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn phase(&self) -> PodPhase {
        self.phase
    }

    pub fn restart_count(&self) -> u32 {
        self.restart_count
    }

    pub fn assigned_node(&self) -> Option<&str> {
        self.assigned_node.as_deref()
    }

    pub fn usage(&self) -> ResourceRequirements {
        self.usage
    }

    pub fn last_probe_success(&self) -> bool {
        self.last_probe_success
    }

    pub fn is_running(&self) -> bool {
        self.phase == PodPhase::Running
    }

    pub fn is_pending(&self) -> bool {
        self.phase == PodPhase::Pending
    }

    /// Transition to crash_loop. Every call counts as one restart.
    pub fn crash(&mut self) {
        self.phase = PodPhase::CrashLoop;
        self.restart_count += 1;
    }

    /// Mark the last probe as failed and crash the pod.
    pub fn fail_probe(&mut self) {
        self.last_probe_success = false;
        self.crash();
    }

    /// Place the pod on `node_id`; usage starts at the request values.
    pub fn start_running(&mut self, node_id: impl Into<String>) {
        self.phase = PodPhase::Running;
        self.assigned_node = Some(node_id.into());
        self.usage = self.requests;
    }

    /// Multiply CPU usage, capped at the limit.
    pub fn spike_cpu_usage(&mut self, multiplier: f64) {
        self.usage.cpu = (self.usage.cpu * multiplier).min(self.limits.cpu);
    }

    /// Multiply memory usage, capped at the limit.
    pub fn spike_mem_usage(&mut self, multiplier: f64) {
        self.usage.memory = (self.usage.memory * multiplier).min(self.limits.memory);
    }

    /// Add to CPU usage, capped at the limit. Returns the previous value.
    pub fn add_cpu_usage(&mut self, amount: f64) -> f64 {
        let old = self.usage.cpu;
        self.usage.cpu = (old + amount).min(self.limits.cpu);
        old
    }

    /// Add to memory usage without a cap. Returns the previous value.
    ///
    /// Memory past the limit is how OOM kills are detected, see
    /// [`Pod::exceeds_mem_limit`].
    pub fn add_mem_usage(&mut self, amount: f64) -> f64 {
        let old = self.usage.memory;
        self.usage.memory = old + amount;
        old
    }

    pub fn exceeds_mem_limit(&self) -> bool {
        self.usage.memory > self.limits.memory
    }

    /// CPU usage as a percentage of the request, or `None` with no request.
    pub fn cpu_utilization_percent(&self) -> Option<f64> {
        if self.requests.cpu > 0.0 {
            Some(self.usage.cpu / self.requests.cpu * 100.0)
        } else {
            None
        }
    }

    /// Check construction-time constraints.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| StateError::InvalidSpec {
            kind: EntityKind::Pod,
            id: self.id.clone(),
            reason,
        };
        if self.requests.cpu < 0.0 || self.requests.memory < 0.0 {
            return Err(invalid("requests must not be negative".into()));
        }
        if self.requests.cpu > self.limits.cpu || self.requests.memory > self.limits.memory {
            return Err(invalid(format!(
                "requests ({}, {}) exceed limits ({}, {})",
                self.requests.cpu, self.requests.memory, self.limits.cpu, self.limits.memory
            )));
        }
        match (self.phase, self.assigned_node.is_some()) {
            (PodPhase::Running, false) => {
                Err(invalid("running pod has no assigned node".into()))
            }
            (PodPhase::Pending, true) => Err(invalid("pending pod has an assigned node".into())),
            _ => Ok(()),
        }
    }
}
