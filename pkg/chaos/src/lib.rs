//! Deterministic chaos injection.
//!
//! A [`ChaosManager`] owns a static schedule of raw event entries. On each
//! tick it runs, in schedule order, exactly the entries whose `tick` equals
//! the current tick. Each entry is parsed into a typed [`ChaosEvent`] and
//! applied to the cluster through the entity methods. Failures (unknown
//! type, bad payload, missing target) become `failed` results and never stop
//! the rest of the tick's batch.
//!
//! The schedule is never consumed: running the same tick twice applies its
//! events twice.

pub mod event;
pub mod result;

use pkg_types::cluster::ClusterState;
use pkg_types::error::{EntityKind, StateError};
use serde_json::Value;
use tracing::{error, info, warn};

pub use event::{ChaosError, ChaosEvent};
pub use result::{
    CpuBurstEntry, EventDetail, EventFailure, EventOutcome, EventResult, MemoryStormEntry,
};

/// Placeholder identifier for an event that names no target.
const MISSING_ID: &str = "<missing>";

pub struct ChaosManager {
    schedule: Vec<Value>,
}

impl ChaosManager {
    pub fn new(schedule: Vec<Value>) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &[Value] {
        &self.schedule
    }

    /// Run every event scheduled for `tick`, in schedule order.
    pub fn execute_events_for_tick(
        &self,
        cluster: &mut ClusterState,
        tick: u64,
    ) -> Vec<EventOutcome> {
        self.schedule
            .iter()
            .filter(|raw| event::scheduled_tick(raw) == Some(tick))
            .map(|raw| EventOutcome {
                event: raw.clone(),
                result: self.dispatch_event(cluster, raw),
            })
            .collect()
    }

    /// Parse and apply one raw entry.
    pub fn dispatch_event(&self, cluster: &mut ClusterState, raw: &Value) -> EventResult {
        let event = match ChaosEvent::parse(raw) {
            Ok(event) => event,
            Err(e) => {
                error!("{}", e);
                return EventResult::Failed(e.into());
            }
        };

        match self.apply(cluster, &event) {
            Ok(detail) => {
                info!("Chaos event {} executed", event.event_type());
                EventResult::Executed(detail)
            }
            Err(e) => {
                warn!("Chaos event {} failed: {}", event.event_type(), e);
                EventResult::Failed(e.into())
            }
        }
    }

    /// Apply a typed event. Only single-target events can fail.
    pub fn apply(
        &self,
        cluster: &mut ClusterState,
        event: &ChaosEvent,
    ) -> Result<EventDetail, StateError> {
        match event {
            ChaosEvent::PodCrash { pod_id } => handle_pod_crash(cluster, pod_id.as_deref()),
            ChaosEvent::NodeCordon { node_id } | ChaosEvent::NodeDrain { node_id } => {
                handle_node_cordon(cluster, node_id.as_deref())
            }
            ChaosEvent::BurstTraffic {
                pod_ids,
                cpu_increase,
            } => Ok(handle_burst_traffic(cluster, pod_ids, *cpu_increase)),
            ChaosEvent::OomStorm {
                pod_ids,
                memory_increase,
            } => Ok(handle_oom_storm(cluster, pod_ids, *memory_increase)),
            ChaosEvent::NetpolLockout { policy_id } => {
                handle_netpol_lockout(cluster, policy_id.as_deref())
            }
            ChaosEvent::ProbeFailure { pod_id } => {
                handle_probe_failure(cluster, pod_id.as_deref())
            }
        }
    }
}

fn missing(kind: EntityKind, id: Option<&str>) -> StateError {
    StateError::not_found(kind, id.unwrap_or(MISSING_ID))
}

fn handle_pod_crash(
    cluster: &mut ClusterState,
    pod_id: Option<&str>,
) -> Result<EventDetail, StateError> {
    let pod = pod_id
        .and_then(|id| cluster.pod_mut(id))
        .ok_or_else(|| missing(EntityKind::Pod, pod_id))?;

    pod.crash();

    Ok(EventDetail::PodCrashed {
        pod_id: pod.id.clone(),
        new_phase: pod.phase(),
        restart_count: pod.restart_count(),
    })
}

/// Cordon and drain share one effect: the node stops taking new pods.
fn handle_node_cordon(
    cluster: &mut ClusterState,
    node_id: Option<&str>,
) -> Result<EventDetail, StateError> {
    let node = node_id
        .and_then(|id| cluster.node_mut(id))
        .ok_or_else(|| missing(EntityKind::Node, node_id))?;

    node.cordon();

    Ok(EventDetail::NodeCordoned {
        node_id: node.id.clone(),
        cordoned: node.is_cordoned(),
    })
}

/// Pod usage is capped at its limit, but the node is charged the full
/// amount and may exceed allocatable.
fn handle_burst_traffic(
    cluster: &mut ClusterState,
    pod_ids: &[String],
    cpu_increase: f64,
) -> EventDetail {
    let mut affected_pods = Vec::new();

    for pod_id in pod_ids {
        let Some(pod) = cluster.pod_mut(pod_id) else {
            continue;
        };
        let old_cpu_usage = pod.add_cpu_usage(cpu_increase);
        let entry = CpuBurstEntry {
            pod_id: pod_id.clone(),
            old_cpu_usage,
            new_cpu_usage: pod.usage().cpu,
            limit: pod.limits.cpu,
        };
        let node_id = pod.assigned_node().map(str::to_string);

        if let Some(node) = node_id.and_then(|id| cluster.node_mut(&id)) {
            node.add_usage(cpu_increase, 0.0);
        }
        affected_pods.push(entry);
    }

    EventDetail::CpuBurst {
        affected_count: affected_pods.len(),
        affected_pods,
    }
}

/// Memory is added without a cap; a pod pushed past its limit crashes. The
/// node is charged whether or not the pod crashed.
fn handle_oom_storm(
    cluster: &mut ClusterState,
    pod_ids: &[String],
    memory_increase: f64,
) -> EventDetail {
    let mut affected_pods = Vec::new();

    for pod_id in pod_ids {
        let Some(pod) = cluster.pod_mut(pod_id) else {
            continue;
        };
        let old_mem_usage = pod.add_mem_usage(memory_increase);
        let crashed = pod.exceeds_mem_limit();
        if crashed {
            pod.crash();
        }
        let entry = MemoryStormEntry {
            pod_id: pod_id.clone(),
            old_mem_usage,
            new_mem_usage: pod.usage().memory,
            limit: pod.limits.memory,
            crashed,
            restart_count: pod.restart_count(),
        };
        let node_id = pod.assigned_node().map(str::to_string);

        if let Some(node) = node_id.and_then(|id| cluster.node_mut(&id)) {
            node.add_usage(0.0, memory_increase);
        }
        affected_pods.push(entry);
    }

    EventDetail::MemoryStorm {
        affected_count: affected_pods.len(),
        affected_pods,
    }
}

fn handle_netpol_lockout(
    cluster: &mut ClusterState,
    policy_id: Option<&str>,
) -> Result<EventDetail, StateError> {
    let policy = policy_id
        .and_then(|id| cluster.network_policy_mut(id))
        .ok_or_else(|| missing(EntityKind::NetworkPolicy, policy_id))?;

    policy.set_enforced(true);

    Ok(EventDetail::PolicyEnforced {
        policy_id: policy.id.clone(),
        enforced: policy.is_enforced(),
    })
}

fn handle_probe_failure(
    cluster: &mut ClusterState,
    pod_id: Option<&str>,
) -> Result<EventDetail, StateError> {
    let pod = pod_id
        .and_then(|id| cluster.pod_mut(id))
        .ok_or_else(|| missing(EntityKind::Pod, pod_id))?;

    pod.fail_probe();

    Ok(EventDetail::ProbeFailed {
        pod_id: pod.id.clone(),
        last_probe_success: pod.last_probe_success(),
        phase: pod.phase(),
        restart_count: pod.restart_count(),
    })
}
