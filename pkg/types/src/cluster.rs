//! Identifier-addressed arena holding every simulated entity.
//!
//! The scheduler and chaos manager never keep copies of entities; they take
//! `&mut ClusterState` for the duration of one phase and look entities up by
//! id. Maps are ordered so iteration is always by identifier ascending.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{EntityKind, Result, StateError};
use crate::hpa::HorizontalPodAutoscaler;
use crate::network_policy::NetworkPolicy;
use crate::node::Node;
use crate::pod::Pod;
use crate::workload::Workload;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClusterState {
    nodes: BTreeMap<String, Node>,
    pods: BTreeMap<String, Pod>,
    workloads: BTreeMap<String, Workload>,
    hpas: BTreeMap<String, HorizontalPodAutoscaler>,
    network_policies: BTreeMap<String, NetworkPolicy>,
}

fn insert_unique<T>(
    map: &mut BTreeMap<String, T>,
    kind: EntityKind,
    id: String,
    value: T,
) -> Result<()> {
    if map.contains_key(&id) {
        return Err(StateError::InvalidSpec {
            kind,
            id,
            reason: "duplicate identifier".into(),
        });
    }
    debug!("Registered {} {}", kind, id);
    map.insert(id, value);
    Ok(())
}

impl ClusterState {
    pub fn new() -> Self {
        Self::default()
    }

    // --- insertion (controller side) ---

    pub fn insert_node(&mut self, node: Node) -> Result<()> {
        node.validate()?;
        insert_unique(&mut self.nodes, EntityKind::Node, node.id.clone(), node)
    }

    /// Insert a pod. A pod that is already placed must reference a known node.
    pub fn insert_pod(&mut self, pod: Pod) -> Result<()> {
        pod.validate()?;
        if let Some(node_id) = pod.assigned_node() {
            if !self.nodes.contains_key(node_id) {
                return Err(StateError::not_found(EntityKind::Node, node_id));
            }
        }
        insert_unique(&mut self.pods, EntityKind::Pod, pod.id.clone(), pod)
    }

    pub fn insert_workload(&mut self, workload: Workload) -> Result<()> {
        insert_unique(
            &mut self.workloads,
            EntityKind::Workload,
            workload.id.clone(),
            workload,
        )
    }

    pub fn insert_hpa(&mut self, hpa: HorizontalPodAutoscaler) -> Result<()> {
        hpa.validate()?;
        insert_unique(&mut self.hpas, EntityKind::Hpa, hpa.id.clone(), hpa)
    }

    pub fn insert_network_policy(&mut self, policy: NetworkPolicy) -> Result<()> {
        insert_unique(
            &mut self.network_policies,
            EntityKind::NetworkPolicy,
            policy.id.clone(),
            policy,
        )
    }

    // --- lookups ---

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn pod(&self, id: &str) -> Option<&Pod> {
        self.pods.get(id)
    }

    pub fn pod_mut(&mut self, id: &str) -> Option<&mut Pod> {
        self.pods.get_mut(id)
    }

    pub fn pods(&self) -> impl Iterator<Item = &Pod> {
        self.pods.values()
    }

    pub fn pods_mut(&mut self) -> impl Iterator<Item = &mut Pod> {
        self.pods.values_mut()
    }

    pub fn workload(&self, id: &str) -> Option<&Workload> {
        self.workloads.get(id)
    }

    pub fn workload_mut(&mut self, id: &str) -> Option<&mut Workload> {
        self.workloads.get_mut(id)
    }

    pub fn workloads(&self) -> impl Iterator<Item = &Workload> {
        self.workloads.values()
    }

    pub fn hpa(&self, id: &str) -> Option<&HorizontalPodAutoscaler> {
        self.hpas.get(id)
    }

    pub fn hpa_mut(&mut self, id: &str) -> Option<&mut HorizontalPodAutoscaler> {
        self.hpas.get_mut(id)
    }

    pub fn hpa_ids(&self) -> Vec<String> {
        self.hpas.keys().cloned().collect()
    }

    pub fn network_policy(&self, id: &str) -> Option<&NetworkPolicy> {
        self.network_policies.get(id)
    }

    pub fn network_policy_mut(&mut self, id: &str) -> Option<&mut NetworkPolicy> {
        self.network_policies.get_mut(id)
    }

    pub fn network_policies(&self) -> impl Iterator<Item = &NetworkPolicy> {
        self.network_policies.values()
    }

    /// Both halves of a placement, borrowed together.
    pub fn pod_and_node_mut(&mut self, pod_id: &str, node_id: &str) -> Option<(&mut Pod, &mut Node)> {
        let pod = self.pods.get_mut(pod_id)?;
        let node = self.nodes.get_mut(node_id)?;
        Some((pod, node))
    }

    // --- derived views ---

    /// Pending pod ids, ascending.
    pub fn pending_pod_ids(&self) -> Vec<String> {
        self.pods
            .values()
            .filter(|p| p.is_pending())
            .map(|p| p.id.clone())
            .collect()
    }

    /// Pods owned by a workload, ascending by id.
    pub fn pods_of_workload<'a>(&'a self, workload_id: &'a str) -> impl Iterator<Item = &'a Pod> {
        self.pods
            .values()
            .filter(move |p| p.workload_id == workload_id)
    }
}
