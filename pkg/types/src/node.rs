use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::error::{EntityKind, Result, StateError};
use crate::pod::ResourceRequirements;

// --- Taint ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum TaintEffect {
    #[default]
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

impl TaintEffect {
    /// Hard effects repel every pod; pods carry no tolerations.
    pub fn is_blocking(self) -> bool {
        matches!(self, TaintEffect::NoSchedule | TaintEffect::NoExecute)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Taint {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub effect: TaintEffect,
}

// --- Node ---

/// A placement target.
///
/// `assign_pod` and `remove_pod` are the only placement-time mutators of
/// usage and the running-pod set. Chaos may push usage past allocatable
/// through [`Node::add_usage`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub taints: Vec<Taint>,
    pub capacity: ResourceRequirements,
    /// Capacity left after system reservation
    pub allocatable: ResourceRequirements,
    #[serde(default)]
    usage: ResourceRequirements,
    /// If true, the scheduler will not place new pods on this node.
    #[serde(default)]
    cordoned: bool,
    #[serde(default)]
    pods_running: BTreeSet<String>,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        capacity: ResourceRequirements,
        allocatable: ResourceRequirements,
    ) -> Self {
        Self {
            id: id.into(),
            labels: HashMap::new(),
            taints: vec![],
            capacity,
            allocatable,
            usage: ResourceRequirements::default(),
            cordoned: false,
            pods_running: BTreeSet::new(),
        }
    }

    pub fn with_taint(mut self, taint: Taint) -> Self {
        self.taints.push(taint);
        self
    }

    pub fn usage(&self) -> ResourceRequirements {
        self.usage
    }

    pub fn is_cordoned(&self) -> bool {
        self.cordoned
    }

    pub fn pods_running(&self) -> &BTreeSet<String> {
        &self.pods_running
    }

    pub fn available_cpu(&self) -> f64 {
        self.allocatable.cpu - self.usage.cpu
    }

    pub fn available_mem(&self) -> f64 {
        self.allocatable.memory - self.usage.memory
    }

    pub fn can_fit_pod(&self, cpu_request: f64, mem_request: f64) -> bool {
        if self.cordoned {
            return false;
        }
        self.available_cpu() >= cpu_request && self.available_mem() >= mem_request
    }

    pub fn has_blocking_taint(&self) -> bool {
        self.taints.iter().any(|t| t.effect.is_blocking())
    }

    /// Exclude the node from new placements. Running pods are untouched.
    pub fn cordon(&mut self) {
        self.cordoned = true;
    }

    /// Track a pod and charge its requests against this node.
    pub fn assign_pod(&mut self, pod_id: &str, cpu_request: f64, mem_request: f64) -> Result<()> {
        if !self.can_fit_pod(cpu_request, mem_request) {
            return Err(StateError::InsufficientCapacity {
                node_id: self.id.clone(),
                pod_id: pod_id.to_string(),
                available_cpu: self.available_cpu(),
                cpu_request,
                available_mem: self.available_mem(),
                mem_request,
            });
        }
        self.pods_running.insert(pod_id.to_string());
        self.usage.cpu += cpu_request;
        self.usage.memory += mem_request;
        Ok(())
    }

    /// Stop tracking a pod and release resources, never going below zero.
    /// An unknown pod id still releases the given amounts.
    pub fn remove_pod(&mut self, pod_id: &str, cpu_request: f64, mem_request: f64) {
        self.pods_running.remove(pod_id);
        self.usage.cpu = (self.usage.cpu - cpu_request).max(0.0);
        self.usage.memory = (self.usage.memory - mem_request).max(0.0);
    }

    /// Raise usage without a capacity check (chaos load injection).
    pub fn add_usage(&mut self, cpu: f64, memory: f64) {
        self.usage.cpu += cpu;
        self.usage.memory += memory;
    }

    /// Check construction-time constraints.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| StateError::InvalidSpec {
            kind: EntityKind::Node,
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.allocatable.cpu > self.capacity.cpu || self.allocatable.memory > self.capacity.memory
        {
            return Err(invalid("allocatable exceeds capacity"));
        }
        if self.allocatable.cpu < 0.0 || self.allocatable.memory < 0.0 {
            return Err(invalid("allocatable must not be negative"));
        }
        if self.usage.cpu < 0.0 || self.usage.memory < 0.0 {
            return Err(invalid("usage must not be negative"));
        }
        Ok(())
    }
}
