use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, StateError};

/// Opaque template the workload controller stamps new pods from.
pub type PodTemplate = serde_json::Map<String, serde_json::Value>;

// --- Workload kind ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum WorkloadKind {
    #[default]
    Deployment,
    StatefulSet,
}

// --- Workload ---

/// Desired state for a Deployment or StatefulSet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workload {
    pub id: String,
    pub namespace: String,
    #[serde(default)]
    pub kind: WorkloadKind,
    desired_replicas: u32,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Label selector for matching pods
    #[serde(default)]
    pub selector: HashMap<String, String>,
    #[serde(default)]
    pub pod_template: PodTemplate,
}

impl Workload {
    pub fn new(id: impl Into<String>, namespace: impl Into<String>, desired_replicas: u32) -> Self {
        Self {
            id: id.into(),
            namespace: namespace.into(),
            kind: WorkloadKind::Deployment,
            desired_replicas,
            labels: HashMap::new(),
            selector: HashMap::new(),
            pod_template: PodTemplate::new(),
        }
    }

    pub fn desired_replicas(&self) -> u32 {
        self.desired_replicas
    }

    /// Set the desired replica count. Negative targets are rejected.
    pub fn scale_to(&mut self, replicas: i64) -> Result<()> {
        let replicas = u32::try_from(replicas).map_err(|_| StateError::InvalidReplicaCount {
            workload_id: self.id.clone(),
            requested: replicas,
        })?;
        self.desired_replicas = replicas;
        Ok(())
    }

    /// Copy of the pod template for creating a new replica.
    pub fn create_pod_spec(&self) -> PodTemplate {
        self.pod_template.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_to() {
        let mut w = Workload::new("web", "default", 3);
        w.scale_to(7).unwrap();
        assert_eq!(w.desired_replicas(), 7);
        w.scale_to(0).unwrap();
        assert_eq!(w.desired_replicas(), 0);
    }

    #[test]
    fn test_scale_to_negative_is_rejected() {
        let mut w = Workload::new("web", "default", 3);
        let err = w.scale_to(-1).unwrap_err();
        assert_eq!(
            err,
            StateError::InvalidReplicaCount {
                workload_id: "web".into(),
                requested: -1,
            }
        );
        assert_eq!(w.desired_replicas(), 3);
    }

    #[test]
    fn test_create_pod_spec_is_a_copy() {
        let mut w = Workload::new("web", "default", 1);
        w.pod_template
            .insert("cpu_request".into(), serde_json::json!(0.5));
        let mut spec = w.create_pod_spec();
        spec.insert("cpu_request".into(), serde_json::json!(9.0));
        assert_eq!(w.pod_template["cpu_request"], serde_json::json!(0.5));
    }
}
