//! Error types for entity operations.

use thiserror::Error;

/// Errors raised by entity methods and cluster lookups.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    /// A node was asked to take a pod it cannot fit.
    #[error(
        "node {node_id} cannot fit pod {pod_id}: available cpu {available_cpu:.2}/{cpu_request:.2}, available mem {available_mem}/{mem_request}"
    )]
    InsufficientCapacity {
        node_id: String,
        pod_id: String,
        available_cpu: f64,
        cpu_request: f64,
        available_mem: f64,
        mem_request: f64,
    },

    /// A workload was asked to scale to a negative replica count.
    #[error("workload {workload_id} cannot scale to negative replicas: {requested}")]
    InvalidReplicaCount { workload_id: String, requested: i64 },

    /// An identifier did not resolve to an entity.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    /// An entity definition violates a construction-time constraint.
    #[error("invalid {kind} {id}: {reason}")]
    InvalidSpec {
        kind: EntityKind,
        id: String,
        reason: String,
    },
}

impl StateError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// True for contract breaches the caller should treat as a bug.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InsufficientCapacity { .. })
    }
}

/// Entity kinds, used to label lookup failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Node,
    Pod,
    Workload,
    Hpa,
    NetworkPolicy,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Node => write!(f, "Node"),
            EntityKind::Pod => write!(f, "Pod"),
            EntityKind::Workload => write!(f, "Workload"),
            EntityKind::Hpa => write!(f, "HPA"),
            EntityKind::NetworkPolicy => write!(f, "Policy"),
        }
    }
}

/// A specialized Result type for entity operations.
pub type Result<T> = std::result::Result<T, StateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_kind_and_id() {
        let err = StateError::not_found(EntityKind::Pod, "p1");
        assert_eq!(err.to_string(), "Pod p1 not found");
        assert!(!err.is_invariant_violation());
    }

    #[test]
    fn insufficient_capacity_is_invariant_violation() {
        let err = StateError::InsufficientCapacity {
            node_id: "n1".into(),
            pod_id: "p1".into(),
            available_cpu: 1.0,
            cpu_request: 2.0,
            available_mem: 0.0,
            mem_request: 0.0,
        };
        assert!(err.is_invariant_violation());
        assert!(err.to_string().starts_with("node n1 cannot fit pod p1"));
    }
}
