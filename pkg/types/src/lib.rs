//! Entity model for the k3rs cluster simulator.
//!
//! Nodes, pods, workloads, autoscalers and network policies are passive
//! records with small invariant-preserving methods. [`cluster::ClusterState`]
//! owns all of them, addressed by identifier.

pub mod cluster;
pub mod config;
pub mod error;
pub mod hpa;
pub mod network_policy;
pub mod node;
pub mod pod;
pub mod validate;
pub mod workload;

pub use error::{Result, StateError};
