use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::cluster::ClusterState;
use crate::hpa::HorizontalPodAutoscaler;
use crate::network_policy::NetworkPolicy;
use crate::node::{Node, Taint};
use crate::pod::{Pod, ResourceRequirements};
use crate::validate::validate_name;
use crate::workload::Workload;

/// Simulation scenario file (YAML).
///
/// Example `scenario.yaml`:
/// ```yaml
/// ticks: 3
/// nodes:
///   - id: n1
///     cpu_capacity: 4
///     mem_capacity: 8000000000
/// pods:
///   - id: p1
///     workload_id: web
///     cpu_request: 2
///     mem_request: 1000000
/// events:
///   - tick: 1
///     type: node_drain
///     node_id: n1
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioFile {
    #[serde(default)]
    pub ticks: Option<u64>,
    /// Default HPA smoothing window for HPAs that do not set one
    #[serde(default, alias = "hpa-window-size")]
    pub hpa_window_size: Option<usize>,
    /// Per-tick multiplier applied to running pod usage
    #[serde(default, alias = "usage-growth")]
    pub usage_growth: Option<f64>,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
    #[serde(default)]
    pub pods: Vec<PodConfig>,
    #[serde(default)]
    pub workloads: Vec<Workload>,
    #[serde(default)]
    pub hpas: Vec<HpaConfig>,
    #[serde(default, alias = "network-policies")]
    pub network_policies: Vec<NetworkPolicy>,
    /// Chaos schedule, kept untyped until the chaos manager parses it.
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    pub cpu_capacity: f64,
    pub mem_capacity: f64,
    /// Defaults to the capacity
    #[serde(default)]
    pub allocatable_cpu: Option<f64>,
    #[serde(default)]
    pub allocatable_mem: Option<f64>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub taints: Vec<Taint>,
}

/// Pods in a scenario always start pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodConfig {
    pub id: String,
    pub workload_id: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    pub cpu_request: f64,
    pub mem_request: f64,
    /// Defaults to the request
    #[serde(default)]
    pub cpu_limit: Option<f64>,
    #[serde(default)]
    pub mem_limit: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HpaConfig {
    pub id: String,
    pub workload_id: String,
    pub target_utilization_percent: f64,
    pub min_replicas: u32,
    pub max_replicas: u32,
    #[serde(default)]
    pub window_size: Option<usize>,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl NodeConfig {
    fn to_node(&self) -> Node {
        let capacity = ResourceRequirements::new(self.cpu_capacity, self.mem_capacity);
        let allocatable = ResourceRequirements::new(
            self.allocatable_cpu.unwrap_or(self.cpu_capacity),
            self.allocatable_mem.unwrap_or(self.mem_capacity),
        );
        let mut node = Node::new(self.id.clone(), capacity, allocatable);
        node.labels = self.labels.clone();
        node.taints = self.taints.clone();
        node
    }
}

impl PodConfig {
    fn to_pod(&self) -> Pod {
        let requests = ResourceRequirements::new(self.cpu_request, self.mem_request);
        let limits = ResourceRequirements::new(
            self.cpu_limit.unwrap_or(self.cpu_request),
            self.mem_limit.unwrap_or(self.mem_request),
        );
        Pod::new(
            self.id.clone(),
            self.workload_id.clone(),
            self.namespace.clone(),
            requests,
            limits,
        )
        .with_labels(self.labels.clone())
    }
}

impl ScenarioFile {
    /// Validate identifiers and build the initial cluster.
    pub fn build_cluster(&self) -> anyhow::Result<ClusterState> {
        let mut cluster = ClusterState::new();

        for cfg in &self.nodes {
            validate_name(&cfg.id)?;
            cluster
                .insert_node(cfg.to_node())
                .with_context(|| format!("node {}", cfg.id))?;
        }
        for workload in &self.workloads {
            validate_name(&workload.id)?;
            cluster
                .insert_workload(workload.clone())
                .with_context(|| format!("workload {}", workload.id))?;
        }
        for cfg in &self.pods {
            validate_name(&cfg.id)?;
            cluster
                .insert_pod(cfg.to_pod())
                .with_context(|| format!("pod {}", cfg.id))?;
        }
        for cfg in &self.hpas {
            validate_name(&cfg.id)?;
            let window = cfg
                .window_size
                .or(self.hpa_window_size)
                .unwrap_or(pkg_constants::scheduling::DEFAULT_METRIC_WINDOW_SIZE);
            let hpa = HorizontalPodAutoscaler::new(
                cfg.id.clone(),
                cfg.workload_id.clone(),
                cfg.target_utilization_percent,
                cfg.min_replicas,
                cfg.max_replicas,
            )
            .with_window_size(window);
            cluster
                .insert_hpa(hpa)
                .with_context(|| format!("hpa {}", cfg.id))?;
        }
        for policy in &self.network_policies {
            validate_name(&policy.id)?;
            cluster
                .insert_network_policy(policy.clone())
                .with_context(|| format!("network policy {}", policy.id))?;
        }

        Ok(cluster)
    }
}

/// Load a YAML config file, returning the default if the file doesn't exist.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(T::default());
        }
        Err(e) => return Err(e.into()),
    };
    parse_config_str(&content)
}

/// Parse YAML config text.
pub fn parse_config_str<T: serde::de::DeserializeOwned>(content: &str) -> anyhow::Result<T> {
    let config: T = serde_yaml::from_str(content)?;
    Ok(config)
}
