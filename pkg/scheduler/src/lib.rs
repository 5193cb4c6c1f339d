use pkg_types::StateError;
use pkg_types::cluster::ClusterState;
use pkg_types::node::Node;
use pkg_types::pod::Pod;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from explicit placement requests.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("pod {0} not found")]
    PodNotFound(String),

    #[error("node {0} not found")]
    NodeNotFound(String),

    /// Placing a running pod again would charge its node twice.
    #[error("pod {pod_id} is already running on {node_id}")]
    PodAlreadyRunning { pod_id: String, node_id: String },

    /// The node no longer fits the pod. Callers are expected to consult
    /// `select_node` first, so this is a caller ordering bug.
    #[error(transparent)]
    State(#[from] StateError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Outcome of one scheduling pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulingSummary {
    pub scheduled_count: usize,
    pub unschedulable_count: usize,
    /// Pods left pending, in the order they were tried
    pub unschedulable_pods: Vec<String>,
    /// `(pod_id, node_id)` in placement order
    #[serde(default)]
    pub assignments: Vec<(String, String)>,
}

/// First-fit scheduler.
///
/// Nodes are tried by identifier ascending and the first one passing every
/// filter wins; there is no scoring. Pending pods are placed by identifier
/// ascending, so a pass over identical state always produces the same
/// assignments even when earlier placements consume capacity later pods
/// needed.
#[derive(Debug, Default)]
pub struct Scheduler;

impl Scheduler {
    pub fn new() -> Self {
        Self
    }

    /// First node that can run this pod, or `None` if nothing fits.
    pub fn select_node<'a>(&self, pod: &Pod, cluster: &'a ClusterState) -> Option<&'a Node> {
        // `nodes()` iterates by id ascending
        cluster.nodes().find(|n| self.is_node_eligible(n, pod))
    }

    /// Check if a node is eligible to run this pod.
    fn is_node_eligible(&self, node: &Node, pod: &Pod) -> bool {
        // 1. Node must not be cordoned
        if node.is_cordoned() {
            debug!("pod {}: node {} is cordoned", pod.id, node.id);
            return false;
        }

        // 2. CPU
        if node.available_cpu() < pod.requests.cpu {
            debug!(
                "pod {}: node {} has {:.2} cpu free, needs {:.2}",
                pod.id,
                node.id,
                node.available_cpu(),
                pod.requests.cpu
            );
            return false;
        }

        // 3. Memory
        if node.available_mem() < pod.requests.memory {
            debug!(
                "pod {}: node {} has {} memory free, needs {}",
                pod.id,
                node.id,
                node.available_mem(),
                pod.requests.memory
            );
            return false;
        }

        // 4. Taints. Pods carry no tolerations, so any hard taint blocks.
        if node.has_blocking_taint() {
            debug!("pod {}: node {} has a blocking taint", pod.id, node.id);
            return false;
        }

        true
    }

    /// Bind a pod to a node, charging its requests to the node.
    ///
    /// Fit is re-checked by the node; on failure nothing is mutated.
    pub fn assign_pod_to_node(
        &self,
        cluster: &mut ClusterState,
        pod_id: &str,
        node_id: &str,
    ) -> Result<()> {
        if cluster.pod(pod_id).is_none() {
            return Err(SchedulerError::PodNotFound(pod_id.to_string()));
        }
        let (pod, node) = cluster
            .pod_and_node_mut(pod_id, node_id)
            .ok_or_else(|| SchedulerError::NodeNotFound(node_id.to_string()))?;

        if pod.is_running() {
            return Err(SchedulerError::PodAlreadyRunning {
                pod_id: pod_id.to_string(),
                node_id: pod.assigned_node().unwrap_or_default().to_string(),
            });
        }

        node.assign_pod(&pod.id, pod.requests.cpu, pod.requests.memory)?;
        pod.start_running(node.id.clone());

        info!("Scheduled pod {}/{} → node {}", pod.namespace, pod.id, node.id);
        Ok(())
    }

    /// Run one placement pass over every pending pod.
    ///
    /// Pods that fit nowhere stay pending and are reported; they are not
    /// retried within the pass. An error here means a placement that
    /// `select_node` approved was refused by the node.
    pub fn schedule_all_pending(&self, cluster: &mut ClusterState) -> Result<SchedulingSummary> {
        let mut summary = SchedulingSummary::default();

        for pod_id in cluster.pending_pod_ids() {
            let target = match cluster.pod(&pod_id) {
                Some(pod) => self.select_node(pod, cluster).map(|n| n.id.clone()),
                None => continue,
            };

            match target {
                Some(node_id) => {
                    self.assign_pod_to_node(cluster, &pod_id, &node_id)?;
                    summary.scheduled_count += 1;
                    summary.assignments.push((pod_id, node_id));
                }
                None => {
                    info!("No eligible nodes for pod {}", pod_id);
                    summary.unschedulable_pods.push(pod_id);
                }
            }
        }

        summary.unschedulable_count = summary.unschedulable_pods.len();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_types::node::{Taint, TaintEffect};
    use pkg_types::pod::{PodPhase, ResourceRequirements};

    fn make_node(id: &str, cpu: f64, mem: f64) -> Node {
        let res = ResourceRequirements::new(cpu, mem);
        Node::new(id, res, res)
    }

    fn make_pod(id: &str, cpu: f64, mem: f64) -> Pod {
        let res = ResourceRequirements::new(cpu, mem);
        Pod::new(id, "web", "default", res, res)
    }

    fn make_cluster(nodes: Vec<Node>, pods: Vec<Pod>) -> ClusterState {
        let mut cluster = ClusterState::new();
        for n in nodes {
            cluster.insert_node(n).unwrap();
        }
        for p in pods {
            cluster.insert_pod(p).unwrap();
        }
        cluster
    }

    #[test]
    fn test_first_fit_prefers_lowest_id() {
        let scheduler = Scheduler::new();
        let cluster = make_cluster(
            vec![make_node("b", 4.0, 1000.0), make_node("a", 4.0, 1000.0)],
            vec![],
        );
        let pod = make_pod("p1", 1.0, 100.0);
        assert_eq!(scheduler.select_node(&pod, &cluster).map(|n| n.id.as_str()), Some("a"));
    }

    #[test]
    fn test_skip_cordoned_node() {
        let scheduler = Scheduler::new();
        let mut cluster = make_cluster(
            vec![make_node("a", 64.0, 1e12), make_node("b", 1.0, 100.0)],
            vec![],
        );
        cluster.node_mut("a").unwrap().cordon();
        let pod = make_pod("p1", 1.0, 100.0);
        assert_eq!(scheduler.select_node(&pod, &cluster).map(|n| n.id.as_str()), Some("b"));

        cluster.node_mut("b").unwrap().cordon();
        assert!(scheduler.select_node(&pod, &cluster).is_none());
    }

    #[test]
    fn test_skip_hard_taints_only() {
        let scheduler = Scheduler::new();
        let taint = |effect| Taint {
            key: "dedicated".into(),
            value: "infra".into(),
            effect,
        };
        let cluster = make_cluster(
            vec![
                make_node("a", 8.0, 1000.0).with_taint(taint(TaintEffect::NoExecute)),
                make_node("b", 8.0, 1000.0).with_taint(taint(TaintEffect::NoSchedule)),
                make_node("c", 8.0, 1000.0).with_taint(taint(TaintEffect::PreferNoSchedule)),
            ],
            vec![],
        );
        let pod = make_pod("p1", 1.0, 100.0);
        assert_eq!(scheduler.select_node(&pod, &cluster).map(|n| n.id.as_str()), Some("c"));
    }

    #[test]
    fn test_skip_nodes_without_capacity() {
        let scheduler = Scheduler::new();
        let cluster = make_cluster(
            vec![
                make_node("a", 1.0, 1000.0),
                make_node("b", 4.0, 50.0),
                make_node("c", 4.0, 1000.0),
            ],
            vec![],
        );
        let pod = make_pod("p1", 2.0, 100.0);
        assert_eq!(scheduler.select_node(&pod, &cluster).map(|n| n.id.as_str()), Some("c"));
    }

    #[test]
    fn test_assign_updates_pod_and_node() {
        let scheduler = Scheduler::new();
        let mut cluster = make_cluster(
            vec![make_node("n1", 4.0, 1000.0)],
            vec![make_pod("p1", 1.5, 200.0)],
        );
        scheduler.assign_pod_to_node(&mut cluster, "p1", "n1").unwrap();

        let pod = cluster.pod("p1").unwrap();
        assert_eq!(pod.phase(), PodPhase::Running);
        assert_eq!(pod.assigned_node(), Some("n1"));
        assert_eq!(pod.usage(), ResourceRequirements::new(1.5, 200.0));

        let node = cluster.node("n1").unwrap();
        assert!(node.pods_running().contains("p1"));
        assert_eq!(node.usage(), ResourceRequirements::new(1.5, 200.0));
    }

    #[test]
    fn test_assign_without_capacity_is_hard_error() {
        let scheduler = Scheduler::new();
        let mut cluster = make_cluster(
            vec![make_node("n1", 1.0, 1000.0)],
            vec![make_pod("p1", 2.0, 100.0)],
        );
        let err = scheduler
            .assign_pod_to_node(&mut cluster, "p1", "n1")
            .unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::State(StateError::InsufficientCapacity { .. })
        ));
        assert!(cluster.pod("p1").unwrap().is_pending());
        assert!(cluster.node("n1").unwrap().pods_running().is_empty());
    }

    #[test]
    fn test_assign_unknown_ids() {
        let scheduler = Scheduler::new();
        let mut cluster = make_cluster(
            vec![make_node("n1", 4.0, 1000.0)],
            vec![make_pod("p1", 1.0, 100.0)],
        );
        assert_eq!(
            scheduler.assign_pod_to_node(&mut cluster, "ghost", "n1"),
            Err(SchedulerError::PodNotFound("ghost".into()))
        );
        assert_eq!(
            scheduler.assign_pod_to_node(&mut cluster, "p1", "ghost"),
            Err(SchedulerError::NodeNotFound("ghost".into()))
        );
    }

    #[test]
    fn test_assign_running_pod_twice_is_rejected() {
        let scheduler = Scheduler::new();
        let mut cluster = make_cluster(
            vec![make_node("n1", 4.0, 1000.0)],
            vec![make_pod("p1", 1.0, 100.0)],
        );
        scheduler.assign_pod_to_node(&mut cluster, "p1", "n1").unwrap();
        assert!(matches!(
            scheduler.assign_pod_to_node(&mut cluster, "p1", "n1"),
            Err(SchedulerError::PodAlreadyRunning { .. })
        ));
        assert_eq!(cluster.node("n1").unwrap().usage().cpu, 1.0);
    }

    #[test]
    fn test_schedule_all_pending_in_id_order() {
        let scheduler = Scheduler::new();
        // p-a takes the only slot on n1; p-b must land on n2; p-c fits nowhere.
        let mut cluster = make_cluster(
            vec![make_node("n1", 2.0, 1000.0), make_node("n2", 1.0, 1000.0)],
            vec![
                make_pod("p-c", 2.0, 100.0),
                make_pod("p-b", 1.0, 100.0),
                make_pod("p-a", 2.0, 100.0),
            ],
        );

        let summary = scheduler.schedule_all_pending(&mut cluster).unwrap();
        assert_eq!(summary.scheduled_count, 2);
        assert_eq!(summary.unschedulable_count, 1);
        assert_eq!(summary.unschedulable_pods, vec!["p-c".to_string()]);
        assert_eq!(
            summary.assignments,
            vec![
                ("p-a".to_string(), "n1".to_string()),
                ("p-b".to_string(), "n2".to_string()),
            ]
        );
        assert!(cluster.pod("p-c").unwrap().is_pending());
        assert_eq!(cluster.pod("p-c").unwrap().assigned_node(), None);
    }

    #[test]
    fn test_schedule_is_deterministic() {
        let build = || {
            make_cluster(
                vec![
                    make_node("n3", 3.0, 300.0),
                    make_node("n1", 2.0, 200.0),
                    make_node("n2", 1.0, 500.0),
                ],
                (0..8)
                    .map(|i| make_pod(&format!("p{i}"), 0.5 + (i % 3) as f64 * 0.5, 90.0))
                    .collect(),
            )
        };
        let scheduler = Scheduler::new();
        let mut first = build();
        let mut second = build();
        let a = scheduler.schedule_all_pending(&mut first).unwrap();
        let b = scheduler.schedule_all_pending(&mut second).unwrap();
        assert_eq!(a, b);
        assert_eq!(first, second);
    }

    #[test]
    fn test_only_pending_pods_are_considered() {
        let scheduler = Scheduler::new();
        let mut cluster = make_cluster(
            vec![make_node("n1", 4.0, 1000.0)],
            vec![make_pod("p1", 1.0, 100.0), make_pod("p2", 1.0, 100.0)],
        );
        cluster.pod_mut("p2").unwrap().crash();
        let summary = scheduler.schedule_all_pending(&mut cluster).unwrap();
        assert_eq!(summary.scheduled_count, 1);
        assert_eq!(cluster.pod("p2").unwrap().phase(), PodPhase::CrashLoop);
    }

    #[test]
    fn test_summary_serializes() {
        let summary = SchedulingSummary {
            scheduled_count: 1,
            unschedulable_count: 1,
            unschedulable_pods: vec!["p2".into()],
            assignments: vec![("p1".into(), "n1".into())],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["unschedulable_pods"][0], "p2");
        assert_eq!(json["scheduled_count"], 1);
    }
}
