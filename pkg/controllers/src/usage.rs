use pkg_types::cluster::ClusterState;
use tracing::debug;

/// Grows the simulated usage of every running pod by a fixed factor each
/// tick. Usage stays capped at each pod's limits.
pub struct UsageController {
    growth: f64,
}

impl UsageController {
    pub fn new(growth: f64) -> Self {
        Self { growth }
    }

    /// Returns how many pods were updated.
    pub fn reconcile(&self, cluster: &mut ClusterState) -> usize {
        let mut updated = 0;
        for pod in cluster.pods_mut().filter(|p| p.is_running()) {
            pod.spike_cpu_usage(self.growth);
            pod.spike_mem_usage(self.growth);
            updated += 1;
        }
        debug!("UsageController: grew usage of {} pods by x{}", updated, self.growth);
        updated
    }
}

impl Default for UsageController {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_types::node::Node;
    use pkg_types::pod::{Pod, ResourceRequirements};

    #[test]
    fn test_growth_applies_to_running_pods_only() {
        let mut cluster = ClusterState::new();
        let res = ResourceRequirements::new(4.0, 1000.0);
        cluster.insert_node(Node::new("n1", res, res)).unwrap();
        for id in ["p1", "p2"] {
            cluster
                .insert_pod(Pod::new(
                    id,
                    "web",
                    "default",
                    ResourceRequirements::new(1.0, 100.0),
                    ResourceRequirements::new(1.5, 300.0),
                ))
                .unwrap();
        }
        cluster.pod_mut("p1").unwrap().start_running("n1");

        let controller = UsageController::new(2.0);
        assert_eq!(controller.reconcile(&mut cluster), 1);

        let p1 = cluster.pod("p1").unwrap();
        assert_eq!(p1.usage(), ResourceRequirements::new(1.5, 200.0));
        assert_eq!(cluster.pod("p2").unwrap().usage(), ResourceRequirements::default());
    }
}
