use pkg_types::cluster::ClusterState;
use serde::Serialize;
use tracing::{info, warn};

/// One HPA evaluation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScalingDecision {
    pub hpa_id: String,
    pub workload_id: String,
    /// Mean utilization of running pods this tick, if any were running
    pub observed_utilization: Option<f64>,
    /// Mean of the HPA window after recording
    pub average_utilization: f64,
    pub current_replicas: u32,
    pub desired_replicas: u32,
}

impl ScalingDecision {
    pub fn scaled(&self) -> bool {
        self.current_replicas != self.desired_replicas
    }
}

/// Horizontal Pod Autoscaler controller.
/// Samples CPU utilization of each target workload's running pods and
/// scales the workload's desired replicas.
#[derive(Debug, Default)]
pub struct HPAController;

impl HPAController {
    pub fn new() -> Self {
        Self
    }

    /// One pass over every HPA, by id ascending.
    pub fn reconcile(&self, cluster: &mut ClusterState) -> anyhow::Result<Vec<ScalingDecision>> {
        let mut decisions = Vec::new();

        for hpa_id in cluster.hpa_ids() {
            let Some(workload_id) = cluster.hpa(&hpa_id).map(|h| h.workload_id.clone()) else {
                continue;
            };

            // Find the target workload
            let current_replicas = match cluster.workload(&workload_id) {
                Some(w) => w.desired_replicas(),
                None => {
                    warn!("HPA {}: target workload {} not found", hpa_id, workload_id);
                    continue;
                }
            };

            // Pods with no CPU request have no utilization and are skipped
            let samples: Vec<f64> = cluster
                .pods_of_workload(&workload_id)
                .filter(|p| p.is_running())
                .filter_map(|p| p.cpu_utilization_percent())
                .collect();
            let observed_utilization = if samples.is_empty() {
                None
            } else {
                Some(samples.iter().sum::<f64>() / samples.len() as f64)
            };

            let Some(hpa) = cluster.hpa_mut(&hpa_id) else {
                continue;
            };
            if let Some(util) = observed_utilization {
                hpa.record_utilization(util);
            }
            let average_utilization = hpa.average_utilization();
            let desired_replicas = hpa.compute_desired_replicas(i64::from(current_replicas));

            if desired_replicas != current_replicas {
                if let Some(workload) = cluster.workload_mut(&workload_id) {
                    workload.scale_to(i64::from(desired_replicas))?;
                }
                info!(
                    "HPA {}: scaled workload {} from {} to {} replicas (avg util {:.1}%)",
                    hpa_id, workload_id, current_replicas, desired_replicas, average_utilization
                );
            }

            decisions.push(ScalingDecision {
                hpa_id,
                workload_id,
                observed_utilization,
                average_utilization,
                current_replicas,
                desired_replicas,
            });
        }

        Ok(decisions)
    }
}
