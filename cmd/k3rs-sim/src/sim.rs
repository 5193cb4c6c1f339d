use pkg_chaos::{ChaosManager, EventOutcome};
use pkg_controllers::hpa::{HPAController, ScalingDecision};
use pkg_controllers::usage::UsageController;
use pkg_scheduler::{Scheduler, SchedulingSummary};
use pkg_types::cluster::ClusterState;
use serde::Serialize;
use tracing::info;

/// Everything that happened in one tick, in phase order.
#[derive(Debug, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub chaos: Vec<EventOutcome>,
    pub usage_updated: usize,
    pub scaling: Vec<ScalingDecision>,
    pub scheduling: SchedulingSummary,
}

/// Runs the phases of each tick strictly in order:
/// chaos → usage → autoscaling → scheduling.
pub struct Simulation {
    cluster: ClusterState,
    chaos: ChaosManager,
    usage: UsageController,
    hpa: HPAController,
    scheduler: Scheduler,
}

impl Simulation {
    pub fn new(cluster: ClusterState, chaos: ChaosManager, usage: UsageController) -> Self {
        Self {
            cluster,
            chaos,
            usage,
            hpa: HPAController::new(),
            scheduler: Scheduler::new(),
        }
    }

    pub fn cluster(&self) -> &ClusterState {
        &self.cluster
    }

    pub fn run_tick(&mut self, tick: u64) -> anyhow::Result<TickReport> {
        let chaos = self.chaos.execute_events_for_tick(&mut self.cluster, tick);
        let usage_updated = self.usage.reconcile(&mut self.cluster);
        let scaling = self.hpa.reconcile(&mut self.cluster)?;
        let scheduling = self.scheduler.schedule_all_pending(&mut self.cluster)?;

        info!(
            "tick {}: {} chaos events, {} scheduled, {} unschedulable",
            tick,
            chaos.len(),
            scheduling.scheduled_count,
            scheduling.unschedulable_count
        );

        Ok(TickReport {
            tick,
            chaos,
            usage_updated,
            scaling,
            scheduling,
        })
    }
}
