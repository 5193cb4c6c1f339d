use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use pkg_constants::scheduling::DEFAULT_METRIC_WINDOW_SIZE;

use crate::error::{EntityKind, Result, StateError};

/// Horizontal autoscaler state for one workload.
///
/// Keeps a bounded FIFO of recent CPU utilization samples and turns their
/// mean into a replica count with a single proportional step:
/// `floor(current * average / target)`, clamped into `[min, max]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HorizontalPodAutoscaler {
    pub id: String,
    /// Target workload ID to scale
    pub workload_id: String,
    /// Desired average CPU utilization (percentage, e.g. 80 = 80%)
    pub target_utilization_percent: f64,
    pub min_replicas: u32,
    pub max_replicas: u32,
    #[serde(default = "default_window_size")]
    window_size: usize,
    #[serde(default)]
    metric_window: VecDeque<f64>,
}

fn default_window_size() -> usize {
    DEFAULT_METRIC_WINDOW_SIZE
}

impl HorizontalPodAutoscaler {
    pub fn new(
        id: impl Into<String>,
        workload_id: impl Into<String>,
        target_utilization_percent: f64,
        min_replicas: u32,
        max_replicas: u32,
    ) -> Self {
        Self {
            id: id.into(),
            workload_id: workload_id.into(),
            target_utilization_percent,
            min_replicas,
            max_replicas,
            window_size: DEFAULT_METRIC_WINDOW_SIZE,
            metric_window: VecDeque::with_capacity(DEFAULT_METRIC_WINDOW_SIZE),
        }
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        while self.metric_window.len() > window_size {
            self.metric_window.pop_front();
        }
        self
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.metric_window.iter().copied()
    }

    /// Push a sample, evicting the oldest once the window is full.
    pub fn record_utilization(&mut self, percent: f64) {
        self.metric_window.push_back(percent);
        while self.metric_window.len() > self.window_size {
            self.metric_window.pop_front();
        }
    }

    /// Mean of the window, 0.0 when empty.
    pub fn average_utilization(&self) -> f64 {
        if self.metric_window.is_empty() {
            return 0.0;
        }
        self.metric_window.iter().sum::<f64>() / self.metric_window.len() as f64
    }

    /// Replica count for the next step, bounded by `max` then `min`.
    ///
    /// A cold window or a zero target leaves `current` as is (still bounded).
    /// With inverted bounds the result is `min`.
    pub fn compute_desired_replicas(&self, current: i64) -> u32 {
        let average = self.average_utilization();
        let desired = if average == 0.0 || self.target_utilization_percent == 0.0 {
            current
        } else {
            (current as f64 * average / self.target_utilization_percent).floor() as i64
        };
        desired
            .min(i64::from(self.max_replicas))
            .max(i64::from(self.min_replicas)) as u32
    }

    /// Check construction-time constraints.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| StateError::InvalidSpec {
            kind: EntityKind::Hpa,
            id: self.id.clone(),
            reason,
        };
        if self.min_replicas > self.max_replicas {
            return Err(invalid(format!(
                "min_replicas {} exceeds max_replicas {}",
                self.min_replicas, self.max_replicas
            )));
        }
        if !(0.0..=100.0).contains(&self.target_utilization_percent) {
            return Err(invalid(format!(
                "target utilization {} outside 0-100",
                self.target_utilization_percent
            )));
        }
        if self.window_size == 0 {
            return Err(invalid("metric window size must be at least 1".into()));
        }
        Ok(())
    }
}
