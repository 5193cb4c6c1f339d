//! Per-tick controllers run between the chaos and scheduling phases.

pub mod hpa;
pub mod usage;
