//! Centralized constants for the k3rs simulator.
//!
//! All project-wide constant values live here.
//! Change a value in one place and it applies everywhere.

pub mod chaos;
pub mod paths;
pub mod scheduling;
