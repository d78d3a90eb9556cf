//! `gas_core` — deterministic concentration and staging engine.
//!
//! No IO, no clocks, no randomness. A scenario goes in; a full, recomputable
//! report comes out.

mod balance;
mod emission;
mod error;
pub mod kpi;
mod ladder;
pub mod report;
mod run;
mod types;

pub use balance::{air_changes_per_hour, airflow_m3_h, concentration_ppm};
pub use emission::{beyond_model_support, emission_rate, CYCLE_DAYS, HOURS_PER_DAY};
pub use error::ConfigError;
pub use run::{
    decision_ach, simulate, DecisionSource, FanController, GasSeries, PeakAnnotation, RunReport,
    SimulationSample, StageVote, ZoneDecision, ZoneMeta,
};
pub use types::*;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

#[cfg(test)]
mod tests;
