//! Configuration rejection reasons.
//!
//! Every validated write surfaces one of these and leaves the prior
//! configuration untouched. A zero-airflow solve is not an error value; it
//! degrades the affected sample to an undefined concentration instead.

use crate::types::{GasId, ZoneId};

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    MassOutOfRange {
        zone: ZoneId,
        value_kg: f64,
        max_kg: f64,
    },
    VolumeNotPositive {
        zone: ZoneId,
        value_m3: f64,
    },
    CapacityNotPositive {
        zone: ZoneId,
        value_m3_h: f64,
    },
    DayOutOfRange {
        zone: ZoneId,
        value: f64,
    },
    AmbientNegative {
        gas: GasId,
        value_ppm: f64,
    },
    DensityNotPositive {
        gas: GasId,
        value_kg_m3: f64,
    },
    RateNegative {
        gas: GasId,
        value_g_kg_h: f64,
    },
    LadderEmpty {
        gas: GasId,
    },
    LadderNotIncreasing {
        gas: GasId,
        rank: usize,
    },
    PowerOutOfRange {
        gas: GasId,
        rank: usize,
        value_pct: f64,
    },
    TrimOutOfRange {
        zone: ZoneId,
        value_pct: f64,
    },
    StageRankUnknown {
        zone: ZoneId,
        rank: usize,
    },
    AxisInvalid {
        horizon_hours: f64,
        step_hours: f64,
    },
    ZoneUnknown {
        zone: ZoneId,
    },
    GasUnknown {
        gas: GasId,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MassOutOfRange {
                zone,
                value_kg,
                max_kg,
            } => write!(
                f,
                "zone {zone}: substrate mass {value_kg} kg outside [0, {max_kg}]"
            ),
            Self::VolumeNotPositive { zone, value_m3 } => {
                write!(f, "zone {zone}: volume {value_m3} m3 must be positive")
            }
            Self::CapacityNotPositive { zone, value_m3_h } => write!(
                f,
                "zone {zone}: airflow capacity {value_m3_h} m3/h must be positive"
            ),
            Self::DayOutOfRange { zone, value } => {
                write!(f, "zone {zone}: process day {value} outside [0, 8]")
            }
            Self::AmbientNegative { gas, value_ppm } => {
                write!(f, "gas {gas}: ambient {value_ppm} ppm must not be negative")
            }
            Self::DensityNotPositive { gas, value_kg_m3 } => {
                write!(f, "gas {gas}: density {value_kg_m3} kg/m3 must be positive")
            }
            Self::RateNegative { gas, value_g_kg_h } => write!(
                f,
                "gas {gas}: emission rate {value_g_kg_h} g/kg/h must not be negative"
            ),
            Self::LadderEmpty { gas } => {
                write!(f, "gas {gas}: threshold ladder has no stages")
            }
            Self::LadderNotIncreasing { gas, rank } => write!(
                f,
                "gas {gas}: trigger at stage {rank} does not exceed the stage below"
            ),
            Self::PowerOutOfRange {
                gas,
                rank,
                value_pct,
            } => write!(
                f,
                "gas {gas}: stage {rank} fan power {value_pct}% outside [0, 100]"
            ),
            Self::TrimOutOfRange { zone, value_pct } => write!(
                f,
                "zone {zone}: trim {value_pct} pp outside [-{limit}, {limit}]",
                limit = crate::types::TRIM_LIMIT_PCT
            ),
            Self::StageRankUnknown { zone, rank } => {
                write!(f, "zone {zone}: no configured ladder has a stage {rank}")
            }
            Self::AxisInvalid {
                horizon_hours,
                step_hours,
            } => write!(
                f,
                "axis horizon {horizon_hours} h / step {step_hours} h is not a usable grid"
            ),
            Self::ZoneUnknown { zone } => write!(f, "zone {zone} is not configured"),
            Self::GasUnknown { gas } => write!(f, "gas {gas} is not configured"),
        }
    }
}

impl std::error::Error for ConfigError {}
