//! Scenario configuration shared between gas_cli and gas_daemon.
//!
//! The reference plant ships as [`default_scenario`]. Every operator-editable
//! field goes through a bounds-checked `set_*` operation that rejects the
//! write with a [`ConfigError`] and leaves the prior configuration untouched.

use anyhow::{bail, Context, Result};
use gas_core::{
    AxisSpec, ConfigError, EmissionCurve, GasId, GasSpecies, ManualOverrideState, Scenario,
    ThresholdLadder, ThresholdStage, Zone, ZoneId, CYCLE_DAYS, TRIM_LIMIT_PCT,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SCENARIO_FORMAT_VERSION: u32 = 1;

/// On-disk wrapper around [`Scenario`]: a format version for compatibility
/// checks plus the save stamp.
#[derive(Serialize, Deserialize)]
struct ScenarioFile {
    format_version: u32,
    #[serde(default)]
    saved_at: Option<String>,
    scenario: Scenario,
}

// ---------------------------------------------------------------------------
// Reference plant
// ---------------------------------------------------------------------------

/// The reference plant: a rearing hall and a climate cabinet, both ventilated
/// at 6 ACH at full fan power and stocked to capacity, with CO2 and NH3 on
/// the production threshold ladders.
pub fn default_scenario() -> Scenario {
    // Room schedule: hall 21.359 x 9.75 x 3.8 m, cabinet 3.8 x 2.9 x 3.8 m.
    let hall_volume = 21.359 * 9.75 * 3.8;
    let cabinet_volume = 3.8 * 2.9 * 3.8;
    Scenario {
        zones: vec![
            Zone {
                id: ZoneId("zone_1".to_string()),
                name: "Rearing hall".to_string(),
                volume_m3: hall_volume,
                max_substrate_kg: 51_858.0,
                max_airflow_m3_h: 6.0 * hall_volume,
                substrate_kg: 51_858.0,
                process_day: 0.0,
                override_state: ManualOverrideState::default(),
            },
            Zone {
                id: ZoneId("zone_2".to_string()),
                name: "Climate cabinet".to_string(),
                volume_m3: cabinet_volume,
                max_substrate_kg: 7560.0,
                max_airflow_m3_h: 6.0 * cabinet_volume,
                substrate_kg: 7560.0,
                process_day: 0.0,
                override_state: ManualOverrideState::default(),
            },
        ],
        gases: vec![
            GasSpecies {
                id: GasId("co2".to_string()),
                name: "CO2".to_string(),
                ambient_ppm: 420.0,
                density_kg_m3: 1.842,
                curve: EmissionCurve::SineLobe {
                    avg_rate_g_kg_h: 0.125,
                },
                ladder: ThresholdLadder {
                    stages: vec![
                        stage("ECO", 0.0, 20.0),
                        stage("STUFE 1", 3000.0, 40.0),
                        stage("STUFE 2", 5000.0, 70.0),
                        stage("ALARM", 10_000.0, 100.0),
                    ],
                },
            },
            GasSpecies {
                id: GasId("nh3".to_string()),
                name: "NH3".to_string(),
                ambient_ppm: 0.02,
                density_kg_m3: 0.769,
                curve: EmissionCurve::RampExp {
                    base_rate_g_kg_h: 0.001,
                },
                ladder: ThresholdLadder {
                    stages: vec![
                        stage("ECO", 0.0, 20.0),
                        stage("STUFE 1", 12.0, 40.0),
                        stage("STUFE 2", 25.0, 70.0),
                        stage("ALARM", 50.0, 100.0),
                    ],
                },
            },
        ],
        axis: AxisSpec::default(),
    }
}

fn stage(label: &str, trigger_ppm: f64, fan_power_pct: f64) -> ThresholdStage {
    ThresholdStage {
        label: label.to_string(),
        trigger_ppm,
        fan_power_pct,
    }
}

// ---------------------------------------------------------------------------
// File IO
// ---------------------------------------------------------------------------

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario file: {}", path.display()))?;
    let file: ScenarioFile = serde_json::from_str(&text)
        .with_context(|| format!("parsing scenario file: {}", path.display()))?;
    if file.format_version != SCENARIO_FORMAT_VERSION {
        bail!(
            "scenario file {} has format version {} (supported: {SCENARIO_FORMAT_VERSION})",
            path.display(),
            file.format_version,
        );
    }
    validate(&file.scenario)
        .with_context(|| format!("validating scenario file: {}", path.display()))?;
    Ok(file.scenario)
}

pub fn save_scenario(path: &Path, scenario: &Scenario) -> Result<()> {
    let file = ScenarioFile {
        format_version: SCENARIO_FORMAT_VERSION,
        saved_at: Some(chrono::Utc::now().to_rfc3339()),
        scenario: scenario.clone(),
    };
    let text = serde_json::to_string_pretty(&file).context("serializing scenario")?;
    std::fs::write(path, text)
        .with_context(|| format!("writing scenario file: {}", path.display()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Checks every configuration bound. A scenario that passes here can be
/// simulated without further input checks.
pub fn validate(scenario: &Scenario) -> Result<(), ConfigError> {
    for zone in &scenario.zones {
        validate_zone(zone)?;
        validate_override(&zone.id, &zone.override_state, &scenario.gases)?;
    }
    for gas in &scenario.gases {
        validate_gas(gas)?;
    }
    validate_axis(scenario.axis)
}

fn validate_zone(zone: &Zone) -> Result<(), ConfigError> {
    if !zone.volume_m3.is_finite() || zone.volume_m3 <= 0.0 {
        return Err(ConfigError::VolumeNotPositive {
            zone: zone.id.clone(),
            value_m3: zone.volume_m3,
        });
    }
    if !zone.max_airflow_m3_h.is_finite() || zone.max_airflow_m3_h <= 0.0 {
        return Err(ConfigError::CapacityNotPositive {
            zone: zone.id.clone(),
            value_m3_h: zone.max_airflow_m3_h,
        });
    }
    if !zone.substrate_kg.is_finite()
        || zone.substrate_kg < 0.0
        || zone.substrate_kg > zone.max_substrate_kg
    {
        return Err(ConfigError::MassOutOfRange {
            zone: zone.id.clone(),
            value_kg: zone.substrate_kg,
            max_kg: zone.max_substrate_kg,
        });
    }
    if !zone.process_day.is_finite() || zone.process_day < 0.0 || zone.process_day > CYCLE_DAYS {
        return Err(ConfigError::DayOutOfRange {
            zone: zone.id.clone(),
            value: zone.process_day,
        });
    }
    Ok(())
}

fn validate_override(
    zone_id: &ZoneId,
    state: &ManualOverrideState,
    gases: &[GasSpecies],
) -> Result<(), ConfigError> {
    if !state.trim_pct.is_finite() || state.trim_pct.abs() > TRIM_LIMIT_PCT {
        return Err(ConfigError::TrimOutOfRange {
            zone: zone_id.clone(),
            value_pct: state.trim_pct,
        });
    }
    // The rank only matters while the override is driving the fan.
    if state.active
        && !gases
            .iter()
            .any(|gas| state.stage_rank < gas.ladder.stages.len())
    {
        return Err(ConfigError::StageRankUnknown {
            zone: zone_id.clone(),
            rank: state.stage_rank,
        });
    }
    Ok(())
}

fn validate_gas(gas: &GasSpecies) -> Result<(), ConfigError> {
    if !gas.ambient_ppm.is_finite() || gas.ambient_ppm < 0.0 {
        return Err(ConfigError::AmbientNegative {
            gas: gas.id.clone(),
            value_ppm: gas.ambient_ppm,
        });
    }
    if !gas.density_kg_m3.is_finite() || gas.density_kg_m3 <= 0.0 {
        return Err(ConfigError::DensityNotPositive {
            gas: gas.id.clone(),
            value_kg_m3: gas.density_kg_m3,
        });
    }
    let rate = gas.curve.rate_param();
    if !rate.is_finite() || rate < 0.0 {
        return Err(ConfigError::RateNegative {
            gas: gas.id.clone(),
            value_g_kg_h: rate,
        });
    }
    gas.ladder.validate(&gas.id)
}

fn validate_axis(axis: AxisSpec) -> Result<(), ConfigError> {
    let usable = axis.horizon_hours.is_finite()
        && axis.step_hours.is_finite()
        && axis.horizon_hours > 0.0
        && axis.step_hours > 0.0
        && axis.step_hours <= axis.horizon_hours;
    if usable {
        Ok(())
    } else {
        Err(ConfigError::AxisInvalid {
            horizon_hours: axis.horizon_hours,
            step_hours: axis.step_hours,
        })
    }
}

// ---------------------------------------------------------------------------
// Edit operations
// ---------------------------------------------------------------------------

pub fn set_substrate_mass(
    scenario: &mut Scenario,
    zone_id: &ZoneId,
    mass_kg: f64,
) -> Result<(), ConfigError> {
    let zone = zone_mut(scenario, zone_id)?;
    if !mass_kg.is_finite() || mass_kg < 0.0 || mass_kg > zone.max_substrate_kg {
        return Err(ConfigError::MassOutOfRange {
            zone: zone_id.clone(),
            value_kg: mass_kg,
            max_kg: zone.max_substrate_kg,
        });
    }
    zone.substrate_kg = mass_kg;
    Ok(())
}

pub fn set_process_day(
    scenario: &mut Scenario,
    zone_id: &ZoneId,
    day: f64,
) -> Result<(), ConfigError> {
    let zone = zone_mut(scenario, zone_id)?;
    if !day.is_finite() || day < 0.0 || day > CYCLE_DAYS {
        return Err(ConfigError::DayOutOfRange {
            zone: zone_id.clone(),
            value: day,
        });
    }
    zone.process_day = day;
    Ok(())
}

pub fn set_airflow_capacity(
    scenario: &mut Scenario,
    zone_id: &ZoneId,
    capacity_m3_h: f64,
) -> Result<(), ConfigError> {
    let zone = zone_mut(scenario, zone_id)?;
    if !capacity_m3_h.is_finite() || capacity_m3_h <= 0.0 {
        return Err(ConfigError::CapacityNotPositive {
            zone: zone_id.clone(),
            value_m3_h: capacity_m3_h,
        });
    }
    zone.max_airflow_m3_h = capacity_m3_h;
    Ok(())
}

pub fn set_gas_rate(
    scenario: &mut Scenario,
    gas_id: &GasId,
    rate_g_kg_h: f64,
) -> Result<(), ConfigError> {
    let gas = gas_mut(scenario, gas_id)?;
    if !rate_g_kg_h.is_finite() || rate_g_kg_h < 0.0 {
        return Err(ConfigError::RateNegative {
            gas: gas_id.clone(),
            value_g_kg_h: rate_g_kg_h,
        });
    }
    gas.curve.set_rate_param(rate_g_kg_h);
    Ok(())
}

pub fn set_gas_ambient(
    scenario: &mut Scenario,
    gas_id: &GasId,
    ambient_ppm: f64,
) -> Result<(), ConfigError> {
    let gas = gas_mut(scenario, gas_id)?;
    if !ambient_ppm.is_finite() || ambient_ppm < 0.0 {
        return Err(ConfigError::AmbientNegative {
            gas: gas_id.clone(),
            value_ppm: ambient_ppm,
        });
    }
    gas.ambient_ppm = ambient_ppm;
    Ok(())
}

pub fn set_ladder(
    scenario: &mut Scenario,
    gas_id: &GasId,
    ladder: ThresholdLadder,
) -> Result<(), ConfigError> {
    ladder.validate(gas_id)?;
    let gas = gas_mut(scenario, gas_id)?;
    gas.ladder = ladder;
    Ok(())
}

pub fn set_override(
    scenario: &mut Scenario,
    zone_id: &ZoneId,
    state: ManualOverrideState,
) -> Result<(), ConfigError> {
    validate_override(zone_id, &state, &scenario.gases)?;
    let zone = zone_mut(scenario, zone_id)?;
    zone.override_state = state;
    Ok(())
}

pub fn set_axis(scenario: &mut Scenario, axis: AxisSpec) -> Result<(), ConfigError> {
    validate_axis(axis)?;
    scenario.axis = axis;
    Ok(())
}

fn zone_mut<'a>(scenario: &'a mut Scenario, id: &ZoneId) -> Result<&'a mut Zone, ConfigError> {
    scenario
        .zone_mut(id)
        .ok_or_else(|| ConfigError::ZoneUnknown { zone: id.clone() })
}

fn gas_mut<'a>(scenario: &'a mut Scenario, id: &GasId) -> Result<&'a mut GasSpecies, ConfigError> {
    scenario
        .gas_mut(id)
        .ok_or_else(|| ConfigError::GasUnknown { gas: id.clone() })
}
