//! Single-instant zone snapshot for dashboard KPIs.
//!
//! A snapshot answers "what does the panel show right now, at process day D"
//! without sweeping the whole axis. The stage/airflow circularity is resolved
//! here by a short fixed-point loop instead of the run's lagged evaluation:
//! starting from floor votes, re-select and re-solve until the governing
//! rank repeats, bounded by the deepest configured ladder. If the selection
//! oscillates the latest decision stands.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::balance::{air_changes_per_hour, airflow_m3_h, concentration_ppm};
use crate::emission::{beyond_model_support, emission_rate, CYCLE_DAYS, HOURS_PER_DAY};
use crate::run::{FanController, StageVote, ZoneDecision};
use crate::types::{GasId, GasSpecies, Zone, ZoneId};

/// Bump when the snapshot shape changes; consumers pin against it.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasReadout {
    pub gas: GasId,
    pub name: String,
    pub emission_rate_g_kg_h: f64,
    pub concentration_ppm: Option<f64>,
    /// Estimated concentration directly above the substrate surface.
    pub micro_climate_ppm: Option<f64>,
    pub stage_rank: usize,
    /// Gas mass leaving the substrate, kg/h.
    pub production_kg_h: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    pub zone: ZoneId,
    pub name: String,
    pub process_day: f64,
    pub governing: ZoneDecision,
    pub airflow_m3_h: f64,
    pub air_changes_per_hour: f64,
    /// Surface-over-room multiplier, 1.4 at stocking to 2.4 at cycle end.
    pub micro_climate_factor: f64,
    pub beyond_model_support: bool,
    pub readings: Vec<GasReadout>,
}

/// Evaluate one zone at `at_day` (defaults to the zone's own process day).
pub fn zone_snapshot(
    zone: &Zone,
    gases: &[GasSpecies],
    at_day: Option<f64>,
    controller: &mut dyn FanController,
) -> ZoneSnapshot {
    let day = at_day.unwrap_or(zone.process_day);
    let hours = day * HOURS_PER_DAY;

    let mut votes: SmallVec<[StageVote; 4]> = gases
        .iter()
        .map(|gas| StageVote {
            gas: gas.id.clone(),
            rank: 0,
            fan_power_pct: gas.ladder.floor().fan_power_pct,
        })
        .collect();
    let mut decision = controller.select(zone, gases, &votes);

    let rounds = gases
        .iter()
        .map(|gas| gas.ladder.stages.len())
        .max()
        .unwrap_or(1);
    for _ in 0..rounds {
        let airflow = airflow_m3_h(zone, decision.fan_power_pct);
        for (vote, gas) in votes.iter_mut().zip(gases) {
            let rate = emission_rate(&gas.curve, hours);
            let reading = concentration_ppm(
                gas.ambient_ppm,
                rate,
                zone.substrate_kg,
                gas.density_kg_m3,
                airflow,
            );
            let rank = gas.ladder.resolve(reading);
            vote.rank = rank;
            vote.fan_power_pct = gas.ladder.power_at(rank).unwrap_or(0.0);
        }
        let next = controller.select(zone, gases, &votes);
        let stable = next.stage_rank == decision.stage_rank && next.source == decision.source;
        decision = next;
        if stable {
            break;
        }
    }

    let airflow = airflow_m3_h(zone, decision.fan_power_pct);
    let factor = micro_climate_factor(day);
    let readings = gases
        .iter()
        .map(|gas| {
            let rate = emission_rate(&gas.curve, hours);
            let reading = concentration_ppm(
                gas.ambient_ppm,
                rate,
                zone.substrate_kg,
                gas.density_kg_m3,
                airflow,
            );
            GasReadout {
                gas: gas.id.clone(),
                name: gas.name.clone(),
                emission_rate_g_kg_h: rate,
                concentration_ppm: reading,
                micro_climate_ppm: reading.map(|c| c * factor),
                stage_rank: gas.ladder.resolve(reading),
                production_kg_h: rate * zone.substrate_kg / 1000.0,
            }
        })
        .collect();

    ZoneSnapshot {
        zone: zone.id.clone(),
        name: zone.name.clone(),
        process_day: day,
        airflow_m3_h: airflow,
        air_changes_per_hour: air_changes_per_hour(zone, airflow),
        micro_climate_factor: factor,
        beyond_model_support: beyond_model_support(hours),
        governing: decision,
        readings,
    }
}

/// Concentration multiplier directly above the substrate relative to the
/// room average: `1.4 + day/8`, clamped to the cycle.
pub fn micro_climate_factor(day: f64) -> f64 {
    1.4 + day.clamp(0.0, CYCLE_DAYS) / CYCLE_DAYS
}
