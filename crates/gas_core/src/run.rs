//! Full-axis simulation run.
//!
//! Order of operations per time point, per zone:
//! 1. The controller turns the previous point's per-gas stage votes into one
//!    governing decision (lagged evaluation; the first point sees floor
//!    votes, so an autopilot run starts at the floor stage).
//! 2. The decision's fan power fixes the airflow for this point.
//! 3. Every gas gets its emission rate and steady-state concentration at
//!    this airflow; each reading becomes this point's vote for the next one.
//!
//! The lag breaks the circular dependency between stage selection (needs a
//! concentration) and the concentration solve (needs the stage's airflow)
//! without any in-step iteration, so a run always terminates and two runs
//! over the same scenario produce identical series.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::balance::{air_changes_per_hour, airflow_m3_h, concentration_ppm};
use crate::emission::{beyond_model_support, emission_rate, HOURS_PER_DAY};
use crate::types::{GasId, GasSpecies, Scenario, Zone, ZoneId};

// ---------------------------------------------------------------------------
// Controller seam
// ---------------------------------------------------------------------------

/// One gas's resolved stage at the previous point.
#[derive(Debug, Clone)]
pub struct StageVote {
    pub gas: GasId,
    pub rank: usize,
    pub fan_power_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionSource {
    Autopilot,
    Manual,
}

/// The governing call for one zone at one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDecision {
    pub stage_rank: usize,
    pub fan_power_pct: f64,
    pub source: DecisionSource,
}

/// Turns per-gas stage votes into the zone's governing decision. The run
/// drives this once per zone per point; implementations live in
/// `gas_control`.
pub trait FanController {
    fn select(&mut self, zone: &Zone, gases: &[GasSpecies], votes: &[StageVote]) -> ZoneDecision;
}

// ---------------------------------------------------------------------------
// Run output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSample {
    pub time_hours: f64,
    pub process_day: f64,
    pub emission_rate_g_kg_h: f64,
    /// `None` marks the undefined reading from a zero-airflow solve.
    pub concentration_ppm: Option<f64>,
    /// Zone-governing values, repeated on every gas track of the zone so a
    /// series renders standalone.
    pub fan_power_pct: f64,
    pub stage_rank: usize,
    /// Set when the time point lies past the emission model's fitted cycle.
    pub beyond_model_support: bool,
}

/// Highest defined concentration of a series: the value, where it happened,
/// and the emission rate at that instant. First instant wins a tie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeakAnnotation {
    pub concentration_ppm: f64,
    pub time_hours: f64,
    pub sample_index: usize,
    pub emission_rate_g_kg_h: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasSeries {
    pub zone: ZoneId,
    pub gas: GasId,
    pub samples: Vec<SimulationSample>,
    /// Absent only when every sample in the series is undefined.
    pub peak: Option<PeakAnnotation>,
    pub undefined_samples: usize,
    pub flagged_samples: usize,
}

/// Zone facts the chart/report layer needs alongside the series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneMeta {
    pub id: ZoneId,
    pub name: String,
    pub volume_m3: f64,
    pub max_airflow_m3_h: f64,
    pub substrate_kg: f64,
    pub process_day: f64,
    pub override_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub zones: Vec<ZoneMeta>,
    pub series: Vec<GasSeries>,
    pub sample_count: usize,
}

impl RunReport {
    pub fn series_for(&self, zone: &ZoneId, gas: &GasId) -> Option<&GasSeries> {
        self.series
            .iter()
            .find(|s| s.zone == *zone && s.gas == *gas)
    }
}

// ---------------------------------------------------------------------------
// Run driver
// ---------------------------------------------------------------------------

/// Evaluates the whole scenario. Pure: same scenario and controller state in,
/// identical report out; callers rerun it on every accepted edit instead of
/// patching series.
pub fn simulate(scenario: &Scenario, controller: &mut dyn FanController) -> RunReport {
    let sample_count = scenario.axis.sample_count();
    let mut report = RunReport {
        zones: scenario.zones.iter().map(zone_meta).collect(),
        series: Vec::with_capacity(scenario.zones.len() * scenario.gases.len()),
        sample_count,
    };

    for zone in &scenario.zones {
        let mut tracks: Vec<Vec<SimulationSample>> = scenario
            .gases
            .iter()
            .map(|_| Vec::with_capacity(sample_count))
            .collect();

        let mut votes: SmallVec<[StageVote; 4]> =
            scenario.gases.iter().map(floor_vote).collect();

        for index in 0..sample_count {
            let t = scenario.axis.time_at(index);
            let decision = controller.select(zone, &scenario.gases, &votes);
            let airflow = airflow_m3_h(zone, decision.fan_power_pct);
            let flagged = beyond_model_support(t);

            for (gi, gas) in scenario.gases.iter().enumerate() {
                let rate = emission_rate(&gas.curve, t);
                let reading = concentration_ppm(
                    gas.ambient_ppm,
                    rate,
                    zone.substrate_kg,
                    gas.density_kg_m3,
                    airflow,
                );
                tracks[gi].push(SimulationSample {
                    time_hours: t,
                    process_day: t / HOURS_PER_DAY,
                    emission_rate_g_kg_h: rate,
                    concentration_ppm: reading,
                    fan_power_pct: decision.fan_power_pct,
                    stage_rank: decision.stage_rank,
                    beyond_model_support: flagged,
                });
                let rank = gas.ladder.resolve(reading);
                votes[gi] = StageVote {
                    gas: gas.id.clone(),
                    rank,
                    fan_power_pct: gas.ladder.power_at(rank).unwrap_or(0.0),
                };
            }
        }

        for (gi, gas) in scenario.gases.iter().enumerate() {
            report
                .series
                .push(finish_series(zone, gas, std::mem::take(&mut tracks[gi])));
        }
    }

    report
}

fn zone_meta(zone: &Zone) -> ZoneMeta {
    ZoneMeta {
        id: zone.id.clone(),
        name: zone.name.clone(),
        volume_m3: zone.volume_m3,
        max_airflow_m3_h: zone.max_airflow_m3_h,
        substrate_kg: zone.substrate_kg,
        process_day: zone.process_day,
        override_active: zone.override_state.active,
    }
}

fn floor_vote(gas: &GasSpecies) -> StageVote {
    StageVote {
        gas: gas.id.clone(),
        rank: 0,
        fan_power_pct: gas.ladder.floor().fan_power_pct,
    }
}

fn finish_series(zone: &Zone, gas: &GasSpecies, samples: Vec<SimulationSample>) -> GasSeries {
    let mut peak: Option<PeakAnnotation> = None;
    let mut undefined = 0;
    let mut flagged = 0;

    for (index, sample) in samples.iter().enumerate() {
        if sample.beyond_model_support {
            flagged += 1;
        }
        match sample.concentration_ppm {
            None => undefined += 1,
            Some(c) => {
                let higher = peak
                    .as_ref()
                    .is_none_or(|p| c > p.concentration_ppm);
                if higher {
                    peak = Some(PeakAnnotation {
                        concentration_ppm: c,
                        time_hours: sample.time_hours,
                        sample_index: index,
                        emission_rate_g_kg_h: sample.emission_rate_g_kg_h,
                    });
                }
            }
        }
    }

    GasSeries {
        zone: zone.id.clone(),
        gas: gas.id.clone(),
        samples,
        peak,
        undefined_samples: undefined,
        flagged_samples: flagged,
    }
}

/// ACH implied by a decision in a zone. Convenience for report surfaces.
pub fn decision_ach(zone: &Zone, decision: &ZoneDecision) -> f64 {
    air_changes_per_hour(zone, airflow_m3_h(zone, decision.fan_power_pct))
}
