//! Shared test fixtures for `gas_core` and downstream crates.
//!
//! `base_scenario()` provides a compact two-zone, two-gas scenario with round
//! numbers and the production ladder shapes, sized so hand calculations stay
//! readable. The reference-plant numbers live in `gas_scenario`; exact-value
//! regressions construct their own inputs.

use crate::types::{
    AxisSpec, EmissionCurve, GasId, GasSpecies, ManualOverrideState, Scenario, ThresholdLadder,
    ThresholdStage, Zone, ZoneId,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Two zones (100 m3 hall at 6 ACH, 40 m3 cabinet), CO2 + NH3 with the
/// production threshold shapes, 96 h axis at 1 h steps.
pub fn base_scenario() -> Scenario {
    Scenario {
        zones: vec![
            Zone {
                id: ZoneId("zone_1".to_string()),
                name: "Hall".to_string(),
                volume_m3: 100.0,
                max_substrate_kg: 10_000.0,
                max_airflow_m3_h: 600.0,
                substrate_kg: 5000.0,
                process_day: 2.0,
                override_state: ManualOverrideState::default(),
            },
            Zone {
                id: ZoneId("zone_2".to_string()),
                name: "Cabinet".to_string(),
                volume_m3: 40.0,
                max_substrate_kg: 1000.0,
                max_airflow_m3_h: 240.0,
                substrate_kg: 200.0,
                process_day: 2.0,
                override_state: ManualOverrideState::default(),
            },
        ],
        gases: vec![co2(), nh3()],
        axis: AxisSpec {
            horizon_hours: 96.0,
            step_hours: 1.0,
        },
    }
}

pub fn co2() -> GasSpecies {
    GasSpecies {
        id: GasId("co2".to_string()),
        name: "CO2".to_string(),
        ambient_ppm: 420.0,
        density_kg_m3: 1.842,
        curve: EmissionCurve::SineLobe {
            avg_rate_g_kg_h: 0.125,
        },
        ladder: ladder(&[
            ("ECO", 0.0, 20.0),
            ("STUFE 1", 3000.0, 40.0),
            ("STUFE 2", 5000.0, 70.0),
            ("ALARM", 10_000.0, 100.0),
        ]),
    }
}

pub fn nh3() -> GasSpecies {
    GasSpecies {
        id: GasId("nh3".to_string()),
        name: "NH3".to_string(),
        ambient_ppm: 0.02,
        density_kg_m3: 0.769,
        curve: EmissionCurve::RampExp {
            base_rate_g_kg_h: 0.001,
        },
        ladder: ladder(&[
            ("ECO", 0.0, 20.0),
            ("STUFE 1", 12.0, 40.0),
            ("STUFE 2", 25.0, 70.0),
            ("ALARM", 50.0, 100.0),
        ]),
    }
}

pub fn ladder(stages: &[(&str, f64, f64)]) -> ThresholdLadder {
    ThresholdLadder {
        stages: stages
            .iter()
            .map(|(label, trigger_ppm, fan_power_pct)| ThresholdStage {
                label: (*label).to_string(),
                trigger_ppm: *trigger_ppm,
                fan_power_pct: *fan_power_pct,
            })
            .collect(),
    }
}

/// Seeded RNG for property sweeps; same seed, same sweep.
pub fn make_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}
