use super::*;
use crate::test_fixtures::{base_scenario, co2, ladder, nh3};


// --- Shared test helpers ------------------------------------------------

/// Picks the most severe vote: highest fan power, higher rank on a tie.
/// Stand-in for the real autopilot, which lives downstream.
struct SeverityController;

impl FanController for SeverityController {
    fn select(&mut self, _zone: &Zone, _gases: &[GasSpecies], votes: &[StageVote]) -> ZoneDecision {
        let best = votes.iter().max_by(|a, b| {
            a.fan_power_pct
                .total_cmp(&b.fan_power_pct)
                .then(a.rank.cmp(&b.rank))
        });
        match best {
            Some(vote) => ZoneDecision {
                stage_rank: vote.rank,
                fan_power_pct: vote.fan_power_pct,
                source: DecisionSource::Autopilot,
            },
            None => ZoneDecision {
                stage_rank: 0,
                fan_power_pct: 0.0,
                source: DecisionSource::Autopilot,
            },
        }
    }
}

/// Ignores votes entirely and always answers the same power.
struct FixedPower(f64);

impl FanController for FixedPower {
    fn select(
        &mut self,
        _zone: &Zone,
        _gases: &[GasSpecies],
        _votes: &[StageVote],
    ) -> ZoneDecision {
        ZoneDecision {
            stage_rank: 0,
            fan_power_pct: self.0,
            source: DecisionSource::Manual,
        }
    }
}

/// One-zone scenario around a constant-emission gas, for cases where the
/// concentration must be a known closed-form number per power step.
fn constant_gas_scenario(rate_g_kg_h: f64, stages: &[(&str, f64, f64)]) -> Scenario {
    let mut scenario = base_scenario();
    scenario.zones.truncate(1);
    scenario.zones[0].substrate_kg = 1000.0;
    scenario.gases = vec![GasSpecies {
        id: GasId("test_gas".to_string()),
        name: "Test Gas".to_string(),
        ambient_ppm: 0.0,
        density_kg_m3: 1.0,
        curve: EmissionCurve::Constant { rate_g_kg_h },
        ladder: ladder(stages),
    }];
    scenario
}
