use gas_core::{
    DecisionSource, FanController, GasSpecies, StageVote, Zone, ZoneDecision, TRIM_LIMIT_PCT,
};

/// Staged automatic ventilation:
/// 1. Every gas reading is resolved against its own threshold ladder upstream,
///    arriving here as one stage vote per gas.
/// 2. The most severe vote governs: highest fan power wins, ties break toward
///    the higher stage rank. Gases never average.
/// 3. Without any votes at all, the zone idles at the ladder floor.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutopilotController;

/// Override-aware policy for operator consoles. A zone with an active manual
/// override bypasses the autopilot entirely; every other zone falls through
/// to it. Zones are independent: one can run overridden while the other stays
/// automatic.
#[derive(Debug, Default, Clone, Copy)]
pub struct ControlPanel {
    autopilot: AutopilotController,
}

/// Fan power a manual stage actually drives: `clamp(stage_power + trim, 0, 100)`.
pub fn effective_manual_power(stage_power_pct: f64, trim_pct: f64) -> f64 {
    debug_assert!(
        trim_pct.abs() <= TRIM_LIMIT_PCT,
        "trim is bounded on write, got {trim_pct}"
    );
    (stage_power_pct + trim_pct).clamp(0.0, 100.0)
}

/// Highest configured power for `rank` across every gas ladder in the zone.
///
/// Ladders may differ in length; a rank beyond all of them yields `None`.
/// Where several ladders define the rank, the most severe power stands, the
/// same convention automatic staging uses.
pub fn manual_stage_power(gases: &[GasSpecies], rank: usize) -> Option<f64> {
    gases
        .iter()
        .filter_map(|gas| gas.ladder.power_at(rank))
        .max_by(f64::total_cmp)
}

/// Decision for a zone under manual override. `None` when the override is
/// inactive or names a rank no ladder defines.
pub fn manual_decision(zone: &Zone, gases: &[GasSpecies]) -> Option<ZoneDecision> {
    let state = &zone.override_state;
    if !state.active {
        return None;
    }
    let stage_power = manual_stage_power(gases, state.stage_rank)?;
    Some(ZoneDecision {
        stage_rank: state.stage_rank,
        fan_power_pct: effective_manual_power(stage_power, state.trim_pct),
        source: DecisionSource::Manual,
    })
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Most severe vote: highest fan power, ties broken toward the higher rank.
fn most_severe(votes: &[StageVote]) -> Option<&StageVote> {
    votes.iter().max_by(|a, b| {
        a.fan_power_pct
            .total_cmp(&b.fan_power_pct)
            .then(a.rank.cmp(&b.rank))
    })
}

/// Floor posture before any reading exists: every ladder sits at rank 0 and
/// the most severe floor power governs.
fn floor_power(gases: &[GasSpecies]) -> f64 {
    gases
        .iter()
        .filter_map(|gas| gas.ladder.power_at(0))
        .max_by(f64::total_cmp)
        .unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Controllers
// ---------------------------------------------------------------------------

impl FanController for AutopilotController {
    fn select(&mut self, _zone: &Zone, gases: &[GasSpecies], votes: &[StageVote]) -> ZoneDecision {
        match most_severe(votes) {
            Some(vote) => ZoneDecision {
                stage_rank: vote.rank,
                fan_power_pct: vote.fan_power_pct,
                source: DecisionSource::Autopilot,
            },
            None => ZoneDecision {
                stage_rank: 0,
                fan_power_pct: floor_power(gases),
                source: DecisionSource::Autopilot,
            },
        }
    }
}

impl FanController for ControlPanel {
    fn select(&mut self, zone: &Zone, gases: &[GasSpecies], votes: &[StageVote]) -> ZoneDecision {
        if zone.override_state.active {
            if let Some(decision) = manual_decision(zone, gases) {
                return decision;
            }
            // A validated override always names a rank some ladder defines.
            // Unvalidated state falls back to automatic control rather than
            // guessing a power.
        }
        self.autopilot.select(zone, gases, votes)
    }
}
