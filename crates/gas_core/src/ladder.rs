//! Threshold ladder resolution and validation.

use crate::error::ConfigError;
use crate::types::{GasId, ThresholdLadder, ThresholdStage};

impl ThresholdLadder {
    /// Rank of the stage a reading activates: the highest rank whose trigger
    /// is `<=` the reading (inclusive bound, so an exact tie activates that
    /// stage). Readings below every non-floor trigger fall to rank 0; the
    /// floor is unconditional even if its own trigger sits above the reading.
    ///
    /// An undefined reading (stalled fan) resolves to the top rank. The
    /// controller must never treat a fan stall as a safe state.
    pub fn resolve(&self, concentration_ppm: Option<f64>) -> usize {
        debug_assert!(!self.stages.is_empty(), "ladders are validated non-empty");
        match concentration_ppm {
            None => self.stages.len() - 1,
            Some(c) => self
                .stages
                .iter()
                .rposition(|stage| c >= stage.trigger_ppm)
                .unwrap_or(0),
        }
    }

    /// Fan power of the stage at `rank`, if the ladder has one.
    pub fn power_at(&self, rank: usize) -> Option<f64> {
        self.stages.get(rank).map(|stage| stage.fan_power_pct)
    }

    pub fn floor(&self) -> &ThresholdStage {
        debug_assert!(!self.stages.is_empty(), "ladders are validated non-empty");
        &self.stages[0]
    }

    pub fn top_rank(&self) -> usize {
        debug_assert!(!self.stages.is_empty(), "ladders are validated non-empty");
        self.stages.len() - 1
    }

    /// Checks the ladder invariants: non-empty, triggers strictly increasing
    /// with rank, powers within [0, 100]. Called before any ladder write is
    /// accepted so an invalid edit never replaces a valid ladder.
    pub fn validate(&self, gas: &GasId) -> Result<(), ConfigError> {
        if self.stages.is_empty() {
            return Err(ConfigError::LadderEmpty { gas: gas.clone() });
        }
        for (rank, stage) in self.stages.iter().enumerate() {
            if !(0.0..=100.0).contains(&stage.fan_power_pct) {
                return Err(ConfigError::PowerOutOfRange {
                    gas: gas.clone(),
                    rank,
                    value_pct: stage.fan_power_pct,
                });
            }
            // A non-finite trigger cannot order against its neighbours.
            if !stage.trigger_ppm.is_finite()
                || (rank > 0 && stage.trigger_ppm <= self.stages[rank - 1].trigger_ppm)
            {
                return Err(ConfigError::LadderNotIncreasing {
                    gas: gas.clone(),
                    rank,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn co2_ladder() -> ThresholdLadder {
        ThresholdLadder {
            stages: vec![
                stage("ECO", 0.0, 20.0),
                stage("STUFE 1", 3000.0, 40.0),
                stage("STUFE 2", 5000.0, 70.0),
                stage("ALARM", 10_000.0, 100.0),
            ],
        }
    }

    fn stage(label: &str, trigger_ppm: f64, fan_power_pct: f64) -> ThresholdStage {
        ThresholdStage {
            label: label.to_string(),
            trigger_ppm,
            fan_power_pct,
        }
    }

    #[test]
    fn resolves_bands_with_inclusive_triggers() {
        let ladder = co2_ladder();
        assert_eq!(ladder.resolve(Some(420.0)), 0);
        assert_eq!(ladder.resolve(Some(2999.9)), 0);
        assert_eq!(ladder.resolve(Some(3000.0)), 1, "a tie activates the stage");
        assert_eq!(ladder.resolve(Some(4999.0)), 1);
        assert_eq!(ladder.resolve(Some(5000.0)), 2);
        assert_eq!(ladder.resolve(Some(10_000.0)), 3);
        assert_eq!(ladder.resolve(Some(50_000.0)), 3);
    }

    #[test]
    fn floor_applies_below_its_own_trigger() {
        let mut ladder = co2_ladder();
        ladder.stages[0].trigger_ppm = 500.0;
        assert_eq!(
            ladder.resolve(Some(100.0)),
            0,
            "floor stage is unconditional even with a nonzero trigger"
        );
    }

    #[test]
    fn undefined_reading_resolves_to_top() {
        assert_eq!(co2_ladder().resolve(None), 3);
    }

    #[test]
    fn resolve_is_monotone_in_concentration() {
        let ladder = co2_ladder();
        let mut prev = 0;
        for c in 0..200 {
            let rank = ladder.resolve(Some(f64::from(c) * 60.0));
            assert!(rank >= prev, "rank must not fall as concentration rises");
            prev = rank;
        }
    }

    #[test]
    fn validate_rejects_non_increasing_triggers() {
        let gas = GasId("co2".to_string());
        let mut ladder = co2_ladder();
        ladder.stages[2].trigger_ppm = 2500.0;
        assert_eq!(
            ladder.validate(&gas),
            Err(ConfigError::LadderNotIncreasing {
                gas: gas.clone(),
                rank: 2
            })
        );

        // Equal triggers are just as invalid as descending ones.
        let mut ladder = co2_ladder();
        ladder.stages[1].trigger_ppm = ladder.stages[0].trigger_ppm;
        assert!(matches!(
            ladder.validate(&gas),
            Err(ConfigError::LadderNotIncreasing { rank: 1, .. })
        ));

        // So is a trigger that cannot be ordered at all.
        let mut ladder = co2_ladder();
        ladder.stages[2].trigger_ppm = f64::NAN;
        assert!(matches!(
            ladder.validate(&gas),
            Err(ConfigError::LadderNotIncreasing { rank: 2, .. })
        ));
    }

    #[test]
    fn validate_rejects_power_outside_percent_range() {
        let gas = GasId("co2".to_string());
        let mut ladder = co2_ladder();
        ladder.stages[3].fan_power_pct = 130.0;
        assert!(matches!(
            ladder.validate(&gas),
            Err(ConfigError::PowerOutOfRange { rank: 3, .. })
        ));
    }

    #[test]
    fn validate_rejects_empty_ladder() {
        let gas = GasId("co2".to_string());
        let ladder = ThresholdLadder { stages: vec![] };
        assert_eq!(ladder.validate(&gas), Err(ConfigError::LadderEmpty { gas }));
    }

    #[test]
    fn validate_accepts_the_reference_ladder() {
        assert_eq!(co2_ladder().validate(&GasId("co2".to_string())), Ok(()));
    }
}
