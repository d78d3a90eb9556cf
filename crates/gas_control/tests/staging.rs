//! Staging regression tests.
//!
//! Full-axis runs over the reference plant with the production controllers,
//! verifying where each zone's staging settles across the rearing cycle and
//! that manual overrides pin the fan end to end. These catch regressions in
//! ladder tuning, the severity vote, and the lagged control loop.

use gas_control::{AutopilotController, ControlPanel};
use gas_core::test_fixtures::{base_scenario, make_rng};
use gas_core::{
    simulate, FanController, GasId, GasSeries, ManualOverrideState, RunReport, StageVote, ZoneId,
};
use gas_scenario::{default_scenario, set_ladder, set_override};
use rand::Rng;

fn zone_1() -> ZoneId {
    ZoneId("zone_1".to_string())
}

fn zone_2() -> ZoneId {
    ZoneId("zone_2".to_string())
}

fn co2() -> GasId {
    GasId("co2".to_string())
}

/// Reference plant under the production panel (no override active).
fn reference_run() -> RunReport {
    let mut panel = ControlPanel::default();
    simulate(&default_scenario(), &mut panel)
}

/// Any gas track of a zone carries the zone-governing fan values.
fn zone_track<'a>(report: &'a RunReport, zone: &ZoneId) -> &'a GasSeries {
    report
        .series_for(zone, &co2())
        .expect("reference plant always has a CO2 track")
}

#[test]
fn every_zone_starts_at_the_ladder_floor() {
    let report = reference_run();
    for zone in [zone_1(), zone_2()] {
        let first = &zone_track(&report, &zone).samples[0];
        assert_eq!(first.stage_rank, 0, "{zone}: run must begin at the floor");
        assert!((first.fan_power_pct - 20.0).abs() < f64::EPSILON);
    }
}

#[test]
fn first_floor_reading_of_a_stocked_plant_trips_the_alarm() {
    // At 20% airflow and full stocking, NH3 reads far above its ALARM
    // trigger in both zones, so the second sample already runs flat out.
    let report = reference_run();
    for zone in [zone_1(), zone_2()] {
        let second = &zone_track(&report, &zone).samples[1];
        assert_eq!(second.stage_rank, 3, "{zone}: lagged alarm response");
        assert!((second.fan_power_pct - 100.0).abs() < f64::EPSILON);
    }
}

#[test]
fn default_run_keeps_every_reading_defined() {
    let report = reference_run();
    assert_eq!(report.series.len(), 4);
    for series in &report.series {
        assert_eq!(series.samples.len(), report.sample_count);
        assert_eq!(series.undefined_samples, 0, "no stage parks the fan");
        assert_eq!(series.flagged_samples, 0, "96 h axis stays inside the cycle");
    }
}

#[test]
fn hall_settles_at_stage_two_for_the_second_half() {
    // Once NH3 stays above its STUFE 2 trigger even at 70% airflow, the
    // hall stops cycling between stages and holds 70% to harvest.
    let report = reference_run();
    for sample in &zone_track(&report, &zone_1()).samples {
        if sample.time_hours >= 48.0 {
            assert_eq!(
                sample.stage_rank, 2,
                "hall should hold STUFE 2 at t={}",
                sample.time_hours
            );
            assert!((sample.fan_power_pct - 70.0).abs() < f64::EPSILON);
        }
    }
}

#[test]
fn cabinet_pins_at_full_power_once_ammonia_takes_off() {
    let report = reference_run();
    let track = zone_track(&report, &zone_2());
    for sample in &track.samples {
        if sample.time_hours >= 60.0 {
            assert_eq!(
                sample.stage_rank, 3,
                "cabinet should stay in ALARM at t={}",
                sample.time_hours
            );
            assert!((sample.fan_power_pct - 100.0).abs() < f64::EPSILON);
        }
    }
}

#[test]
fn hall_co2_peak_lands_on_the_cycle_midpoint() {
    let report = reference_run();
    let track = zone_track(&report, &zone_1());
    let peak = track.peak.as_ref().expect("all samples defined");

    // The hall holds 70% through the back half, so the highest reading sits
    // at the end of the 96 h axis, which is the day-4 emission peak.
    assert!((peak.time_hours - 96.0).abs() < 1e-9);
    assert_eq!(peak.sample_index, track.samples.len() - 1);
    assert!(
        peak.concentration_ppm > 3550.0 && peak.concentration_ppm < 3650.0,
        "got {}",
        peak.concentration_ppm
    );
    assert!((peak.emission_rate_g_kg_h - 0.375).abs() < 1e-3);
}

#[test]
fn override_pins_one_zone_without_touching_the_other() {
    let mut scenario = default_scenario();
    set_override(
        &mut scenario,
        &zone_1(),
        ManualOverrideState {
            active: true,
            stage_rank: 0,
            trim_pct: 10.0,
        },
    )
    .unwrap();

    let mut panel = ControlPanel::default();
    let report = simulate(&scenario, &mut panel);

    for sample in &zone_track(&report, &zone_1()).samples {
        assert_eq!(sample.stage_rank, 0);
        assert!(
            (sample.fan_power_pct - 30.0).abs() < f64::EPSILON,
            "ECO 20% plus 10pp trim, regardless of readings"
        );
    }
    let cabinet_end = zone_track(&report, &zone_2()).samples.last().unwrap();
    assert_eq!(cabinet_end.stage_rank, 3, "autopilot zone is unaffected");
}

#[test]
fn trim_clamps_only_at_the_rails() {
    let mut high = default_scenario();
    set_override(
        &mut high,
        &zone_1(),
        ManualOverrideState {
            active: true,
            stage_rank: 3,
            trim_pct: 15.0,
        },
    )
    .unwrap();
    let report = simulate(&high, &mut ControlPanel::default());
    for sample in &zone_track(&report, &zone_1()).samples {
        assert!((sample.fan_power_pct - 100.0).abs() < f64::EPSILON);
    }

    let mut low = default_scenario();
    set_override(
        &mut low,
        &zone_1(),
        ManualOverrideState {
            active: true,
            stage_rank: 0,
            trim_pct: -15.0,
        },
    )
    .unwrap();
    let report = simulate(&low, &mut ControlPanel::default());
    for series in &report.series {
        assert_eq!(series.undefined_samples, 0, "5% airflow still ventilates");
    }
    for sample in &zone_track(&report, &zone_1()).samples {
        assert!((sample.fan_power_pct - 5.0).abs() < f64::EPSILON);
    }
}

#[test]
fn ladder_edit_then_revert_reproduces_the_series() {
    let reference = reference_run();

    let mut scenario = default_scenario();
    let original = scenario.gases[0].ladder.clone();
    let mut tightened = original.clone();
    tightened.stages[1].trigger_ppm = 1500.0;
    set_ladder(&mut scenario, &co2(), tightened).unwrap();
    set_ladder(&mut scenario, &co2(), original).unwrap();

    let replayed = simulate(&scenario, &mut ControlPanel::default());
    for (before, after) in reference.series.iter().zip(&replayed.series) {
        assert_eq!(before.zone, after.zone);
        assert_eq!(before.gas, after.gas);
        for (a, b) in before.samples.iter().zip(&after.samples) {
            assert_eq!(a.stage_rank, b.stage_rank);
            assert!((a.fan_power_pct - b.fan_power_pct).abs() < 1e-12);
            match (a.concentration_ppm, b.concentration_ppm) {
                (Some(x), Some(y)) => assert!((x - y).abs() < 1e-9),
                (None, None) => {}
                _ => panic!("defined-ness must survive the revert"),
            }
        }
    }
}

#[test]
fn autopilot_matches_a_linear_scan_over_random_votes() {
    let scenario = base_scenario();
    let zone = &scenario.zones[0];
    let mut rng = make_rng(21);

    for _ in 0..200 {
        let votes: Vec<StageVote> = (0..rng.gen_range(1..6))
            .map(|i| StageVote {
                gas: GasId(format!("gas_{i}")),
                rank: rng.gen_range(0..4),
                fan_power_pct: f64::from(rng.gen_range(0_u32..21)) * 5.0,
            })
            .collect();

        let picked = AutopilotController.select(zone, &scenario.gases, &votes);

        let max_power = votes.iter().map(|v| v.fan_power_pct).fold(0.0, f64::max);
        assert!(
            (picked.fan_power_pct - max_power).abs() < f64::EPSILON,
            "controller must never pick below the most severe vote"
        );
        let best_rank = votes
            .iter()
            .filter(|v| (v.fan_power_pct - max_power).abs() < f64::EPSILON)
            .map(|v| v.rank)
            .max()
            .unwrap();
        assert_eq!(picked.stage_rank, best_rank);
    }
}
