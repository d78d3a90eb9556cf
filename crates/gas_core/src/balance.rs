//! Steady-state mass balance — emission diluted by forced-air exchange.
//!
//! The zone is treated as well mixed (lumped). No spatial gradient, no
//! inter-gas chemistry.

use crate::types::Zone;

/// Steady-state concentration of one gas in one zone.
///
/// Formula: the substrate emits `rate * mass / 1000` kg/h of gas; dividing by
/// the gas density turns that into a volume flow, and its ratio to the
/// diluting airflow (times 1e6) is the concentration rise over ambient:
/// `c = ambient + (rate * mass / 1000 / density) / airflow * 1e6`
///
/// Returns `None` when `airflow <= 0`: a stalled fan makes the steady state
/// undefined, and that must surface as an explicit undefined reading rather
/// than an Inf that looks like data. Callers degrade the one sample and keep
/// the run going.
pub fn concentration_ppm(
    ambient_ppm: f64,
    rate_g_kg_h: f64,
    substrate_kg: f64,
    density_kg_m3: f64,
    airflow_m3_h: f64,
) -> Option<f64> {
    debug_assert!(density_kg_m3 > 0.0, "density must be validated positive");
    if airflow_m3_h <= 0.0 {
        return None;
    }
    let mass_flow_kg_h = rate_g_kg_h * substrate_kg / 1000.0;
    let volume_flow_m3_h = mass_flow_kg_h / density_kg_m3;
    Some(ambient_ppm + volume_flow_m3_h / airflow_m3_h * 1e6)
}

/// Airflow a zone delivers at the given fan power. Linear in power, with no
/// artificial minimum: 0% really is a stopped fan.
pub fn airflow_m3_h(zone: &Zone, fan_power_pct: f64) -> f64 {
    fan_power_pct / 100.0 * zone.max_airflow_m3_h
}

/// Air changes per hour at the given airflow.
pub fn air_changes_per_hour(zone: &Zone, airflow_m3_h: f64) -> f64 {
    debug_assert!(zone.volume_m3 > 0.0, "volume must be validated positive");
    airflow_m3_h / zone.volume_m3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ManualOverrideState, ZoneId};

    fn test_zone() -> Zone {
        Zone {
            id: ZoneId("zone_test".to_string()),
            name: "Test Hall".to_string(),
            volume_m3: 791.35,
            max_substrate_kg: 51_858.0,
            max_airflow_m3_h: 4748.1,
            substrate_kg: 51_858.0,
            process_day: 4.0,
            override_state: ManualOverrideState::default(),
        }
    }

    #[test]
    fn reference_point_matches_hand_calculation() {
        // 51 858 kg at 0.375 g/kg/h is 19.447 kg/h of CO2; over density
        // 1.842 kg/m3 that is 10.557 m3/h into 1899.2 m3/h of air.
        let c = concentration_ppm(420.0, 0.375, 51_858.0, 1.842, 1899.2)
            .expect("positive airflow yields a defined reading");
        let expected = 420.0 + (0.375 * 51_858.0 / 1000.0 / 1.842) / 1899.2 * 1e6;
        assert!((c - expected).abs() < 1e-9);
        assert!(
            c > 5900.0 && c < 6050.0,
            "reference scenario should land near 5979 ppm, got {c}"
        );
    }

    #[test]
    fn zero_airflow_is_undefined_not_infinite() {
        assert_eq!(concentration_ppm(420.0, 0.375, 51_858.0, 1.842, 0.0), None);
        assert_eq!(concentration_ppm(420.0, 0.375, 51_858.0, 1.842, -5.0), None);
    }

    #[test]
    fn no_substrate_reads_ambient() {
        let c = concentration_ppm(420.0, 0.375, 0.0, 1.842, 1000.0).unwrap();
        assert!((c - 420.0).abs() < f64::EPSILON, "empty zone stays at ambient");
    }

    #[test]
    fn monotone_in_rate_mass_and_airflow() {
        let base = concentration_ppm(420.0, 0.2, 10_000.0, 1.842, 2000.0).unwrap();
        let more_rate = concentration_ppm(420.0, 0.3, 10_000.0, 1.842, 2000.0).unwrap();
        let more_mass = concentration_ppm(420.0, 0.2, 20_000.0, 1.842, 2000.0).unwrap();
        let more_air = concentration_ppm(420.0, 0.2, 10_000.0, 1.842, 4000.0).unwrap();
        assert!(more_rate > base, "higher rate must raise concentration");
        assert!(more_mass > base, "more substrate must raise concentration");
        assert!(more_air < base, "more airflow must dilute");
    }

    #[test]
    fn fan_power_maps_linearly_to_airflow() {
        let zone = test_zone();
        assert!((airflow_m3_h(&zone, 0.0) - 0.0).abs() < f64::EPSILON);
        assert!((airflow_m3_h(&zone, 40.0) - 1899.24).abs() < 1e-9);
        assert!((airflow_m3_h(&zone, 100.0) - 4748.1).abs() < 1e-9);
    }

    #[test]
    fn ach_is_airflow_over_volume() {
        let zone = test_zone();
        let ach = air_changes_per_hour(&zone, airflow_m3_h(&zone, 100.0));
        assert!((ach - 6.0).abs() < 1e-3, "full power is sized for 6 ACH");
    }
}
