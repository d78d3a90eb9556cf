//! On-disk round-trip and rejection tests for scenario files.

use gas_core::{ManualOverrideState, ZoneId};
use gas_scenario::{default_scenario, load_scenario, save_scenario, set_override, set_process_day};
use std::io::Write;

fn write_temp_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn saved_scenario_loads_back_identically() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("plant.json");

    let mut scenario = default_scenario();
    set_process_day(&mut scenario, &ZoneId("zone_1".to_string()), 3.5).unwrap();
    set_override(
        &mut scenario,
        &ZoneId("zone_2".to_string()),
        ManualOverrideState {
            active: true,
            stage_rank: 1,
            trim_pct: -5.0,
        },
    )
    .unwrap();

    save_scenario(&path, &scenario).unwrap();
    let loaded = load_scenario(&path).unwrap();

    assert_eq!(loaded, scenario);
}

#[test]
fn load_rejects_malformed_json() {
    let file = write_temp_file("{ this is not json");
    let err = load_scenario(file.path()).unwrap_err();
    assert!(
        err.to_string().contains("parsing scenario file"),
        "unexpected error: {err:#}"
    );
}

#[test]
fn load_rejects_unsupported_format_version() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("plant.json");
    save_scenario(&path, &default_scenario()).unwrap();

    let mut value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    value["format_version"] = serde_json::json!(9);
    std::fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();

    let err = load_scenario(&path).unwrap_err();
    assert!(
        err.to_string().contains("format version"),
        "unexpected error: {err:#}"
    );
}

#[test]
fn load_rejects_a_file_that_fails_validation() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("plant.json");
    save_scenario(&path, &default_scenario()).unwrap();

    // Overload the hall far past its design mass.
    let mut value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    value["scenario"]["zones"][0]["substrate_kg"] = serde_json::json!(1.0e9);
    std::fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();

    let err = load_scenario(&path).unwrap_err();
    assert!(
        format!("{err:#}").contains("substrate mass"),
        "unexpected error: {err:#}"
    );
}
