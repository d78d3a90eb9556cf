//! Type definitions for `gas_core`.
//!
//! All public configuration and state types used by the concentration engine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(GasId);
string_id!(ZoneId);

// ---------------------------------------------------------------------------
// Gas configuration
// ---------------------------------------------------------------------------

/// Emission model variant plus its editable rate parameter.
///
/// A gas is fully described by data: curve, density, ambient level, ladder.
/// Nothing in the engine branches on gas identity, so adding a species is a
/// pure configuration change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EmissionCurve {
    /// Single lobe over the rearing cycle; peaks at mid-cycle (day 4) at
    /// `3.0 * avg_rate`.
    SineLobe { avg_rate_g_kg_h: f64 },
    /// Linear ramp for the first half of the cycle, exponential growth in the
    /// second half. The two limbs do not meet at the switch point.
    RampExp { base_rate_g_kg_h: f64 },
    /// Flat emission. Placeholder model for provisionally configured gases.
    Constant { rate_g_kg_h: f64 },
}

impl EmissionCurve {
    /// The model's one editable rate parameter, g/kg/h.
    pub fn rate_param(&self) -> f64 {
        match self {
            Self::SineLobe { avg_rate_g_kg_h } => *avg_rate_g_kg_h,
            Self::RampExp { base_rate_g_kg_h } => *base_rate_g_kg_h,
            Self::Constant { rate_g_kg_h } => *rate_g_kg_h,
        }
    }

    /// Replaces the editable rate parameter, keeping the model shape.
    pub fn set_rate_param(&mut self, rate_g_kg_h: f64) {
        match self {
            Self::SineLobe { avg_rate_g_kg_h } => *avg_rate_g_kg_h = rate_g_kg_h,
            Self::RampExp { base_rate_g_kg_h } => *base_rate_g_kg_h = rate_g_kg_h,
            Self::Constant { rate_g_kg_h: rate } => *rate = rate_g_kg_h,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasSpecies {
    pub id: GasId,
    pub name: String,
    /// Background concentration of the supply air.
    pub ambient_ppm: f64,
    pub density_kg_m3: f64,
    pub curve: EmissionCurve,
    pub ladder: ThresholdLadder,
}

// ---------------------------------------------------------------------------
// Threshold ladder
// ---------------------------------------------------------------------------

/// One fan-power tier. Stage rank is the index within the ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdStage {
    pub label: String,
    /// Inclusive lower bound: a reading exactly on the trigger activates this
    /// stage. The floor stage (rank 0) applies regardless of its trigger.
    pub trigger_ppm: f64,
    pub fan_power_pct: f64,
}

/// Ordered stages for one gas. Invariant (checked by validation, assumed by
/// everything else): non-empty, triggers strictly increasing with rank, all
/// powers within [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdLadder {
    pub stages: Vec<ThresholdStage>,
}

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub volume_m3: f64,
    pub max_substrate_kg: f64,
    /// Airflow delivered at 100% fan power.
    pub max_airflow_m3_h: f64,
    pub substrate_kg: f64,
    /// Elapsed process time of the current batch, in days from stocking.
    /// Bounded to the nominal cycle on write; days past it arise only from
    /// long axes or explicit query days and get flagged, not rejected.
    pub process_day: f64,
    #[serde(default)]
    pub override_state: ManualOverrideState,
}

/// Operator override for one zone. Stays in effect until explicitly
/// disabled; there is no automatic reversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualOverrideState {
    pub active: bool,
    pub stage_rank: usize,
    /// Fine adjustment in percentage points on top of the selected stage's
    /// fan power. Bounded to [-15, 15] on write.
    pub trim_pct: f64,
}

impl Default for ManualOverrideState {
    fn default() -> Self {
        Self {
            active: false,
            stage_rank: 0,
            trim_pct: 0.0,
        }
    }
}

/// Widest trim the override accepts, in percentage points.
pub const TRIM_LIMIT_PCT: f64 = 15.0;

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// Discretized time axis: `0..=horizon` at `step` increments. Uniform by
/// construction; a step that does not divide the horizon evenly drops the
/// final partial point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub horizon_hours: f64,
    pub step_hours: f64,
}

impl Default for AxisSpec {
    fn default() -> Self {
        Self {
            horizon_hours: 96.0,
            step_hours: 0.5,
        }
    }
}

impl AxisSpec {
    /// Number of sample points, including both endpoints.
    pub fn sample_count(&self) -> usize {
        let steps = (self.horizon_hours / self.step_hours + 1e-9).floor();
        steps as usize + 1
    }

    /// Time of sample `index` in hours.
    pub fn time_at(&self, index: usize) -> f64 {
        index as f64 * self.step_hours
    }
}

/// The full configuration a run evaluates: every gas applies to every zone,
/// so a scenario yields `zones.len() * gases.len()` series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub zones: Vec<Zone>,
    pub gases: Vec<GasSpecies>,
    #[serde(default)]
    pub axis: AxisSpec,
}

impl Scenario {
    pub fn zone(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == *id)
    }

    pub fn zone_mut(&mut self, id: &ZoneId) -> Option<&mut Zone> {
        self.zones.iter_mut().find(|z| z.id == *id)
    }

    pub fn gas(&self, id: &GasId) -> Option<&GasSpecies> {
        self.gases.iter().find(|g| g.id == *id)
    }

    pub fn gas_mut(&mut self, id: &GasId) -> Option<&mut GasSpecies> {
        self.gases.iter_mut().find(|g| g.id == *id)
    }
}
