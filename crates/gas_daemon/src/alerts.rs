//! Plant-condition alerts derived from a session's scenario and its latest
//! report. Evaluation is stateless: every rule looks at the current data and
//! either holds or it does not, so the endpoint always reflects the present
//! revision.

use gas_core::{RunReport, Scenario};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertSeverity {
    Warning,
    Critical,
}

type RuleFn = fn(&RunReport, &Scenario) -> bool;

struct AlertRule {
    id: &'static str,
    severity: AlertSeverity,
    check: RuleFn,
    message: &'static str,
    suggested_action: &'static str,
}

const RULES: &[AlertRule] = &[
    AlertRule {
        id: "ALARM_STAGE_ACTIVE",
        severity: AlertSeverity::Critical,
        check: |report, scenario| {
            let top = scenario
                .gases
                .iter()
                .map(|gas| gas.ladder.stages.len())
                .max()
                .unwrap_or(0);
            top > 0
                && report
                    .series
                    .iter()
                    .any(|series| series.samples.iter().any(|s| s.stage_rank + 1 >= top))
        },
        message: "A zone reached its top ventilation stage during the run",
        suggested_action: "Lower the stocking mass or raise the fan capacity",
    },
    AlertRule {
        id: "UNDEFINED_READINGS",
        severity: AlertSeverity::Warning,
        check: |report, _| report.series.iter().any(|s| s.undefined_samples > 0),
        message: "Some readings are undefined because the fan was fully stopped",
        suggested_action: "Give the ladder floor a fan power above 0%",
    },
    AlertRule {
        id: "BEYOND_MODEL_SUPPORT",
        severity: AlertSeverity::Warning,
        check: |report, _| report.series.iter().any(|s| s.flagged_samples > 0),
        message: "Part of the axis lies past the fitted rearing cycle",
        suggested_action: "Shorten the horizon or treat late samples as extrapolation",
    },
    AlertRule {
        id: "MASS_NEAR_CAPACITY",
        severity: AlertSeverity::Warning,
        check: |_, scenario| {
            scenario
                .zones
                .iter()
                .any(|zone| zone.substrate_kg > 0.95 * zone.max_substrate_kg)
        },
        message: "A zone is loaded above 95% of its substrate capacity",
        suggested_action: "Plan a partial harvest or split the batch across zones",
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct ActiveAlert {
    pub id: &'static str,
    pub severity: AlertSeverity,
    pub message: &'static str,
    pub suggested_action: &'static str,
}

/// Every rule that holds for this scenario and report, in table order.
pub fn evaluate(report: &RunReport, scenario: &Scenario) -> Vec<ActiveAlert> {
    RULES
        .iter()
        .filter(|rule| (rule.check)(report, scenario))
        .map(|rule| ActiveAlert {
            id: rule.id,
            severity: rule.severity,
            message: rule.message,
            suggested_action: rule.suggested_action,
        })
        .collect()
}
