use std::collections::HashMap;
use std::sync::Arc;

use gas_control::ControlPanel;
use gas_core::{simulate, RunReport, Scenario};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

/// One configured plant under edit, with the report for its latest revision.
pub struct Session {
    pub scenario: Scenario,
    /// Bumped on every accepted edit; the report cache keys on it.
    pub revision: u64,
    report: Option<(u64, Arc<RunReport>)>,
    pub revision_tx: broadcast::Sender<u64>,
}

impl Session {
    pub fn new(scenario: Scenario) -> Self {
        let (revision_tx, _) = broadcast::channel(16);
        Self {
            scenario,
            revision: 0,
            report: None,
            revision_tx,
        }
    }

    /// Accepted-edit bookkeeping: bump the revision and wake the streams.
    pub fn mark_edited(&mut self) {
        self.revision += 1;
        let _ = self.revision_tx.send(self.revision);
    }

    /// Report for the current revision, recomputed only when stale.
    pub fn current_report(&mut self) -> Arc<RunReport> {
        if let Some((revision, report)) = &self.report {
            if *revision == self.revision {
                return Arc::clone(report);
            }
        }
        let mut panel = ControlPanel::default();
        let report = Arc::new(simulate(&self.scenario, &mut panel));
        tracing::debug!(revision = self.revision, "recomputed series");
        self.report = Some((self.revision, Arc::clone(&report)));
        report
    }
}

pub type SharedSessions = Arc<Mutex<HashMap<Uuid, Session>>>;

#[derive(Clone)]
pub struct AppState {
    pub sessions: SharedSessions,
    /// Scenario new sessions start from.
    pub template: Arc<Scenario>,
}

impl AppState {
    pub fn new(template: Scenario) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            template: Arc::new(template),
        }
    }
}
