use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use escalation_core::{ActionCatalog, EscalationConfig, ResourceSnapshot, VitalsSnapshot};
use parking_lot::{Mutex, RwLock};

use crate::agent::{Assessment, EscalationAgent};

/// Thread-safe map of patient sessions.
///
/// A cycle holds its patient's lock for its whole duration, so cycles on the
/// same patient run one at a time while different patients run in parallel.
pub struct SessionRegistry {
    config: EscalationConfig,
    catalog: ActionCatalog,
    sessions: RwLock<HashMap<String, Arc<Mutex<EscalationAgent>>>>,
}

impl SessionRegistry {
    pub fn new(config: EscalationConfig, catalog: ActionCatalog) -> Self {
        Self {
            config,
            catalog,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Session for `patient_id`, created on first use.
    pub fn session(&self, patient_id: &str) -> Arc<Mutex<EscalationAgent>> {
        if let Some(agent) = self.sessions.read().get(patient_id) {
            return Arc::clone(agent);
        }

        let mut sessions = self.sessions.write();
        let agent = sessions.entry(patient_id.to_string()).or_insert_with(|| {
            log::info!("opening session for {patient_id}");
            Arc::new(Mutex::new(EscalationAgent::with_catalog(
                patient_id,
                self.config.clone(),
                self.catalog.clone(),
            )))
        });
        Arc::clone(agent)
    }

    pub fn assess(
        &self,
        patient_id: &str,
        vitals: VitalsSnapshot,
        resources: ResourceSnapshot,
        now: DateTime<Utc>,
    ) -> Assessment {
        let session = self.session(patient_id);
        let mut agent = session.lock();
        agent.assess(vitals, resources, now)
    }

    /// Discard a patient's belief state. Returns whether a session existed.
    pub fn end_session(&self, patient_id: &str) -> bool {
        let removed = self.sessions.write().remove(patient_id).is_some();
        if removed {
            log::info!("closed session for {patient_id}");
        }
        removed
    }

    pub fn contains(&self, patient_id: &str) -> bool {
        self.sessions.read().contains_key(patient_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(EscalationConfig::default(), ActionCatalog::standard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::thread;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 31, 8, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    #[test]
    fn sessions_are_isolated_per_patient() {
        let registry = SessionRegistry::default();
        registry.assess("P001", VitalsSnapshot::baseline(at(0)), ResourceSnapshot::default(), at(0));
        registry.assess("P001", VitalsSnapshot::baseline(at(30)), ResourceSnapshot::default(), at(30));
        registry.assess("P002", VitalsSnapshot::baseline(at(0)), ResourceSnapshot::default(), at(0));

        let history = |id: &str| {
            let session = registry.session(id);
            let len = session.lock().belief().map(|b| b.history().len());
            len
        };
        assert_eq!(history("P001"), Some(1));
        assert_eq!(history("P002"), Some(0));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn concurrent_cycles_on_one_patient_lose_no_history() {
        let registry = Arc::new(SessionRegistry::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let vitals = VitalsSnapshot::baseline(at(i + 1));
                    registry.assess("P001", vitals, ResourceSnapshot::default(), at(i + 1));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let session = registry.session("P001");
        let agent = session.lock();
        // eight snapshots with distinct timestamps: seven archived, one current
        assert_eq!(agent.belief().map(|b| b.history().len()), Some(7));
    }

    #[test]
    fn ending_a_session_discards_state() {
        let registry = SessionRegistry::default();
        registry.assess("P001", VitalsSnapshot::baseline(at(0)), ResourceSnapshot::default(), at(0));
        assert!(registry.end_session("P001"));
        assert!(!registry.contains("P001"));
        assert!(!registry.end_session("P001"));
        assert!(registry.session("P001").lock().belief().is_none());
    }
}
