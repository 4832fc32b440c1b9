use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ResourceSnapshot, VitalsSnapshot};

/// What the pipeline currently believes about one patient.
///
/// Owned by a single orchestrator for the lifetime of a monitoring session.
/// History only grows; snapshots are never edited once archived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BeliefState {
    patient_id: String,
    current: VitalsSnapshot,
    history: Vec<VitalsSnapshot>,
    active_interventions: BTreeSet<String>,
    note_signals: BTreeMap<String, String>,
    resources: ResourceSnapshot,
    last_updated_at: DateTime<Utc>,
}

impl BeliefState {
    pub fn new(patient_id: impl Into<String>, vitals: VitalsSnapshot) -> Self {
        Self::new_at(patient_id, vitals, Utc::now())
    }

    /// Start a session with an explicit update time.
    pub fn new_at(patient_id: impl Into<String>, vitals: VitalsSnapshot, at: DateTime<Utc>) -> Self {
        Self {
            patient_id: patient_id.into(),
            current: vitals,
            history: Vec::new(),
            active_interventions: BTreeSet::new(),
            note_signals: BTreeMap::new(),
            resources: ResourceSnapshot::default(),
            last_updated_at: at,
        }
    }

    pub fn update_vitals(&mut self, snapshot: VitalsSnapshot) {
        self.update_vitals_at(snapshot, Utc::now());
    }

    /// Replace the current snapshot, archiving the previous one unless both
    /// carry the same timestamp (a re-assessment of the same instant).
    pub fn update_vitals_at(&mut self, snapshot: VitalsSnapshot, at: DateTime<Utc>) {
        let previous = std::mem::replace(&mut self.current, snapshot);
        if previous.recorded_at != self.current.recorded_at {
            self.history.push(previous);
        }
        self.last_updated_at = at;
    }

    pub fn update_resources(&mut self, resources: ResourceSnapshot) {
        self.resources = resources;
    }

    pub fn start_intervention(&mut self, label: impl Into<String>) {
        self.active_interventions.insert(label.into());
    }

    /// Returns whether the intervention was active.
    pub fn stop_intervention(&mut self, label: &str) -> bool {
        self.active_interventions.remove(label)
    }

    pub fn record_note_signal(&mut self, key: impl Into<String>, label: impl Into<String>) {
        self.note_signals.insert(key.into(), label.into());
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn current(&self) -> &VitalsSnapshot {
        &self.current
    }

    /// Superseded snapshots, oldest first.
    pub fn history(&self) -> &[VitalsSnapshot] {
        &self.history
    }

    /// Most recent superseded snapshot.
    pub fn previous(&self) -> Option<&VitalsSnapshot> {
        self.history.last()
    }

    pub fn resources(&self) -> &ResourceSnapshot {
        &self.resources
    }

    pub fn has_intervention(&self, label: &str) -> bool {
        self.active_interventions.contains(label)
    }

    pub fn active_interventions(&self) -> impl Iterator<Item = &str> {
        self.active_interventions.iter().map(String::as_str)
    }

    pub fn note_signals(&self) -> &BTreeMap<String, String> {
        &self.note_signals
    }

    pub fn last_updated_at(&self) -> DateTime<Utc> {
        self.last_updated_at
    }
}
