//! Replay of a scripted sequence of assessments for one patient.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use escalation_core::{EscalationConfig, EscalationError};
use serde::{Deserialize, Serialize};

use crate::agent::{Assessment, EscalationAgent};
use crate::input::{ResourceInput, VitalsInput};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub patient_id: String,
    #[serde(default)]
    pub config: EscalationConfig,
    pub steps: Vec<ScenarioStep>,
}

/// One assessment, plus care recorded after it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScenarioStep {
    pub label: Option<String>,
    /// Assessment clock; defaults to the vitals timestamp.
    pub now: Option<DateTime<Utc>>,
    pub vitals: VitalsInput,
    pub resources: ResourceInput,
    pub start_interventions: Vec<String>,
    pub stop_interventions: Vec<String>,
    pub note_signals: BTreeMap<String, String>,
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self, EscalationError> {
        serde_json::from_str(json).map_err(|err| EscalationError::Parse(err.to_string()))
    }

    /// Run every step through one agent. `fallback_now` stamps steps that
    /// carry neither a clock nor a vitals timestamp.
    pub fn run(&self, fallback_now: DateTime<Utc>) -> Result<Vec<Assessment>, EscalationError> {
        if self.steps.is_empty() {
            return Err(EscalationError::MissingData);
        }

        let mut agent = EscalationAgent::with_config(self.patient_id.clone(), self.config.clone());
        let mut assessments = Vec::with_capacity(self.steps.len());

        for (idx, step) in self.steps.iter().enumerate() {
            let now = step
                .now
                .or(step.vitals.recorded_at)
                .unwrap_or(fallback_now);
            let vitals = step.vitals.clone().into_snapshot(now)?;
            let resources = step.resources.clone().into_snapshot();

            log::debug!(
                "step {} ({}) at {now}",
                idx + 1,
                step.label.as_deref().unwrap_or("unlabelled")
            );
            assessments.push(agent.assess(vitals, resources, now));

            if let Some(belief) = agent.belief_mut() {
                for label in &step.start_interventions {
                    belief.start_intervention(label.as_str());
                }
                for label in &step.stop_interventions {
                    belief.stop_intervention(label);
                }
                for (key, value) in &step.note_signals {
                    belief.record_note_signal(key.as_str(), value.as_str());
                }
            }
        }

        Ok(assessments)
    }
}
