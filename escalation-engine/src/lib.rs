//! Deterministic clinical escalation pipeline: perception, safety override,
//! action scoring, counterfactual projection and change narrative, driven by
//! a per-patient orchestrator.

pub mod agent;
pub mod counterfactual;
pub mod input;
pub mod narrative;
pub mod perception;
pub mod safety;
pub mod scenario;
pub mod scoring;
pub mod session;
pub mod tradeoffs;

pub use agent::{classify_intent, Assessment, CycleOutcome, CycleStage, EscalationAgent};
pub use counterfactual::{project, RiskProjector};
pub use input::{AssessmentInput, ResourceInput, VitalsInput};
pub use narrative::memory_narrative;
pub use perception::PerceptionReport;
pub use safety::check_safety;
pub use scenario::{Scenario, ScenarioStep};
pub use scoring::ScoringEngine;
pub use session::SessionRegistry;
pub use tradeoffs::summarize_tradeoffs;

use chrono::{DateTime, Utc};
use escalation_core::{EscalationConfig, EscalationError};

/// One-shot assessment of a JSON request with no prior history.
pub fn assess_json_str(
    patient_id: &str,
    request_json: &str,
    config: &EscalationConfig,
    now: DateTime<Utc>,
) -> Result<Assessment, EscalationError> {
    let (vitals, resources) = AssessmentInput::from_json_str(request_json)?.into_snapshots(now)?;
    let mut agent = EscalationAgent::with_config(patient_id, config.clone());
    Ok(agent.assess(vitals, resources, now))
}
