//! One assessment cycle per call: update beliefs, perceive, check safety,
//! score, classify intent, annotate.

use chrono::{DateTime, Utc};
use escalation_core::{
    actions, ActionCatalog, BeliefState, EscalationConfig, Intent, Recommendation, ResourceSnapshot,
    VitalsSnapshot,
};
use serde::{Deserialize, Serialize};

use crate::counterfactual::RiskProjector;
use crate::narrative::memory_narrative;
use crate::perception::PerceptionReport;
use crate::safety::check_safety;
use crate::scoring::ScoringEngine;
use crate::tradeoffs::summarize_tradeoffs;

const FREQUENT_CHECK_IN_MINUTES: u32 = 30;
const ROUTINE_CHECK_IN_MINUTES: u32 = 60;

/// Stages a cycle passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Updating,
    Perceiving,
    SafetyCheck,
    Scoring,
    IntentClassification,
    Annotating,
}

/// How a cycle terminated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    Emergent,
    Ranked,
}

/// Everything one cycle produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assessment {
    pub patient_id: String,
    pub assessed_at: DateTime<Utc>,
    pub outcome: CycleOutcome,
    pub normalized_risk: f64,
    pub intent: Option<Intent>,
    pub signals: PerceptionReport,
    pub explanation_signals: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub tradeoff_summary: String,
}

/// Intent and follow-up interval implied by the top-ranked action.
pub fn classify_intent(top_action: &str) -> (Intent, Option<u32>) {
    if !actions::MONITORING.contains(&top_action) {
        return (Intent::Escalate, None);
    }
    let check_in = if top_action == actions::INCREASE_MONITORING {
        FREQUENT_CHECK_IN_MINUTES
    } else {
        ROUTINE_CHECK_IN_MINUTES
    };
    (Intent::Monitor, Some(check_in))
}

/// Escalation decision support for a single patient session.
#[derive(Debug, Clone)]
pub struct EscalationAgent {
    patient_id: String,
    config: EscalationConfig,
    scoring: ScoringEngine,
    projector: RiskProjector,
    belief: Option<BeliefState>,
    last_intent: Option<Intent>,
}

impl EscalationAgent {
    pub fn new(patient_id: impl Into<String>) -> Self {
        Self::with_config(patient_id, EscalationConfig::default())
    }

    pub fn with_config(patient_id: impl Into<String>, config: EscalationConfig) -> Self {
        Self::with_catalog(patient_id, config, ActionCatalog::standard())
    }

    pub fn with_catalog(
        patient_id: impl Into<String>,
        config: EscalationConfig,
        catalog: ActionCatalog,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            scoring: ScoringEngine::new(catalog, &config),
            projector: RiskProjector::default(),
            config,
            belief: None,
            last_intent: None,
        }
    }

    pub fn with_projector(mut self, projector: RiskProjector) -> Self {
        self.projector = projector;
        self
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    /// Belief state, present once the first assessment has run.
    pub fn belief(&self) -> Option<&BeliefState> {
        self.belief.as_ref()
    }

    pub fn belief_mut(&mut self) -> Option<&mut BeliefState> {
        self.belief.as_mut()
    }

    /// Run a cycle at the current wall-clock time and return only the ranked list.
    pub fn run_step(&mut self, vitals: VitalsSnapshot, resources: ResourceSnapshot) -> Vec<Recommendation> {
        self.assess(vitals, resources, Utc::now()).recommendations
    }

    /// Run one full cycle as of `now`.
    pub fn assess(
        &mut self,
        vitals: VitalsSnapshot,
        resources: ResourceSnapshot,
        now: DateTime<Utc>,
    ) -> Assessment {
        self.enter(CycleStage::Updating);
        let belief = self.absorb(vitals, resources, now);

        self.enter(CycleStage::Perceiving);
        let signals = PerceptionReport::perceive(&belief, now, self.config.overdue_review_minutes);
        let risk = belief.current().normalized_risk();

        self.enter(CycleStage::SafetyCheck);
        let emergent = check_safety(belief.current());
        let explanation_signals =
            signals.explanation_signals(emergent.is_some(), |key| self.projector.is_known_signal(key));

        let (outcome, intent, recommendations) = match emergent {
            Some(override_rec) => {
                let recs = self.emergent_recommendations(&belief, override_rec, risk, &explanation_signals);
                let intent = self.config.annotate_emergent.then_some(Intent::Escalate);
                (CycleOutcome::Emergent, intent, recs)
            }
            None => {
                self.enter(CycleStage::Scoring);
                let mut recs = self.scoring.rank(&belief, belief.resources());

                self.enter(CycleStage::IntentClassification);
                let classified = recs.first().map(|top| {
                    let (intent, check_in) = classify_intent(&top.action);
                    self.log_intent(intent, &top.action);
                    (intent, check_in)
                });

                self.enter(CycleStage::Annotating);
                if let Some((intent, check_in)) = classified {
                    self.annotate(&belief, &mut recs, intent, check_in, risk, &explanation_signals);
                }
                (CycleOutcome::Ranked, classified.map(|(intent, _)| intent), recs)
            }
        };
        self.belief = Some(belief);
        if intent.is_some() {
            self.last_intent = intent;
        }

        Assessment {
            patient_id: self.patient_id.clone(),
            assessed_at: now,
            outcome,
            normalized_risk: risk,
            intent,
            tradeoff_summary: summarize_tradeoffs(&recommendations),
            signals,
            explanation_signals,
            recommendations,
        }
    }

    /// Intent of the most recent cycle that classified one.
    pub fn last_intent(&self) -> Option<Intent> {
        self.last_intent
    }

    fn log_intent(&self, intent: Intent, top_action: &str) {
        if self.last_intent == Some(intent) {
            log::debug!("{}: intent {:?} from {}", self.patient_id, intent, top_action);
        } else {
            log::info!(
                "{}: intent {:?} -> {:?} from {}",
                self.patient_id,
                self.last_intent,
                intent,
                top_action
            );
        }
    }

    fn enter(&self, stage: CycleStage) {
        log::debug!("{}: {:?}", self.patient_id, stage);
    }

    /// Take the belief state out of the session, updated with this cycle's inputs.
    fn absorb(&mut self, vitals: VitalsSnapshot, resources: ResourceSnapshot, now: DateTime<Utc>) -> BeliefState {
        let mut belief = match self.belief.take() {
            Some(mut belief) => {
                belief.update_vitals_at(vitals, now);
                belief
            }
            None => BeliefState::new_at(self.patient_id.clone(), vitals, now),
        };
        belief.update_resources(resources);
        belief
    }

    fn emergent_recommendations(
        &self,
        belief: &BeliefState,
        override_rec: Recommendation,
        risk: f64,
        explanation_signals: &[String],
    ) -> Vec<Recommendation> {
        let mut recs = vec![override_rec];
        if self.config.append_ranked_on_emergent {
            let room = self.config.recommendation_cap().saturating_sub(1);
            let ranked = self.scoring.rank(belief, belief.resources());
            recs.extend(ranked.into_iter().take(room).enumerate().map(|(idx, mut rec)| {
                rec.rank = idx as u32 + 2;
                rec
            }));
        }
        if self.config.annotate_emergent {
            self.annotate(belief, &mut recs, Intent::Escalate, None, risk, explanation_signals);
        }
        recs
    }

    fn annotate(
        &self,
        belief: &BeliefState,
        recs: &mut [Recommendation],
        intent: Intent,
        check_in: Option<u32>,
        risk: f64,
        explanation_signals: &[String],
    ) {
        let narrative = memory_narrative(belief.history(), belief.current());
        let delay = check_in.unwrap_or(self.config.default_projection_delay_minutes);
        let projection = self.projector.project(risk, delay, explanation_signals);

        for rec in recs.iter_mut() {
            rec.intent = Some(intent);
            rec.next_check_in_minutes = check_in;
            rec.memory_narrative = Some(narrative.clone());
            rec.counterfactual = Some(projection.clone());
        }
    }
}
