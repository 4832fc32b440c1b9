//! Multi-criteria scoring and ranking over an injected action catalog.

use escalation_core::{
    actions, round2, ActionCatalog, ActionDefinition, BeliefState, Cost, EscalationConfig,
    Recommendation, ResourceSnapshot, Tier,
};

const RISK_WEIGHT: f64 = 0.4;
const HIGH_LOAD_THRESHOLD: f64 = 0.9;
const HIGH_LOAD_PENALTY: f64 = 0.3;
const TRANSPORT_PENALTY_PER_HOUR: f64 = 0.1;
const MIN_CONFIDENCE: f64 = 0.3;
const MAX_CONFIDENCE: f64 = 1.0;

/// Eligible action with its raw score, before ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAction {
    pub score: f64,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    catalog: ActionCatalog,
    transfer_plan_risk_threshold: f64,
    cap: usize,
}

impl ScoringEngine {
    pub fn new(catalog: ActionCatalog, config: &EscalationConfig) -> Self {
        Self {
            catalog,
            transfer_plan_risk_threshold: config.transfer_plan_risk_threshold,
            cap: config.recommendation_cap(),
        }
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    /// Rank eligible actions and keep the best ones, up to the configured cap.
    pub fn rank(&self, belief: &BeliefState, resources: &ResourceSnapshot) -> Vec<Recommendation> {
        let mut scored = self.evaluate(belief, resources);
        // stable: equal scores keep catalog order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(self.cap);

        scored
            .into_iter()
            .enumerate()
            .map(|(idx, candidate)| {
                let mut rec = candidate.recommendation;
                rec.rank = idx as u32 + 1;
                log::debug!("rank {} -> {} (score {:.3})", rec.rank, rec.action, candidate.score);
                rec
            })
            .collect()
    }

    /// Score every eligible action in catalog order.
    pub fn evaluate(&self, belief: &BeliefState, resources: &ResourceSnapshot) -> Vec<ScoredAction> {
        let vitals = belief.current();
        let risk = vitals.normalized_risk();

        self.catalog
            .iter()
            .filter(|def| self.is_eligible(def, risk, resources))
            .map(|def| {
                let score = score_action(def, risk, resources);
                let confidence = round2(score.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE));
                let rationale = rationale(def, vitals.early_warning_score, risk, resources);
                let recommendation = Recommendation::new(
                    def.action.clone(),
                    rationale,
                    def.benefit,
                    Cost {
                        level: def.cost,
                        explanation: def.cost_explanation.clone(),
                    },
                    confidence,
                );
                ScoredAction {
                    score,
                    recommendation,
                }
            })
            .collect()
    }

    fn is_eligible(&self, def: &ActionDefinition, risk: f64, resources: &ResourceSnapshot) -> bool {
        if risk < def.min_risk {
            log::debug!("{} filtered: risk {risk:.2} below {:.2}", def.action, def.min_risk);
            return false;
        }
        match def.action.as_str() {
            actions::ICU_TRANSFER if resources.icu_beds_available == 0 => {
                log::debug!("{} filtered: no ICU beds", def.action);
                false
            }
            actions::PREPARE_TRANSFER_PLAN
                if resources.icu_beds_available > 0 && risk < self.transfer_plan_risk_threshold =>
            {
                log::debug!(
                    "{} filtered: beds available and risk {risk:.2} below {:.2}",
                    def.action,
                    self.transfer_plan_risk_threshold
                );
                false
            }
            _ => true,
        }
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ActionCatalog::standard(), &EscalationConfig::default())
    }
}

fn score_action(def: &ActionDefinition, risk: f64, resources: &ResourceSnapshot) -> f64 {
    let mut score = def.base_score + risk * RISK_WEIGHT;
    if def.cost == Tier::High && resources.effective_nurse_load() > HIGH_LOAD_THRESHOLD {
        score -= HIGH_LOAD_PENALTY;
    }
    if def.action == actions::ICU_TRANSFER {
        score -= (resources.transport_delay_minutes as f64 / 60.0) * TRANSPORT_PENALTY_PER_HOUR;
    }
    score.max(0.0)
}

fn risk_label(risk: f64) -> &'static str {
    if risk < 0.3 {
        "low"
    } else if risk < 0.6 {
        "moderate"
    } else {
        "high"
    }
}

fn rationale(def: &ActionDefinition, score: u32, risk: f64, resources: &ResourceSnapshot) -> String {
    let base = format!("Patient NEWS2 score of {score} indicates {} risk.", risk_label(risk));
    let detail = match def.action.as_str() {
        actions::ICU_TRANSFER => format!(
            "ICU beds available: {}. Transport delay: {} minutes.",
            resources.icu_beds_available, resources.transport_delay_minutes
        ),
        actions::PREPARE_TRANSFER_PLAN if resources.icu_beds_available == 0 => {
            "No ICU beds available (beds: 0). Initiating transfer coordination.".to_string()
        }
        actions::PREPARE_TRANSFER_PLAN => format!(
            "ICU beds available: {}. Pre-planning transfer coordination for high risk.",
            resources.icu_beds_available
        ),
        _ => def
            .rationale
            .clone()
            .unwrap_or_else(|| "Action appropriate for risk level.".to_string()),
    };
    format!("{base} {detail}")
}
