use serde::{Deserialize, Serialize};

use crate::Tier;

/// Labels of the actions the engine applies special rules to.
pub mod actions {
    pub const CALL_RRT: &str = "Call RRT";
    pub const MONITOR_CLOSELY: &str = "Monitor closely";
    pub const INCREASE_MONITORING: &str = "Increase monitoring frequency";
    pub const CONSULT_SPECIALIST: &str = "Consult specialist";
    pub const ICU_TRANSFER: &str = "ICU transfer";
    pub const PREPARE_TRANSFER_PLAN: &str = "Prepare transfer plan / bed request";
    pub const DISCHARGE_PLANNING: &str = "Discharge planning";

    /// Top-ranked actions that mean the course of care is to keep watching.
    pub const MONITORING: [&str; 3] = [MONITOR_CLOSELY, INCREASE_MONITORING, DISCHARGE_PLANNING];
}

/// Static description of one candidate action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionDefinition {
    pub action: String,
    pub base_score: f64,
    pub benefit: Tier,
    pub cost: Tier,
    pub cost_explanation: String,
    /// Normalized risk below which the action is never offered.
    pub min_risk: f64,
    /// Sentence appended to the risk statement in the rationale.
    #[serde(default)]
    pub rationale: Option<String>,
}

impl ActionDefinition {
    pub fn new(
        action: &str,
        base_score: f64,
        benefit: Tier,
        cost: Tier,
        cost_explanation: &str,
        min_risk: f64,
    ) -> Self {
        Self {
            action: action.to_string(),
            base_score,
            benefit,
            cost,
            cost_explanation: cost_explanation.to_string(),
            min_risk,
            rationale: None,
        }
    }

    pub fn with_rationale(mut self, rationale: &str) -> Self {
        self.rationale = Some(rationale.to_string());
        self
    }
}

/// Ordered, immutable set of candidate actions. Order breaks score ties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ActionCatalog {
    actions: Vec<ActionDefinition>,
}

impl ActionCatalog {
    pub fn new(actions: Vec<ActionDefinition>) -> Self {
        Self { actions }
    }

    /// The six ward-escalation actions.
    pub fn standard() -> Self {
        use actions::*;

        Self::new(vec![
            ActionDefinition::new(MONITOR_CLOSELY, 0.4, Tier::Low, Tier::Low, "Minimal resource use", 0.0)
                .with_rationale("Standard monitoring appropriate for current risk level."),
            ActionDefinition::new(
                INCREASE_MONITORING,
                0.6,
                Tier::Medium,
                Tier::Low,
                "Slight increase in nursing time",
                0.1,
            )
            .with_rationale("Increased monitoring to track vital sign trends."),
            ActionDefinition::new(
                CONSULT_SPECIALIST,
                0.7,
                Tier::Medium,
                Tier::Medium,
                "Specialist time and coordination",
                0.2,
            )
            .with_rationale("Specialist consultation recommended for elevated risk factors."),
            ActionDefinition::new(
                ICU_TRANSFER,
                0.9,
                Tier::High,
                Tier::High,
                "ICU bed and transport resources",
                0.3,
            ),
            ActionDefinition::new(
                PREPARE_TRANSFER_PLAN,
                0.8,
                Tier::Medium,
                Tier::Medium,
                "Administrative coordination for bed request",
                0.3,
            ),
            ActionDefinition::new(DISCHARGE_PLANNING, 0.2, Tier::Low, Tier::Low, "Planning time", 0.0)
                .with_rationale("Patient stable, initiate discharge planning."),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.actions.iter()
    }

    pub fn get(&self, action: &str) -> Option<&ActionDefinition> {
        self.actions.iter().find(|def| def.action == action)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_keeps_tie_break_order() {
        let catalog = ActionCatalog::standard();
        let labels: Vec<&str> = catalog.iter().map(|def| def.action.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                actions::MONITOR_CLOSELY,
                actions::INCREASE_MONITORING,
                actions::CONSULT_SPECIALIST,
                actions::ICU_TRANSFER,
                actions::PREPARE_TRANSFER_PLAN,
                actions::DISCHARGE_PLANNING,
            ]
        );
    }

    #[test]
    fn catalog_round_trips_as_plain_list() {
        let catalog = ActionCatalog::new(vec![ActionDefinition::new(
            "Fluid bolus",
            0.5,
            Tier::Medium,
            Tier::Low,
            "Nursing time",
            0.2,
        )]);
        let json = serde_json::to_string(&catalog).unwrap();
        assert!(json.starts_with('['));
        let parsed: ActionCatalog = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.get("Fluid bolus").map(|def| def.min_risk), Some(0.2));
    }
}
