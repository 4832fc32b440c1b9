//! Core types for the escalation pipeline: vitals and resource snapshots,
//! recommendations, tuning and the per-patient belief state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod belief;
mod catalog;

pub use belief::BeliefState;
pub use catalog::{actions, ActionCatalog, ActionDefinition};

/// Upper bound of the aggregate early-warning score.
pub const MAX_WARNING_SCORE: u32 = 20;

/// Hard cap on recommendations returned from one cycle.
pub const MAX_RECOMMENDATIONS: usize = 3;

/// Tuning that changes how a decision cycle behaves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EscalationConfig {
    /// Normalized risk at which a transfer plan is prepared even while ICU beds remain.
    pub transfer_plan_risk_threshold: f64,
    /// Minutes since the current snapshot after which a review is overdue.
    pub overdue_review_minutes: u32,
    /// Delay projected by the counterfactual when no check-in is scheduled.
    pub default_projection_delay_minutes: u32,
    /// Output cap, clamped to `1..=MAX_RECOMMENDATIONS`.
    pub max_recommendations: usize,
    /// Attach intent, narrative and counterfactual to the safety override.
    pub annotate_emergent: bool,
    /// Append ranked actions after the safety override, up to the cap.
    pub append_ranked_on_emergent: bool,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            transfer_plan_risk_threshold: 0.6,
            overdue_review_minutes: 60,
            default_projection_delay_minutes: 60,
            max_recommendations: MAX_RECOMMENDATIONS,
            annotate_emergent: false,
            append_ranked_on_emergent: false,
        }
    }
}

impl EscalationConfig {
    /// Effective output cap, between one and [`MAX_RECOMMENDATIONS`].
    pub fn recommendation_cap(&self) -> usize {
        self.max_recommendations.clamp(1, MAX_RECOMMENDATIONS)
    }
}

/// AVPU consciousness scale. Ordering follows alertness: `Alert` is greatest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Consciousness {
    Unresponsive,
    Pain,
    Voice,
    Alert,
}

impl Consciousness {
    /// Single-letter AVPU code.
    pub fn code(self) -> &'static str {
        match self {
            Consciousness::Alert => "A",
            Consciousness::Voice => "V",
            Consciousness::Pain => "P",
            Consciousness::Unresponsive => "U",
        }
    }
}

impl Default for Consciousness {
    fn default() -> Self {
        Consciousness::Alert
    }
}

impl fmt::Display for Consciousness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Consciousness {
    type Err = EscalationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "a" | "alert" => Ok(Consciousness::Alert),
            "v" | "voice" | "voice-responsive" => Ok(Consciousness::Voice),
            "p" | "pain" | "pain-responsive" => Ok(Consciousness::Pain),
            "u" | "unresponsive" => Ok(Consciousness::Unresponsive),
            other => Err(EscalationError::InvalidInput(format!(
                "unknown consciousness level {other:?}"
            ))),
        }
    }
}

/// Point-in-time physiology of one patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VitalsSnapshot {
    pub consciousness: Consciousness,
    pub systolic_bp: i32,
    pub spo2: i32,
    pub respiratory_rate: i32,
    pub heart_rate: i32,
    pub temperature: f64,
    /// Aggregate early-warning score (NEWS2), 0 to 20.
    pub early_warning_score: u32,
    pub recorded_at: DateTime<Utc>,
}

impl VitalsSnapshot {
    /// Snapshot with normal adult physiology taken at `recorded_at`.
    pub fn baseline(recorded_at: DateTime<Utc>) -> Self {
        Self {
            consciousness: Consciousness::Alert,
            systolic_bp: 120,
            spo2: 98,
            respiratory_rate: 16,
            heart_rate: 80,
            temperature: 37.0,
            early_warning_score: 0,
            recorded_at,
        }
    }

    /// Early-warning score scaled to `[0, 1]`.
    pub fn normalized_risk(&self) -> f64 {
        (self.early_warning_score as f64 / MAX_WARNING_SCORE as f64).min(1.0)
    }
}

/// Hospital capacity at the time of an assessment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResourceSnapshot {
    pub icu_beds_available: u32,
    pub rrt_available: bool,
    /// 0.0 is idle, above 1.0 is overloaded.
    pub nurse_load: f64,
    pub transport_delay_minutes: u32,
    pub specialist_available: bool,
}

impl Default for ResourceSnapshot {
    fn default() -> Self {
        Self {
            icu_beds_available: 0,
            rrt_available: true,
            nurse_load: DEFAULT_NURSE_LOAD,
            transport_delay_minutes: 0,
            specialist_available: true,
        }
    }
}

/// Nurse load assumed when none is known.
pub const DEFAULT_NURSE_LOAD: f64 = 0.5;

impl ResourceSnapshot {
    /// Nurse load with non-finite or negative readings replaced by the default.
    pub fn effective_nurse_load(&self) -> f64 {
        if self.nurse_load.is_finite() && self.nurse_load >= 0.0 {
            self.nurse_load
        } else {
            DEFAULT_NURSE_LOAD
        }
    }
}

/// Three-step scale shared by benefit and cost.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Low => "Low",
            Tier::Medium => "Medium",
            Tier::High => "High",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cost {
    pub level: Tier,
    pub explanation: String,
}

/// Projected risk if an action is delayed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CounterfactualResult {
    pub projected_risk: f64,
    pub risk_change: f64,
    pub key_drivers: Vec<String>,
    pub summary: String,
}

/// Session-level direction of care.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Escalate,
    Monitor,
}

/// One ranked, explained action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub action: String,
    pub rationale: String,
    pub expected_benefit: Tier,
    pub cost: Cost,
    pub confidence: f64,
    pub emergent: bool,
    pub rank: u32,
    #[serde(rename = "counterfactual_analysis", default)]
    pub counterfactual: Option<CounterfactualResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_check_in_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_narrative: Option<Vec<String>>,
}

impl Recommendation {
    /// Unannotated recommendation; rank and annotations are filled later in the cycle.
    pub fn new(
        action: impl Into<String>,
        rationale: impl Into<String>,
        expected_benefit: Tier,
        cost: Cost,
        confidence: f64,
    ) -> Self {
        Self {
            action: action.into(),
            rationale: rationale.into(),
            expected_benefit,
            cost,
            confidence,
            emergent: false,
            rank: 0,
            counterfactual: None,
            intent: None,
            next_check_in_minutes: None,
            memory_narrative: None,
        }
    }
}

/// Errors raised at the input boundary. The decision cycle itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum EscalationError {
    #[error("input is missing required data")]
    MissingData,
    #[error("could not parse input: {0}")]
    Parse(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    Other(String),
}

/// Round to two decimal places, the precision used for confidence.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to three decimal places, the precision used for risk figures.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
