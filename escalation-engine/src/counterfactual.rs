//! Linear, table-driven projection of risk under a delayed action.

use escalation_core::{round3, CounterfactualResult};

/// Risk units gained per minute of inaction with no aggravating signal.
pub const BASE_RISK_PER_MINUTE: f64 = 0.001;

/// Drift multipliers for signals that speed up deterioration.
pub const SIGNAL_MULTIPLIERS: [(&str, f64); 10] = [
    ("rapid_deterioration", 3.0),
    ("sepsis_alert", 2.0),
    ("emergent_safety_trigger", 5.0),
    ("unstable_trend", 1.5),
    ("hypoxia", 2.0),
    ("hypotension", 2.5),
    ("Rapid SBP drop", 2.5),
    ("Rapid RR rise", 2.0),
    ("Significant SpO2 drop", 2.0),
    ("overdue_review", 1.5),
];

#[derive(Debug, Clone, PartialEq)]
pub struct RiskProjector {
    base_rate_per_minute: f64,
    multipliers: Vec<(String, f64)>,
}

impl Default for RiskProjector {
    fn default() -> Self {
        Self::new(
            BASE_RISK_PER_MINUTE,
            SIGNAL_MULTIPLIERS
                .iter()
                .map(|(signal, factor)| (signal.to_string(), *factor)),
        )
    }
}

impl RiskProjector {
    pub fn new(
        base_rate_per_minute: f64,
        multipliers: impl IntoIterator<Item = (String, f64)>,
    ) -> Self {
        Self {
            base_rate_per_minute,
            multipliers: multipliers.into_iter().collect(),
        }
    }

    pub fn multiplier(&self, signal: &str) -> Option<f64> {
        self.multipliers
            .iter()
            .find(|(name, _)| name == signal)
            .map(|(_, factor)| *factor)
    }

    pub fn is_known_signal(&self, signal: &str) -> bool {
        self.multiplier(signal).is_some()
    }

    /// Project risk after `delay_minutes` of inaction.
    ///
    /// The fastest matching signal sets the drift rate; every matching signal
    /// is reported as a driver. `current_risk` is clamped to `[0.0, 1.0]`
    /// (non-finite reads as 0.0). Outputs are rounded to 3 decimals, so
    /// `projected_risk` lies within `[round3(current), 1.0]`.
    pub fn project(
        &self,
        current_risk: f64,
        delay_minutes: u32,
        active_signals: &[String],
    ) -> CounterfactualResult {
        let current_risk = if current_risk.is_finite() {
            current_risk.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut multiplier: f64 = 1.0;
        let mut key_drivers: Vec<String> = Vec::new();
        for signal in active_signals {
            let Some(factor) = self.multiplier(signal) else {
                continue;
            };
            multiplier = multiplier.max(factor);
            if !key_drivers.contains(signal) {
                key_drivers.push(signal.clone());
            }
        }

        let increase = self.base_rate_per_minute * multiplier * delay_minutes as f64;
        let projected_risk = (current_risk + increase).min(1.0);
        let risk_change = projected_risk - current_risk;

        let mut summary = format!(
            "Delay of {delay_minutes} min projected to increase risk by {risk_change:.2}."
        );
        if key_drivers.is_empty() {
            summary.push_str(" Due to baseline physiologic drift.");
        } else {
            summary.push_str(&format!(" Driven by: {}.", key_drivers.join(", ")));
        }
        if projected_risk >= 1.0 {
            summary.push_str(" Warning: Risk reaches critical saturation.");
        }

        CounterfactualResult {
            projected_risk: round3(projected_risk),
            risk_change: round3(risk_change),
            key_drivers,
            summary,
        }
    }
}

/// Project with the standard drift rate and multiplier table.
///
/// Same clamping and 3-decimal rounding as [`RiskProjector::project`].
pub fn project(current_risk: f64, delay_minutes: u32, active_signals: &[String]) -> CounterfactualResult {
    RiskProjector::default().project(current_risk, delay_minutes, active_signals)
}
