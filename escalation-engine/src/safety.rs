//! Mandatory safety override evaluated before any scoring.

use std::fmt;

use escalation_core::{actions, Consciousness, Cost, Recommendation, Tier, VitalsSnapshot};

/// Confidence attached to the override, outside the usual calibration.
pub const OVERRIDE_CONFIDENCE: f64 = 0.95;

/// One physiological criterion that forces an immediate RRT call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyTrigger {
    NotAlert(Consciousness),
    SevereHypotension(i32),
    SevereHypoxia(i32),
    ExtremeTachypnea(i32),
    HighWarningScore(u32),
}

impl fmt::Display for SafetyTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyTrigger::NotAlert(level) => write!(f, "AVPU={level}"),
            SafetyTrigger::SevereHypotension(sbp) => write!(f, "SBP={sbp}"),
            SafetyTrigger::SevereHypoxia(spo2) => write!(f, "SpO2={spo2}"),
            SafetyTrigger::ExtremeTachypnea(rr) => write!(f, "RR={rr}"),
            SafetyTrigger::HighWarningScore(score) => write!(f, "NEWS2={score}"),
        }
    }
}

/// Every override criterion met by `vitals`, in fixed check order.
pub fn safety_triggers(vitals: &VitalsSnapshot) -> Vec<SafetyTrigger> {
    let mut triggers = Vec::new();
    if vitals.consciousness != Consciousness::Alert {
        triggers.push(SafetyTrigger::NotAlert(vitals.consciousness));
    }
    if vitals.systolic_bp < 70 {
        triggers.push(SafetyTrigger::SevereHypotension(vitals.systolic_bp));
    }
    if vitals.spo2 < 80 {
        triggers.push(SafetyTrigger::SevereHypoxia(vitals.spo2));
    }
    if vitals.respiratory_rate > 35 {
        triggers.push(SafetyTrigger::ExtremeTachypnea(vitals.respiratory_rate));
    }
    if vitals.early_warning_score >= 9 {
        triggers.push(SafetyTrigger::HighWarningScore(vitals.early_warning_score));
    }
    triggers
}

/// The override recommendation, if any criterion is met.
pub fn check_safety(vitals: &VitalsSnapshot) -> Option<Recommendation> {
    let triggers = safety_triggers(vitals);
    if triggers.is_empty() {
        return None;
    }

    let criteria = triggers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    log::info!("safety override fired: {criteria}");

    let mut rec = Recommendation::new(
        actions::CALL_RRT,
        format!("Patient meets critical safety criteria: {criteria}. Immediate RRT response required."),
        Tier::High,
        Cost {
            level: Tier::Medium,
            explanation: "RRT team mobilization and assessment".to_string(),
        },
        OVERRIDE_CONFIDENCE,
    );
    rec.emergent = true;
    rec.rank = 1;
    Some(rec)
}
