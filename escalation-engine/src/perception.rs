//! Signals derived from the belief state. Each check is independent.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use escalation_core::{BeliefState, VitalsSnapshot};
use serde::{Deserialize, Serialize};

pub const RAPID_SBP_DROP: &str = "Rapid SBP drop";
pub const RAPID_RR_RISE: &str = "Rapid RR rise";
pub const SIGNIFICANT_SPO2_DROP: &str = "Significant SpO2 drop";
pub const OVERDUE_REVIEW: &str = "overdue_review";
pub const EMERGENT_SAFETY_TRIGGER: &str = "emergent_safety_trigger";

/// Intervention whose effect on systolic pressure is tracked.
pub const FLUID_BOLUS: &str = "fluid_bolus";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    Stable,
    Unstable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendReport {
    pub stability: Stability,
    pub trends: Vec<String>,
}

impl Default for TrendReport {
    fn default() -> Self {
        Self {
            stability: Stability::Stable,
            trends: Vec::new(),
        }
    }
}

/// Compare the current snapshot with the most recent archived one.
pub fn analyze_trends(history: &[VitalsSnapshot], current: &VitalsSnapshot) -> TrendReport {
    let Some(last) = history.last() else {
        return TrendReport::default();
    };

    // widened so extreme readings cannot overflow
    let (sbp, last_sbp) = (i64::from(current.systolic_bp), i64::from(last.systolic_bp));
    let (rr, last_rr) = (i64::from(current.respiratory_rate), i64::from(last.respiratory_rate));
    let (spo2, last_spo2) = (i64::from(current.spo2), i64::from(last.spo2));

    let mut trends = Vec::new();
    if sbp < last_sbp - 20 {
        trends.push(RAPID_SBP_DROP.to_string());
    }
    if rr > last_rr + 5 {
        trends.push(RAPID_RR_RISE.to_string());
    }
    if spo2 < last_spo2 - 5 {
        trends.push(SIGNIFICANT_SPO2_DROP.to_string());
    }

    let stability = if trends.is_empty() {
        Stability::Stable
    } else {
        Stability::Unstable
    };
    TrendReport { stability, trends }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DelaySignal {
    pub overdue_review: bool,
    pub minutes_since_vitals: f64,
}

/// Minutes elapsed since the current snapshot was recorded.
///
/// Measured from the snapshot's own timestamp, not from the last care action.
pub fn check_delay(belief: &BeliefState, now: DateTime<Utc>, overdue_after_minutes: u32) -> DelaySignal {
    let elapsed = now.signed_duration_since(belief.current().recorded_at);
    let minutes = elapsed.num_milliseconds() as f64 / 60_000.0;
    DelaySignal {
        overdue_review: minutes > overdue_after_minutes as f64,
        minutes_since_vitals: (minutes * 10.0).round() / 10.0,
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentResponse {
    Responsive,
    NonResponsive,
    NoSignificantChange,
    Unknown,
}

/// Systolic response to an active fluid bolus.
pub fn treatment_response(belief: &BeliefState) -> TreatmentResponse {
    if !belief.has_intervention(FLUID_BOLUS) {
        return TreatmentResponse::Unknown;
    }
    let Some(previous) = belief.previous() else {
        return TreatmentResponse::Unknown;
    };

    let current = i64::from(belief.current().systolic_bp);
    let previous = i64::from(previous.systolic_bp);
    if current > previous + 5 {
        TreatmentResponse::Responsive
    } else if current < previous {
        TreatmentResponse::NonResponsive
    } else {
        TreatmentResponse::NoSignificantChange
    }
}

/// Signals extracted from clinical notes, passed through as recorded.
pub fn note_signals(belief: &BeliefState) -> BTreeMap<String, String> {
    belief.note_signals().clone()
}

/// All perception output for one cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerceptionReport {
    pub trend: TrendReport,
    pub delay: DelaySignal,
    pub treatment_response: TreatmentResponse,
    pub notes: BTreeMap<String, String>,
}

impl PerceptionReport {
    pub fn perceive(belief: &BeliefState, now: DateTime<Utc>, overdue_after_minutes: u32) -> Self {
        let report = Self {
            trend: analyze_trends(belief.history(), belief.current()),
            delay: check_delay(belief, now, overdue_after_minutes),
            treatment_response: treatment_response(belief),
            notes: note_signals(belief),
        };
        log::debug!(
            "perception for {}: stability={:?} trends={:?} overdue={} response={:?}",
            belief.patient_id(),
            report.trend.stability,
            report.trend.trends,
            report.delay.overdue_review,
            report.treatment_response
        );
        report
    }

    /// Signals that explain risk to the counterfactual projector.
    ///
    /// Trend flags first, then the overdue flag, then the safety trigger,
    /// then note keys accepted by `is_known_signal`.
    pub fn explanation_signals(&self, emergent: bool, is_known_signal: impl Fn(&str) -> bool) -> Vec<String> {
        let mut signals = self.trend.trends.clone();
        if self.delay.overdue_review {
            signals.push(OVERDUE_REVIEW.to_string());
        }
        if emergent {
            signals.push(EMERGENT_SAFETY_TRIGGER.to_string());
        }
        signals.extend(self.notes.keys().filter(|key| is_known_signal(key)).cloned());
        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 31, 8, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn belief_with(previous: VitalsSnapshot, current: VitalsSnapshot) -> BeliefState {
        let mut belief = BeliefState::new_at("P001", previous, at(0));
        belief.update_vitals_at(current, at(60));
        belief
    }

    #[test]
    fn no_history_is_stable() {
        let report = analyze_trends(&[], &VitalsSnapshot::baseline(at(0)));
        assert_eq!(report, TrendReport::default());
    }

    #[test]
    fn flags_every_crossed_threshold() {
        let previous = VitalsSnapshot::baseline(at(0));
        let current = VitalsSnapshot {
            systolic_bp: 95,
            respiratory_rate: 24,
            spo2: 90,
            ..VitalsSnapshot::baseline(at(60))
        };
        let report = analyze_trends(&[previous], &current);
        assert_eq!(report.stability, Stability::Unstable);
        assert_eq!(
            report.trends,
            vec![RAPID_SBP_DROP, RAPID_RR_RISE, SIGNIFICANT_SPO2_DROP]
        );
    }

    #[test]
    fn extreme_readings_do_not_overflow() {
        let previous = VitalsSnapshot {
            systolic_bp: i32::MIN,
            respiratory_rate: i32::MAX,
            spo2: i32::MIN,
            ..VitalsSnapshot::baseline(at(0))
        };
        let current = VitalsSnapshot {
            systolic_bp: i32::MAX,
            respiratory_rate: i32::MIN,
            spo2: i32::MAX,
            ..VitalsSnapshot::baseline(at(60))
        };
        assert_eq!(analyze_trends(&[previous.clone()], &current), TrendReport::default());

        let mut belief = belief_with(previous, current);
        belief.start_intervention(FLUID_BOLUS);
        assert_eq!(treatment_response(&belief), TreatmentResponse::Responsive);
    }

    #[test]
    fn thresholds_are_strict() {
        let previous = VitalsSnapshot::baseline(at(0));
        let current = VitalsSnapshot {
            systolic_bp: 100,
            respiratory_rate: 21,
            spo2: 93,
            ..VitalsSnapshot::baseline(at(60))
        };
        let report = analyze_trends(&[previous], &current);
        assert_eq!(report.stability, Stability::Stable);
        assert!(report.trends.is_empty());
    }

    #[test]
    fn only_latest_history_entry_is_compared() {
        let old = VitalsSnapshot {
            systolic_bp: 160,
            ..VitalsSnapshot::baseline(at(0))
        };
        let recent = VitalsSnapshot::baseline(at(30));
        let current = VitalsSnapshot::baseline(at(60));
        let report = analyze_trends(&[old, recent], &current);
        assert!(report.trends.is_empty());
    }

    #[test]
    fn delay_counts_from_snapshot_timestamp() {
        let belief = BeliefState::new_at("P001", VitalsSnapshot::baseline(at(0)), at(0));
        let fresh = check_delay(&belief, at(60), 60);
        assert!(!fresh.overdue_review);
        assert_eq!(fresh.minutes_since_vitals, 60.0);

        let stale = check_delay(&belief, at(61), 60);
        assert!(stale.overdue_review);
    }

    #[test]
    fn response_requires_fluid_bolus_and_history() {
        let previous = VitalsSnapshot {
            systolic_bp: 90,
            ..VitalsSnapshot::baseline(at(0))
        };
        let current = VitalsSnapshot {
            systolic_bp: 100,
            ..VitalsSnapshot::baseline(at(60))
        };
        let mut belief = belief_with(previous, current);
        assert_eq!(treatment_response(&belief), TreatmentResponse::Unknown);

        belief.start_intervention(FLUID_BOLUS);
        assert_eq!(treatment_response(&belief), TreatmentResponse::Responsive);

        let lone = {
            let mut b = BeliefState::new_at("P002", VitalsSnapshot::baseline(at(0)), at(0));
            b.start_intervention(FLUID_BOLUS);
            b
        };
        assert_eq!(treatment_response(&lone), TreatmentResponse::Unknown);
    }

    #[test]
    fn response_classifies_flat_and_falling_pressure() {
        let previous = VitalsSnapshot {
            systolic_bp: 90,
            ..VitalsSnapshot::baseline(at(0))
        };
        let flat = VitalsSnapshot {
            systolic_bp: 95,
            ..VitalsSnapshot::baseline(at(60))
        };
        let mut belief = belief_with(previous.clone(), flat);
        belief.start_intervention(FLUID_BOLUS);
        assert_eq!(treatment_response(&belief), TreatmentResponse::NoSignificantChange);

        let falling = VitalsSnapshot {
            systolic_bp: 89,
            ..VitalsSnapshot::baseline(at(60))
        };
        let mut belief = belief_with(previous, falling);
        belief.start_intervention(FLUID_BOLUS);
        assert_eq!(treatment_response(&belief), TreatmentResponse::NonResponsive);
    }

    #[test]
    fn explanation_signals_follow_fixed_order() {
        let mut belief = belief_with(
            VitalsSnapshot::baseline(at(0)),
            VitalsSnapshot {
                systolic_bp: 90,
                ..VitalsSnapshot::baseline(at(60))
            },
        );
        belief.record_note_signal("sepsis_alert", "suspected");
        belief.record_note_signal("family_concern", "raised");

        let report = PerceptionReport::perceive(&belief, at(180), 60);
        let signals = report.explanation_signals(true, |key| key == "sepsis_alert");
        assert_eq!(
            signals,
            vec![RAPID_SBP_DROP, OVERDUE_REVIEW, EMERGENT_SAFETY_TRIGGER, "sepsis_alert"]
        );
    }
}
