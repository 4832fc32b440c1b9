//! What changed since the last assessment, in plain sentences.

use escalation_core::VitalsSnapshot;

pub const NO_PRIOR_HISTORY: &str = "Initial assessment - no prior history.";
pub const STABLE_SINCE_LAST: &str = "Vital signs remain stable since last assessment.";

/// One line per notable change against the most recent archived snapshot.
///
/// Lines follow a fixed check order (score, RR, SpO2, SBP, consciousness),
/// never magnitude.
pub fn memory_narrative(history: &[VitalsSnapshot], current: &VitalsSnapshot) -> Vec<String> {
    let Some(last) = history.last() else {
        return vec![NO_PRIOR_HISTORY.to_string()];
    };

    let mut lines = Vec::new();

    if current.early_warning_score != last.early_warning_score {
        let direction = if current.early_warning_score > last.early_warning_score {
            "increased"
        } else {
            "decreased"
        };
        lines.push(format!(
            "NEWS2 score {direction} from {} -> {}",
            last.early_warning_score, current.early_warning_score
        ));
    }

    if current.respiratory_rate.abs_diff(last.respiratory_rate) >= 2 {
        let direction = if current.respiratory_rate > last.respiratory_rate {
            "increased"
        } else {
            "decreased"
        };
        lines.push(format!(
            "Respiratory rate {direction} from {} -> {}",
            last.respiratory_rate, current.respiratory_rate
        ));
    }

    if current.spo2.abs_diff(last.spo2) >= 3 {
        let direction = if current.spo2 < last.spo2 { "dropped" } else { "improved" };
        lines.push(format!("SpO2 {direction} from {}% -> {}%", last.spo2, current.spo2));
    }

    if current.systolic_bp.abs_diff(last.systolic_bp) >= 15 {
        let direction = if current.systolic_bp < last.systolic_bp {
            "dropped"
        } else {
            "rose"
        };
        lines.push(format!(
            "Systolic BP {direction} from {} -> {}",
            last.systolic_bp, current.systolic_bp
        ));
    }

    if current.consciousness != last.consciousness {
        lines.push(format!(
            "Consciousness level changed from {} -> {}",
            last.consciousness, current.consciousness
        ));
    }

    if lines.is_empty() {
        lines.push(STABLE_SINCE_LAST.to_string());
    }
    lines
}
