use escalation_core::{Recommendation, Tier};

/// One-line comparison of the top recommendation against the runner-up.
pub fn summarize_tradeoffs(recommendations: &[Recommendation]) -> String {
    let Some(top) = recommendations.first() else {
        return "No actions recommended.".to_string();
    };

    let mut summary = format!("Recommended: {} (Conf: {}).", top.action, top.confidence);
    if let Some(alt) = recommendations.get(1) {
        let reason = if alt.cost.level == Tier::High && top.cost.level != Tier::High {
            "higher resource cost."
        } else if alt.confidence < top.confidence {
            "lower confidence in benefit."
        } else {
            "ranking logic."
        };
        summary.push_str(&format!(
            " Alternative: {} has lower score due to {reason}",
            alt.action
        ));
    }
    summary
}
