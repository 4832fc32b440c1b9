use chrono::{DateTime, Duration, TimeZone, Utc};
use escalation_core::{actions, Consciousness, Intent, ResourceSnapshot, VitalsSnapshot};
use escalation_engine::{project, CycleOutcome, EscalationAgent};
use proptest::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 31, 8, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn vitals(
    consciousness: Consciousness,
    systolic_bp: i32,
    spo2: i32,
    respiratory_rate: i32,
    score: u32,
    minutes: i64,
) -> VitalsSnapshot {
    VitalsSnapshot {
        consciousness,
        systolic_bp,
        spo2,
        respiratory_rate,
        early_warning_score: score,
        ..VitalsSnapshot::baseline(at(minutes))
    }
}

fn resources(beds: u32, load: f64) -> ResourceSnapshot {
    ResourceSnapshot {
        icu_beds_available: beds,
        nurse_load: load,
        ..ResourceSnapshot::default()
    }
}

#[test]
fn stable_patient_gets_monitoring_plan() {
    init_logging();
    let mut agent = EscalationAgent::new("P001");
    let assessment = agent.assess(
        vitals(Consciousness::Alert, 120, 98, 16, 2, 0),
        resources(2, 0.5),
        at(0),
    );

    assert_eq!(assessment.outcome, CycleOutcome::Ranked);
    assert!(assessment.recommendations.iter().all(|rec| !rec.emergent));
    assert!(assessment
        .recommendations
        .iter()
        .any(|rec| rec.action == actions::MONITOR_CLOSELY || rec.action == actions::DISCHARGE_PLANNING));
    for rec in &assessment.recommendations {
        assert!((0.3..=0.8).contains(&rec.confidence), "{}: {}", rec.action, rec.confidence);
    }
    assert_eq!(assessment.intent, Some(Intent::Monitor));
}

#[test]
fn critical_patient_triggers_rrt_override() {
    init_logging();
    let mut agent = EscalationAgent::new("P001");
    let assessment = agent.assess(
        vitals(Consciousness::Voice, 60, 85, 30, 12, 0),
        resources(1, 0.9),
        at(0),
    );

    assert_eq!(assessment.outcome, CycleOutcome::Emergent);
    let first = &assessment.recommendations[0];
    assert_eq!(first.action, actions::CALL_RRT);
    assert!(first.emergent);
    assert_eq!(first.confidence, 0.95);
    assert_eq!(first.rank, 1);
    for criterion in ["AVPU=V", "SBP=60", "NEWS2=12"] {
        assert!(first.rationale.contains(criterion), "missing {criterion}");
    }
    assert!(!first.rationale.contains("SpO2="));
    assert!(!first.rationale.contains("RR="));
    assert_eq!(assessment.recommendations.len(), 1);
}

#[test]
fn repeated_histories_give_identical_output() {
    let run = || {
        let mut agent = EscalationAgent::new("P001");
        let steps = [
            (vitals(Consciousness::Alert, 120, 98, 16, 1, 0), resources(2, 0.5)),
            (vitals(Consciousness::Alert, 105, 93, 23, 6, 45), resources(1, 0.8)),
            (vitals(Consciousness::Alert, 82, 90, 29, 8, 90), resources(0, 0.95)),
        ];
        steps
            .into_iter()
            .enumerate()
            .map(|(idx, (v, r))| {
                let assessment = agent.assess(v, r, at(idx as i64 * 45));
                serde_json::to_string(&assessment.recommendations).unwrap()
            })
            .collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}

#[test]
fn no_icu_beds_routes_to_transfer_plan() {
    let mut agent = EscalationAgent::new("P001");
    let assessment = agent.assess(
        vitals(Consciousness::Alert, 100, 94, 24, 7, 0),
        resources(0, 0.5),
        at(0),
    );

    let names: Vec<&str> = assessment.recommendations.iter().map(|r| r.action.as_str()).collect();
    assert!(!names.contains(&actions::ICU_TRANSFER));
    assert_eq!(names[0], actions::PREPARE_TRANSFER_PLAN);
    assert_eq!(assessment.intent, Some(Intent::Escalate));
}

#[test]
fn counterfactual_base_case() {
    let result = project(0.1, 60, &[]);
    assert!((result.projected_risk - 0.16).abs() < 1e-9);
    assert!((result.risk_change - 0.06).abs() < 1e-9);
    assert!(result.key_drivers.is_empty());
    assert!(result.summary.contains("baseline physiologic drift"));
}

#[test]
fn counterfactual_saturates_at_one() {
    let result = project(0.9, 200, &["emergent_safety_trigger".to_string()]);
    assert_eq!(result.projected_risk, 1.0);
    assert!((result.risk_change - 0.1).abs() < 1e-9);
    assert!(result.summary.contains("critical saturation"));
}

fn consciousness() -> impl Strategy<Value = Consciousness> {
    prop_oneof![
        Just(Consciousness::Alert),
        Just(Consciousness::Voice),
        Just(Consciousness::Pain),
        Just(Consciousness::Unresponsive),
    ]
}

proptest! {
    #[test]
    fn output_is_bounded_and_never_empty(
        level in consciousness(),
        sbp in 50i32..200,
        spo2 in 70i32..100,
        rr in 5i32..45,
        score in 0u32..=20,
        beds in 0u32..5,
        load in 0.0f64..1.0,
    ) {
        let mut agent = EscalationAgent::new("P001");
        let assessment = agent.assess(
            vitals(level, sbp, spo2, rr, score, 0),
            resources(beds, load),
            at(0),
        );
        prop_assert!(!assessment.recommendations.is_empty());
        prop_assert!(assessment.recommendations.len() <= 3);
        let ranks: Vec<u32> = assessment.recommendations.iter().map(|r| r.rank).collect();
        let expected: Vec<u32> = (1..=ranks.len() as u32).collect();
        prop_assert_eq!(ranks, expected);
    }

    #[test]
    fn icu_transfer_needs_a_bed(score in 0u32..9, load in 0.0f64..1.0) {
        let mut agent = EscalationAgent::new("P001");
        let assessment = agent.assess(
            vitals(Consciousness::Alert, 110, 95, 20, score, 0),
            resources(0, load),
            at(0),
        );
        prop_assert!(assessment.recommendations.iter().all(|r| r.action != actions::ICU_TRANSFER));
        let risk = assessment.normalized_risk;
        let has_plan = assessment
            .recommendations
            .iter()
            .any(|r| r.action == actions::PREPARE_TRANSFER_PLAN);
        prop_assert_eq!(has_plan, risk >= 0.3);
    }

    #[test]
    fn projection_stays_in_range(
        risk in 0.0f64..=1.0,
        short in 0u32..240,
        extra in 0u32..240,
    ) {
        let signals = vec!["Rapid SBP drop".to_string(), "sepsis_alert".to_string()];
        let near = project(risk, short, &signals);
        let far = project(risk, short + extra, &signals);
        prop_assert!(near.projected_risk <= far.projected_risk);
        prop_assert!(far.projected_risk <= 1.0);
        prop_assert!(near.risk_change >= 0.0);
    }
}
