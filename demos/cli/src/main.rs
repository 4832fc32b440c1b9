use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use escalation_core::Intent;
use escalation_engine::{Assessment, CycleOutcome, Scenario};

#[derive(Parser, Debug)]
#[command(
    name = "escalation-cli",
    about = "Replay a patient scenario through the escalation pipeline."
)]
struct Args {
    /// Path to the scenario JSON file.
    #[arg(short, long)]
    input: PathBuf,

    /// Print the full assessments as JSON instead of a summary.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args = Args::parse();
    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Could not read file {:?}", args.input))?;

    let scenario = Scenario::from_json_str(&data)
        .with_context(|| format!("Invalid scenario in {:?}", args.input))?;
    log::info!("replaying {} steps for {}", scenario.steps.len(), scenario.patient_id);

    let assessments = scenario.run(Utc::now())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&assessments)?);
        return Ok(());
    }

    for (idx, (step, assessment)) in scenario.steps.iter().zip(&assessments).enumerate() {
        let label = step.label.as_deref().unwrap_or("unlabelled");
        println!("Step {}: {label}", idx + 1);
        print_assessment(assessment);
        println!();
    }

    Ok(())
}

fn print_assessment(assessment: &Assessment) {
    let decision = match (assessment.outcome, assessment.intent) {
        (CycleOutcome::Emergent, _) => "EMERGENT".to_string(),
        (_, Some(Intent::Monitor)) => {
            let check_in = assessment
                .recommendations
                .first()
                .and_then(|rec| rec.next_check_in_minutes)
                .map_or_else(String::new, |minutes| format!(", check in {minutes} min"));
            format!("monitor{check_in}")
        }
        (_, Some(Intent::Escalate)) => "escalate".to_string(),
        (_, None) => "no action".to_string(),
    };
    println!(
        "  Assessed at: {}\n  Risk: {:.2}\n  Decision: {decision}",
        assessment.assessed_at, assessment.normalized_risk
    );

    for rec in &assessment.recommendations {
        println!("  #{} {} (confidence {})", rec.rank, rec.action, rec.confidence);
    }
    println!("  {}", assessment.tradeoff_summary);

    if let Some(top) = assessment.recommendations.first() {
        if let Some(cf) = &top.counterfactual {
            println!("  Counterfactual: {}", cf.summary);
        }
        for line in top.memory_narrative.iter().flatten() {
            println!("  Change: {line}");
        }
    }
}
