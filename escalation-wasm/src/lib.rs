//! Framework-neutral WASM <-> JavaScript bridge.

use chrono::Utc;
use escalation_core::{EscalationConfig, EscalationError};
use escalation_engine::{AssessmentInput, EscalationAgent};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

/// Partial config from JavaScript; absent fields keep their defaults.
#[derive(Debug, Default, Deserialize)]
struct JsEscalationConfig {
    #[serde(default)]
    transfer_plan_risk_threshold: Option<f64>,
    #[serde(default)]
    overdue_review_minutes: Option<u32>,
    #[serde(default)]
    default_projection_delay_minutes: Option<u32>,
    #[serde(default)]
    max_recommendations: Option<usize>,
    #[serde(default)]
    annotate_emergent: Option<bool>,
    #[serde(default)]
    append_ranked_on_emergent: Option<bool>,
}

impl From<JsEscalationConfig> for EscalationConfig {
    fn from(cfg: JsEscalationConfig) -> Self {
        let mut base = EscalationConfig::default();
        if let Some(threshold) = cfg.transfer_plan_risk_threshold {
            base.transfer_plan_risk_threshold = threshold;
        }
        if let Some(minutes) = cfg.overdue_review_minutes {
            base.overdue_review_minutes = minutes;
        }
        if let Some(minutes) = cfg.default_projection_delay_minutes {
            base.default_projection_delay_minutes = minutes;
        }
        if let Some(cap) = cfg.max_recommendations {
            base.max_recommendations = cap;
        }
        if let Some(flag) = cfg.annotate_emergent {
            base.annotate_emergent = flag;
        }
        if let Some(flag) = cfg.append_ranked_on_emergent {
            base.append_ranked_on_emergent = flag;
        }
        base
    }
}

/// One patient's decision-support session, kept alive on the JavaScript side.
#[wasm_bindgen]
pub struct EscalationSession {
    agent: EscalationAgent,
}

#[wasm_bindgen]
impl EscalationSession {
    #[wasm_bindgen(constructor)]
    pub fn new(patient_id: String, config: Option<JsValue>) -> Result<EscalationSession, JsValue> {
        #[cfg(target_arch = "wasm32")]
        console_error_panic_hook::set_once();

        let cfg = read_config(config)?;
        Ok(Self {
            agent: EscalationAgent::with_config(patient_id, cfg),
        })
    }

    #[wasm_bindgen(getter, js_name = patientId)]
    pub fn patient_id(&self) -> String {
        self.agent.patient_id().to_string()
    }

    /// Run one cycle on `{vitals, resources}` and return the full assessment.
    pub fn assess(&mut self, request: JsValue) -> Result<JsValue, JsValue> {
        let now = Utc::now();
        let (vitals, resources) = read_request(request)?
            .into_snapshots(now)
            .map_err(|err| JsValue::from_str(&format_escalation_error(err)))?;

        let assessment = self.agent.assess(vitals, resources, now);
        to_value(&assessment)
            .map_err(|err| JsValue::from_str(&format!("Could not serialize assessment: {err}")))
    }

    /// Number of archived snapshots behind the current one.
    #[wasm_bindgen(js_name = historyLength)]
    pub fn history_length(&self) -> usize {
        self.agent.belief().map_or(0, |belief| belief.history().len())
    }
}

/// Stateless assessment: ranked recommendations for a patient with no history.
#[wasm_bindgen]
pub fn recommend(request: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let cfg = read_config(config)?;
    let request = from_value::<serde_json::Value>(request)
        .map_err(|err| JsValue::from_str(&format!("Could not read request JSON: {err}")))?;

    let now = Utc::now();
    let (vitals, resources) = AssessmentInput::from_json_value(&request)
        .and_then(|input| input.into_snapshots(now))
        .map_err(|err| JsValue::from_str(&format_escalation_error(err)))?;

    let mut agent = EscalationAgent::with_config("anonymous", cfg);
    let assessment = agent.assess(vitals, resources, now);
    to_value(&assessment.recommendations)
        .map_err(|err| JsValue::from_str(&format!("Could not serialize recommendations: {err}")))
}

fn read_config(config: Option<JsValue>) -> Result<EscalationConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsEscalationConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Could not read config: {err}")))?;
            Ok(EscalationConfig::from(cfg))
        }
        _ => Ok(EscalationConfig::default()),
    }
}

fn read_request(request: JsValue) -> Result<AssessmentInput, JsValue> {
    let value = from_value::<serde_json::Value>(request)
        .map_err(|err| JsValue::from_str(&format!("Could not read request JSON: {err}")))?;
    AssessmentInput::from_json_value(&value)
        .map_err(|err| JsValue::from_str(&format_escalation_error(err)))
}

fn format_escalation_error(err: EscalationError) -> String {
    format!("Escalation error: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let js: JsEscalationConfig =
            serde_json::from_str(r#"{"annotate_emergent": true, "max_recommendations": 2}"#).unwrap();
        let cfg = EscalationConfig::from(js);
        assert!(cfg.annotate_emergent);
        assert_eq!(cfg.max_recommendations, 2);
        assert_eq!(cfg.transfer_plan_risk_threshold, 0.6);
        assert_eq!(cfg.overdue_review_minutes, 60);
    }

    #[test]
    fn empty_config_is_default() {
        assert_eq!(EscalationConfig::from(JsEscalationConfig::default()), EscalationConfig::default());
    }
}
