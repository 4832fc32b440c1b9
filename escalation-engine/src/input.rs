//! Loosely-typed assessment input, filled with clinical defaults before it
//! reaches the pipeline.

use chrono::{DateTime, Utc};
use escalation_core::{
    Consciousness, EscalationError, ResourceSnapshot, VitalsSnapshot, MAX_WARNING_SCORE,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Vitals as received from a caller; every field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VitalsInput {
    #[serde(alias = "AVPU", alias = "avpu")]
    pub consciousness: Option<String>,
    #[serde(alias = "SBP", alias = "sbp")]
    pub systolic_bp: Option<i32>,
    #[serde(alias = "SpO2")]
    pub spo2: Option<i32>,
    #[serde(alias = "RR", alias = "rr")]
    pub respiratory_rate: Option<i32>,
    #[serde(alias = "HR", alias = "hr")]
    pub heart_rate: Option<i32>,
    #[serde(alias = "temp")]
    pub temperature: Option<f64>,
    #[serde(alias = "NEWS2", alias = "news2")]
    pub early_warning_score: Option<u32>,
    #[serde(alias = "timestamp")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl VitalsInput {
    /// Build a snapshot, stamping it with `now` when no timestamp was given.
    pub fn into_snapshot(self, now: DateTime<Utc>) -> Result<VitalsSnapshot, EscalationError> {
        let base = VitalsSnapshot::baseline(self.recorded_at.unwrap_or(now));

        let missing: Vec<&str> = [
            ("consciousness", self.consciousness.is_none()),
            ("systolic_bp", self.systolic_bp.is_none()),
            ("spo2", self.spo2.is_none()),
            ("respiratory_rate", self.respiratory_rate.is_none()),
            ("early_warning_score", self.early_warning_score.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();
        if !missing.is_empty() {
            log::warn!("vitals missing {}; using defaults", missing.join(", "));
        }

        let consciousness = match self.consciousness.as_deref() {
            Some(text) => text.parse::<Consciousness>()?,
            None => base.consciousness,
        };
        let early_warning_score = self.early_warning_score.unwrap_or(base.early_warning_score);
        if early_warning_score > MAX_WARNING_SCORE {
            return Err(EscalationError::InvalidInput(format!(
                "early warning score {early_warning_score} exceeds {MAX_WARNING_SCORE}"
            )));
        }

        let temperature = self.temperature.unwrap_or(base.temperature);
        if !temperature.is_finite() {
            return Err(EscalationError::InvalidInput(format!(
                "temperature {temperature} is not a number"
            )));
        }

        Ok(VitalsSnapshot {
            consciousness,
            systolic_bp: in_range(
                "systolic_bp",
                self.systolic_bp.unwrap_or(base.systolic_bp),
                0,
                MAX_SYSTOLIC_BP,
            )?,
            spo2: in_range("spo2", self.spo2.unwrap_or(base.spo2), 0, 100)?,
            respiratory_rate: in_range(
                "respiratory_rate",
                self.respiratory_rate.unwrap_or(base.respiratory_rate),
                0,
                MAX_RESPIRATORY_RATE,
            )?,
            heart_rate: in_range(
                "heart_rate",
                self.heart_rate.unwrap_or(base.heart_rate),
                0,
                MAX_HEART_RATE,
            )?,
            temperature,
            early_warning_score,
            recorded_at: base.recorded_at,
        })
    }
}

/// Upper bounds on physiologically possible readings.
const MAX_SYSTOLIC_BP: i32 = 400;
const MAX_RESPIRATORY_RATE: i32 = 120;
const MAX_HEART_RATE: i32 = 400;

fn in_range(field: &str, value: i32, min: i32, max: i32) -> Result<i32, EscalationError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(EscalationError::InvalidInput(format!(
            "{field} {value} outside {min}..={max}"
        )))
    }
}

/// Resource state as received from a caller; every field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResourceInput {
    pub icu_beds_available: Option<u32>,
    pub rrt_available: Option<bool>,
    pub nurse_load: Option<f64>,
    #[serde(alias = "transport_delay")]
    pub transport_delay_minutes: Option<u32>,
    pub specialist_available: Option<bool>,
}

impl ResourceInput {
    pub fn into_snapshot(self) -> ResourceSnapshot {
        let base = ResourceSnapshot::default();
        if self.icu_beds_available.is_none() {
            log::warn!("ICU bed count missing; assuming {}", base.icu_beds_available);
        }
        ResourceSnapshot {
            icu_beds_available: self.icu_beds_available.unwrap_or(base.icu_beds_available),
            rrt_available: self.rrt_available.unwrap_or(base.rrt_available),
            nurse_load: self.nurse_load.unwrap_or(base.nurse_load),
            transport_delay_minutes: self
                .transport_delay_minutes
                .unwrap_or(base.transport_delay_minutes),
            specialist_available: self.specialist_available.unwrap_or(base.specialist_available),
        }
    }
}

/// One assessment request: vitals plus resource state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssessmentInput {
    #[serde(alias = "patient")]
    pub vitals: VitalsInput,
    #[serde(alias = "resource_state")]
    pub resources: ResourceInput,
}

impl AssessmentInput {
    /// Parse an assessment request from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, EscalationError> {
        let value: Value =
            serde_json::from_str(json).map_err(|err| EscalationError::Parse(err.to_string()))?;
        Self::from_json_value(&value)
    }

    /// Parse an assessment request from a `serde_json::Value`.
    pub fn from_json_value(value: &Value) -> Result<Self, EscalationError> {
        if !value.is_object() {
            return Err(EscalationError::MissingData);
        }
        Self::deserialize(value).map_err(|err| EscalationError::Parse(err.to_string()))
    }

    pub fn into_snapshots(
        self,
        now: DateTime<Utc>,
    ) -> Result<(VitalsSnapshot, ResourceSnapshot), EscalationError> {
        Ok((self.vitals.into_snapshot(now)?, self.resources.into_snapshot()))
    }
}
