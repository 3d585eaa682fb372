//! Forecast result returned by the orchestrator.

use crate::models::BackendKind;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Why the orchestrator answered with the heuristic fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum FallbackReason {
    /// The series was empty.
    NoData,
    /// Fewer points than a model needs.
    ThinData { points: usize },
    /// A backend could not be trained or failed before the first step.
    ModelUnavailable(String),
}

/// How a forecast was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ForecastMethod {
    /// Every step came from the model.
    Model { backend: BackendKind },
    /// The first `model_steps` came from the model, the rest from the fallback.
    Partial {
        backend: BackendKind,
        model_steps: usize,
    },
    /// Every step came from the fallback.
    Fallback { reason: FallbackReason },
}

impl ForecastMethod {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ForecastMethod::Fallback { .. })
    }

    /// Short label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            ForecastMethod::Model { .. } => "model",
            ForecastMethod::Partial { .. } => "partial",
            ForecastMethod::Fallback { .. } => "fallback",
        }
    }
}

/// A point forecast of fixed horizon together with the path that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    values: Vec<f64>,
    method: ForecastMethod,
}

impl Forecast {
    pub fn new(values: Vec<f64>, method: ForecastMethod) -> Self {
        Self { values, method }
    }

    pub fn fallback(values: Vec<f64>, reason: FallbackReason) -> Self {
        Self::new(values, ForecastMethod::Fallback { reason })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn horizon(&self) -> usize {
        self.values.len()
    }

    pub fn method(&self) -> &ForecastMethod {
        &self.method
    }

    /// Sum of all predicted values.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Pair each step with the calendar day it forecasts, starting the day
    /// after `last_observed`.
    pub fn dated(&self, last_observed: NaiveDate) -> Vec<(NaiveDate, f64)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &v)| (last_observed + Duration::days(i as i64 + 1), v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dated_starts_day_after_last_observation() {
        let forecast = Forecast::new(
            vec![3.0, 4.0],
            ForecastMethod::Model {
                backend: BackendKind::TreeEnsemble,
            },
        );
        let last = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let dated = forecast.dated(last);

        assert_eq!(dated[0].0, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(dated[1].0, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(forecast.total(), 7.0);
    }

    #[test]
    fn method_labels() {
        let fallback = Forecast::fallback(vec![10.0], FallbackReason::NoData);
        assert!(fallback.method().is_fallback());
        assert_eq!(fallback.method().label(), "fallback");

        let partial = ForecastMethod::Partial {
            backend: BackendKind::Linear,
            model_steps: 3,
        };
        assert!(!partial.is_fallback());
        assert_eq!(partial.label(), "partial");
    }

    #[test]
    fn method_serializes_with_tag() {
        let method = ForecastMethod::Fallback {
            reason: FallbackReason::ThinData { points: 4 },
        };
        let json = serde_json::to_string(&method).unwrap();
        assert!(json.contains("\"kind\":\"fallback\""));
        assert!(json.contains("thin_data"));
    }
}
