//! End-to-end scenarios for the forecast orchestrator and its model cache.

use approx::assert_relative_eq;
use demand_forecast::cache::ModelCache;
use demand_forecast::config::{EngineConfig, ModelConfig};
use demand_forecast::core::{FallbackReason, ForecastMethod};
use demand_forecast::models::{fallback, BackendKind};
use demand_forecast::Orchestrator;
use std::sync::Arc;

const TRENDING: [f64; 20] = [
    10.0, 12.0, 11.0, 13.0, 12.0, 14.0, 13.0, 15.0, 14.0, 16.0, 15.0, 17.0, 16.0, 18.0, 17.0,
    19.0, 18.0, 20.0, 19.0, 21.0,
];

#[test]
fn empty_series_returns_default_week() {
    let forecast =
        Orchestrator::default().forecast("general_sales", &[], 7, BackendKind::TreeEnsemble);
    assert_eq!(forecast.values(), &[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0]);
}

#[test]
fn trending_series_uses_trained_model() {
    let orchestrator = Orchestrator::default();
    let forecast = orchestrator.forecast("general_sales", &TRENDING, 7, BackendKind::TreeEnsemble);

    assert_eq!(
        forecast.method(),
        &ForecastMethod::Model {
            backend: BackendKind::TreeEnsemble
        }
    );
    assert_eq!(forecast.horizon(), 7);
    assert!(forecast.values().iter().all(|&v| v >= 1.0));

    // trees cannot extrapolate past the training targets
    let lowest_target = TRENDING[7..].iter().copied().fold(f64::INFINITY, f64::min);
    let highest_target = TRENDING[7..].iter().copied().fold(f64::NEG_INFINITY, f64::max);
    for &v in forecast.values() {
        assert!(v >= lowest_target && v <= highest_target);
    }

    let entry = orchestrator.models().get("general_sales").unwrap();
    assert_eq!(entry.training_rows(), 13);
}

#[test]
fn linear_backend_uses_trained_model() {
    let forecast =
        Orchestrator::default().forecast("general_sales", &TRENDING, 7, BackendKind::Linear);
    assert_eq!(
        forecast.method(),
        &ForecastMethod::Model {
            backend: BackendKind::Linear
        }
    );
    assert!(forecast.values().iter().all(|&v| v.is_finite() && v >= 1.0));
}

#[test]
fn constant_series_forecast_stays_near_constant() {
    for c in [1.0, 5.0, 42.0] {
        let values = vec![c; 25];
        let forecast =
            Orchestrator::default().forecast("flat", &values, 7, BackendKind::TreeEnsemble);
        for &v in forecast.values() {
            assert_relative_eq!(v, c.max(1.0), epsilon = 1e-9);
        }
    }
}

#[test]
fn short_series_equals_fallback() {
    for n in 0..10 {
        let values: Vec<f64> = (0..n).map(|i| 3.0 + i as f64).collect();
        let forecast =
            Orchestrator::default().forecast("short", &values, 7, BackendKind::TreeEnsemble);
        assert_eq!(forecast.values(), fallback(&values, 7).as_slice());
        assert!(forecast.method().is_fallback());
    }
}

#[test]
fn get_or_train_is_idempotent() {
    let cache = ModelCache::new();
    let config = ModelConfig::default();
    let first = cache
        .get_or_train("product_42", &TRENDING, BackendKind::TreeEnsemble, &config)
        .unwrap();
    let second = cache
        .get_or_train("product_42", &TRENDING, BackendKind::TreeEnsemble, &config)
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn repeated_forecasts_reuse_the_model() {
    let orchestrator = Orchestrator::default();
    let a = orchestrator.forecast("product_9", &TRENDING, 7, BackendKind::TreeEnsemble);
    let trained = orchestrator.models().get("product_9").unwrap();
    let b = orchestrator.forecast("product_9", &TRENDING, 7, BackendKind::TreeEnsemble);

    assert_eq!(a, b);
    assert!(Arc::ptr_eq(&trained, &orchestrator.models().get("product_9").unwrap()));
}

#[test]
fn concurrent_requests_leave_one_entry() {
    let orchestrator = Orchestrator::default();

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                s.spawn(|| {
                    orchestrator.forecast("product_7", &TRENDING, 7, BackendKind::TreeEnsemble)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for forecast in &results {
        assert_eq!(forecast.horizon(), 7);
        assert!(!forecast.method().is_fallback());
    }
    // fixed seed: both trainings produce the same model
    assert_eq!(results[0], results[1]);
    assert_eq!(orchestrator.models().keys(), vec!["product_7".to_string()]);
}

#[test]
fn predictions_feed_back_into_the_window() {
    // A step-up at the end: with feedback, each prediction joins the rolling
    // window, so later steps are computed from earlier predictions rather
    // than from observed data.
    let mut values = vec![10.0; 20];
    values.extend([30.0, 30.0, 30.0]);

    let orchestrator = Orchestrator::default();
    let forecast = orchestrator.forecast("step", &values, 10, BackendKind::TreeEnsemble);
    assert!(!forecast.method().is_fallback());

    let entry = orchestrator.models().get("step").unwrap();
    let mut window: Vec<f64> = values[values.len() - 7..].to_vec();
    for &predicted in forecast.values() {
        let row = demand_forecast::features::padded_row(&window, entry.width());
        let scaled = entry.scaler().transform(&row).unwrap();
        let expected = entry.model().predict_next(&scaled).unwrap().max(1.0);
        assert_relative_eq!(predicted, expected, epsilon = 1e-12);
        window.remove(0);
        window.push(predicted);
    }
}

#[test]
fn between_thresholds_reports_thin_data() {
    let values: Vec<f64> = (0..12).map(|i| 20.0 + i as f64).collect();
    let forecast =
        Orchestrator::default().forecast("product_1", &values, 7, BackendKind::TreeEnsemble);
    assert_eq!(
        forecast.method(),
        &ForecastMethod::Fallback {
            reason: FallbackReason::ThinData { points: 12 }
        }
    );
}

#[test]
fn custom_horizon_and_window() {
    let mut config = EngineConfig::default();
    config.model.window = 3;
    config.model.min_training_points = 8;
    let orchestrator = Orchestrator::new(config);

    let forecast =
        orchestrator.forecast("short_window", &TRENDING[..12], 14, BackendKind::TreeEnsemble);
    assert_eq!(forecast.horizon(), 14);
    assert!(!forecast.method().is_fallback());
    assert_eq!(orchestrator.models().get("short_window").unwrap().width(), 8);
}
