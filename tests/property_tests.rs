//! Property-based tests for the feature builder, fallback and orchestrator.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated demand histories.

use demand_forecast::features::{build_features, feature_width};
use demand_forecast::models::{fallback, BackendKind};
use demand_forecast::Orchestrator;
use proptest::prelude::*;

/// Strategy for generating non-negative daily quantities.
fn demand_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| prop::collection::vec(0.0..500.0_f64, len))
}

/// Strategy for generating demand with an upward or downward trend.
fn trending_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        (20.0..200.0_f64, -1.0..2.0_f64).prop_map(move |(base, slope)| {
            (0..len)
                .map(|i| (base + slope * i as f64 + (i % 3) as f64).max(0.0))
                .collect()
        })
    })
}

// =============================================================================
// Property: Feature builder shape
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn feature_rows_match_series_length(
        values in demand_strategy(0, 80),
        window in 1usize..12
    ) {
        let matrix = build_features(&values, window);
        prop_assert_eq!(matrix.len(), values.len().saturating_sub(window));
        for (k, row) in matrix.rows().iter().enumerate() {
            prop_assert_eq!(row.len(), feature_width(window));
            prop_assert_eq!(matrix.targets()[k], values[k + window]);
        }
    }
}

// =============================================================================
// Property: Fallback length and floor
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn fallback_has_horizon_length_and_floor(
        values in demand_strategy(0, 60),
        horizon in 0usize..30
    ) {
        let forecast = fallback(&values, horizon);
        prop_assert_eq!(forecast.len(), horizon);
        for v in forecast {
            prop_assert!(v.is_finite());
            prop_assert!(v >= 1.0);
        }
    }
}

// =============================================================================
// Property: Orchestrator always answers with the requested horizon
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn orchestrator_returns_full_horizon(
        values in trending_strategy(0, 70),
        horizon in 1usize..15
    ) {
        let orchestrator = Orchestrator::default();
        for kind in [
            BackendKind::TreeEnsemble,
            BackendKind::Linear,
            BackendKind::Arima,
            BackendKind::AdditiveDecomposition,
        ] {
            let forecast = orchestrator.forecast("prop", &values, horizon, kind);
            prop_assert_eq!(forecast.horizon(), horizon);
            prop_assert!(forecast.values().iter().all(|&v| v.is_finite() && v >= 1.0));
        }
    }

    #[test]
    fn thin_series_equals_fallback(
        values in demand_strategy(0, 10),
        horizon in 1usize..15
    ) {
        let forecast =
            Orchestrator::default().forecast("thin", &values, horizon, BackendKind::TreeEnsemble);
        let expected = fallback(&values, horizon);
        prop_assert!(forecast.method().is_fallback());
        prop_assert_eq!(forecast.values(), expected.as_slice());
    }
}
