//! Sliding-window feature construction.

use crate::utils::stats;

/// Summary statistics appended after the raw window: mean, population
/// standard deviation, max, min and linear-trend slope.
pub const SUMMARY_FEATURES: usize = 5;

/// Windows shorter than this get a zero trend feature.
pub const MIN_TREND_POINTS: usize = 3;

/// Width of a feature vector built from a window of `window` observations.
///
/// Training rows and prediction rows both derive their width from this
/// function, so the two can never drift apart.
pub const fn feature_width(window: usize) -> usize {
    window + SUMMARY_FEATURES
}

/// Feature rows with their aligned targets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<Vec<f64>>,
    targets: Vec<f64>,
    window: usize,
}

impl FeatureMatrix {
    /// Number of (row, target) pairs.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// Raw window length the rows were built with.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Number of columns per row.
    pub fn width(&self) -> usize {
        feature_width(self.window)
    }

    /// Column `j` across all rows.
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[j]).collect()
    }
}

/// One feature vector from the raw window that precedes a target.
pub fn feature_row(window_values: &[f64]) -> Vec<f64> {
    let mut row = Vec::with_capacity(feature_width(window_values.len()));
    row.extend_from_slice(window_values);

    row.push(stats::mean(window_values));
    row.push(stats::population_std(window_values));
    row.push(stats::max(window_values));
    row.push(stats::min(window_values));

    let trend = if window_values.len() >= MIN_TREND_POINTS {
        stats::slope(window_values)
    } else {
        0.0
    };
    row.push(trend);

    row
}

/// A feature row widened to `width` columns by appending the window mean.
///
/// Keeps the row width constant when the effective window is shorter than the
/// window a model was trained with.
pub fn padded_row(window_values: &[f64], width: usize) -> Vec<f64> {
    let mut row = feature_row(window_values);
    if row.len() < width {
        let fill = stats::mean(window_values);
        row.resize(width, fill);
    }
    row
}

/// Build feature rows and targets with a sliding window.
///
/// For every index `i` in `window..len`, the row is built from the `window`
/// values ending at `i - 1` and the target is the value at `i`. A series no
/// longer than the window yields an empty matrix, which callers treat as
/// insufficient data.
pub fn build_features(values: &[f64], window: usize) -> FeatureMatrix {
    if window == 0 || values.len() <= window {
        return FeatureMatrix {
            window,
            ..Default::default()
        };
    }

    let n_rows = values.len() - window;
    let mut rows = Vec::with_capacity(n_rows);
    let mut targets = Vec::with_capacity(n_rows);

    for i in window..values.len() {
        rows.push(feature_row(&values[i - window..i]));
        targets.push(values[i]);
    }

    FeatureMatrix {
        rows,
        targets,
        window,
    }
}
