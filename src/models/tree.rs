//! Bagged regression trees.
//!
//! Shallow trees, few estimators, one thread and a fixed seed: training over
//! a bounded recent window stays well under a second and two fits on the same
//! data produce the same model.

use crate::config::EnsembleConfig;
use crate::error::{ForecastError, Result};
use crate::models::traits::{FeatureRegressor, MIN_TRAINING_ROWS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Nodes with fewer samples than this become leaves.
const MIN_SAMPLES_SPLIT: usize = 2;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, row: &[f64]) -> f64 {
        match self {
            Node::Leaf(value) => *value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 0,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// A single CART regression tree split on squared-error reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    max_depth: usize,
    root: Option<Node>,
}

impl RegressionTree {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            root: None,
        }
    }

    /// Fit the tree on the rows selected by `sample` (indices may repeat).
    pub fn fit_sample(&mut self, rows: &[Vec<f64>], targets: &[f64], sample: &[usize]) {
        self.root = if sample.is_empty() {
            None
        } else {
            Some(self.grow(rows, targets, sample, 0))
        };
    }

    pub fn predict(&self, row: &[f64]) -> Option<f64> {
        self.root.as_ref().map(|node| node.predict(row))
    }

    /// Depth of the fitted tree (0 for a single leaf).
    pub fn depth(&self) -> usize {
        self.root.as_ref().map(Node::depth).unwrap_or(0)
    }

    fn grow(&self, rows: &[Vec<f64>], targets: &[f64], sample: &[usize], depth: usize) -> Node {
        let n = sample.len() as f64;
        let sum: f64 = sample.iter().map(|&i| targets[i]).sum();
        let leaf_value = sum / n;

        if depth >= self.max_depth || sample.len() < MIN_SAMPLES_SPLIT {
            return Node::Leaf(leaf_value);
        }

        let parent_sse: f64 = sample
            .iter()
            .map(|&i| (targets[i] - leaf_value).powi(2))
            .sum();
        if parent_sse < 1e-12 {
            return Node::Leaf(leaf_value);
        }

        match best_split(rows, targets, sample) {
            Some((feature, threshold, sse)) if sse < parent_sse - 1e-12 => {
                let (left, right): (Vec<usize>, Vec<usize>) = sample
                    .iter()
                    .partition(|&&i| rows[i][feature] <= threshold);
                Node::Split {
                    feature,
                    threshold,
                    left: Box::new(self.grow(rows, targets, &left, depth + 1)),
                    right: Box::new(self.grow(rows, targets, &right, depth + 1)),
                }
            }
            _ => Node::Leaf(leaf_value),
        }
    }
}

/// Best (feature, threshold, children sse) over every feature and every
/// midpoint between distinct sorted values.
fn best_split(rows: &[Vec<f64>], targets: &[f64], sample: &[usize]) -> Option<(usize, f64, f64)> {
    let width = rows[sample[0]].len();
    let n = sample.len();
    let mut best: Option<(usize, f64, f64)> = None;

    for feature in 0..width {
        let mut pairs: Vec<(f64, f64)> = sample
            .iter()
            .map(|&i| (rows[i][feature], targets[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let total_sum: f64 = pairs.iter().map(|p| p.1).sum();
        let total_sq: f64 = pairs.iter().map(|p| p.1 * p.1).sum();

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 1..n {
            let y = pairs[k - 1].1;
            left_sum += y;
            left_sq += y * y;

            if pairs[k].0 <= pairs[k - 1].0 {
                continue;
            }

            let nl = k as f64;
            let nr = (n - k) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse =
                (left_sq - left_sum * left_sum / nl) + (right_sq - right_sum * right_sum / nr);

            if best.map_or(true, |(_, _, b)| sse < b) {
                let threshold = (pairs[k - 1].0 + pairs[k].0) / 2.0;
                best = Some((feature, threshold, sse));
            }
        }
    }

    best
}

/// Bootstrap-aggregated regression trees.
///
/// # Example
///
/// ```
/// use demand_forecast::models::{FeatureRegressor, TreeEnsemble};
///
/// let rows: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64]).collect();
/// let targets: Vec<f64> = (0..8).map(|i| 2.0 * i as f64).collect();
///
/// let mut model = TreeEnsemble::default();
/// model.fit(&rows, &targets).unwrap();
/// let prediction = model.predict_next(&[3.0]).unwrap();
/// assert!(prediction >= 0.0 && prediction <= 14.0);
/// ```
#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    config: EnsembleConfig,
    trees: Vec<RegressionTree>,
    width: usize,
}

impl TreeEnsemble {
    pub fn new(config: EnsembleConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            width: 0,
        }
    }

    pub fn config(&self) -> EnsembleConfig {
        self.config
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

impl Default for TreeEnsemble {
    fn default() -> Self {
        Self::new(EnsembleConfig::default())
    }
}

impl FeatureRegressor for TreeEnsemble {
    fn fit(&mut self, rows: &[Vec<f64>], targets: &[f64]) -> Result<()> {
        validate_training_set(rows, targets)?;

        let n = rows.len();
        let width = rows[0].len();
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let mut trees = Vec::with_capacity(self.config.n_estimators);
        for _ in 0..self.config.n_estimators {
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let mut tree = RegressionTree::new(self.config.max_depth);
            tree.fit_sample(rows, targets, &sample);
            trees.push(tree);
        }

        self.trees = trees;
        self.width = width;
        Ok(())
    }

    fn predict_next(&self, row: &[f64]) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(ForecastError::FitRequired);
        }
        if row.len() != self.width {
            return Err(ForecastError::DimensionMismatch {
                expected: self.width,
                got: row.len(),
            });
        }

        let predictions: Vec<f64> = self.trees.iter().filter_map(|t| t.predict(row)).collect();
        if predictions.is_empty() {
            return Err(ForecastError::ModelUnavailable(
                "ensemble has no fitted trees".into(),
            ));
        }

        let value = predictions.iter().sum::<f64>() / predictions.len() as f64;
        if !value.is_finite() {
            return Err(ForecastError::ModelUnavailable(format!(
                "non-finite prediction {}",
                value
            )));
        }
        Ok(value)
    }

    fn name(&self) -> &str {
        "TreeEnsemble"
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

/// Shared checks for feature-based training sets.
pub(crate) fn validate_training_set(rows: &[Vec<f64>], targets: &[f64]) -> Result<()> {
    if rows.len() < MIN_TRAINING_ROWS {
        return Err(ForecastError::InsufficientData {
            needed: MIN_TRAINING_ROWS,
            got: rows.len(),
        });
    }
    if rows.len() != targets.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: rows.len(),
            got: targets.len(),
        });
    }

    let width = rows[0].len();
    if width == 0 {
        return Err(ForecastError::InvalidParameter(
            "feature rows must not be empty".into(),
        ));
    }
    if let Some(row) = rows.iter().find(|r| r.len() != width) {
        return Err(ForecastError::DimensionMismatch {
            expected: width,
            got: row.len(),
        });
    }
    if rows.iter().flatten().chain(targets).any(|v| !v.is_finite()) {
        return Err(ForecastError::InvalidParameter(
            "training data contains non-finite values".into(),
        ));
    }
    Ok(())
}
