use serde::{Serialize, Deserialize};
use crate::error::EngineError;

/// Mean of a slice, 0.0 when empty
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation, 0.0 when empty
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Per-column standardization (zero mean, unit variance) fitted on a
/// training batch. Columns with zero spread pass through unscaled.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    /// Fit column statistics on a rectangular batch of rows
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut means = Vec::with_capacity(cols);
        let mut stds = Vec::with_capacity(cols);

        for col in 0..cols {
            let column: Vec<f64> = rows.iter().filter_map(|r| r.get(col).copied()).collect();
            let m = mean(&column);
            let s = std_dev(&column);
            means.push(m);
            stds.push(if s > f64::EPSILON { s } else { 1.0 });
        }

        StandardScaler { means, stds }
    }

    /// Number of columns the scaler was fitted on
    pub fn dim(&self) -> usize {
        self.means.len()
    }

    /// Scale a single row; the row must match the fitted dimension
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, EngineError> {
        if row.len() != self.dim() {
            return Err(EngineError::new(
                format!(
                    "Feature dimension mismatch: got {}, scaler fitted on {}",
                    row.len(),
                    self.dim()
                ),
                "scaler",
            ));
        }
        Ok(row
            .iter()
            .zip(self.means.iter().zip(self.stds.iter()))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    /// Scale the training batch itself
    pub fn transform_batch(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter()
            .filter_map(|row| self.transform_row(row).ok())
            .collect()
    }
}

/// Single-feature least-squares line, used for chronological
/// index -> score regression.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LinearModel {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearModel {
    /// Fit on paired samples. Zero x-spread degrades to a flat line at
    /// the mean of y.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Self {
        let n = xs.len().min(ys.len());
        if n == 0 {
            return LinearModel { slope: 0.0, intercept: 0.0 };
        }
        let xs = &xs[..n];
        let ys = &ys[..n];

        let x_mean = mean(xs);
        let y_mean = mean(ys);

        let mut cov = 0.0;
        let mut var = 0.0;
        for (x, y) in xs.iter().zip(ys.iter()) {
            cov += (x - x_mean) * (y - y_mean);
            var += (x - x_mean) * (x - x_mean);
        }

        if var < f64::EPSILON {
            return LinearModel { slope: 0.0, intercept: y_mean };
        }

        let slope = cov / var;
        LinearModel {
            slope,
            intercept: y_mean - slope * x_mean,
        }
    }

    /// Fit on (0, 1, 2, ...) -> score
    pub fn fit_chronological(scores: &[f64]) -> Self {
        let xs: Vec<f64> = (0..scores.len()).map(|i| i as f64).collect();
        Self::fit(&xs, scores)
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Population std of the residuals of a chronological fit
    pub fn chronological_residual_std(&self, scores: &[f64]) -> f64 {
        let residuals: Vec<f64> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| s - self.predict(i as f64))
            .collect();
        std_dev(&residuals)
    }
}

/// One depth-1 regression tree: a single feature/threshold split with a
/// constant value on each side.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegressionStump {
    feature: usize,
    threshold: f64,
    left: f64,
    right: f64,
}

impl RegressionStump {
    fn eval(&self, row: &[f64]) -> f64 {
        let value = row.get(self.feature).copied().unwrap_or(0.0);
        if value <= self.threshold {
            self.left
        } else {
            self.right
        }
    }
}

/// Deterministic gradient-boosted stump ensemble for multi-feature
/// regression. Each round fits the best squared-error split on the
/// current residuals.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BoostedEnsemble {
    base: f64,
    learning_rate: f64,
    stumps: Vec<RegressionStump>,
}

impl BoostedEnsemble {
    const ROUNDS: usize = 100;
    const LEARNING_RATE: f64 = 0.1;

    /// Fit on scaled feature rows against the target column
    pub fn fit(rows: &[Vec<f64>], targets: &[f64]) -> Self {
        let base = mean(targets);
        let mut residuals: Vec<f64> = targets.iter().map(|t| t - base).collect();
        let mut stumps = Vec::new();

        for _ in 0..Self::ROUNDS {
            let stump = match best_stump(rows, &residuals) {
                Some(stump) => stump,
                None => break,
            };
            for (i, row) in rows.iter().enumerate() {
                residuals[i] -= Self::LEARNING_RATE * stump.eval(row);
            }
            stumps.push(stump);
        }

        BoostedEnsemble {
            base,
            learning_rate: Self::LEARNING_RATE,
            stumps,
        }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let boost: f64 = self.stumps.iter().map(|s| s.eval(row)).sum();
        self.base + self.learning_rate * boost
    }
}

/// Best single split over all features by squared error, None when no
/// feature has two distinct values.
fn best_stump(rows: &[Vec<f64>], residuals: &[f64]) -> Option<RegressionStump> {
    let cols = rows.first().map(|r| r.len()).unwrap_or(0);
    let mut best: Option<(f64, RegressionStump)> = None;

    for feature in 0..cols {
        let mut samples: Vec<(f64, f64)> = rows
            .iter()
            .zip(residuals.iter())
            .filter_map(|(row, r)| row.get(feature).map(|v| (*v, *r)))
            .collect();
        samples.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        for i in 0..samples.len().saturating_sub(1) {
            let (lo, hi) = (samples[i].0, samples[i + 1].0);
            if (hi - lo).abs() < f64::EPSILON {
                continue;
            }
            let threshold = (lo + hi) / 2.0;

            let left: Vec<f64> = samples
                .iter()
                .filter(|(v, _)| *v <= threshold)
                .map(|(_, r)| *r)
                .collect();
            let right: Vec<f64> = samples
                .iter()
                .filter(|(v, _)| *v > threshold)
                .map(|(_, r)| *r)
                .collect();
            if left.is_empty() || right.is_empty() {
                continue;
            }

            let left_mean = mean(&left);
            let right_mean = mean(&right);
            let sse: f64 = left.iter().map(|r| (r - left_mean) * (r - left_mean)).sum::<f64>()
                + right.iter().map(|r| (r - right_mean) * (r - right_mean)).sum::<f64>();

            let candidate = RegressionStump {
                feature,
                threshold,
                left: left_mean,
                right: right_mean,
            };
            match &best {
                Some((best_sse, _)) if sse >= *best_sse => {}
                _ => best = Some((sse, candidate)),
            }
        }
    }

    best.map(|(_, stump)| stump)
}
