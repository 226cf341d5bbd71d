pub mod model;
pub mod registry;

use serde::{Serialize, Deserialize};
use crate::error::EngineError;
use crate::prediction::model::{mean, std_dev, BoostedEnsemble, LinearModel, StandardScaler};

/// Coarse performance direction derived from recent scores
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    Neutral,
}

/// Forecast for a user's next score in a category
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Prediction {
    pub predicted_score: f64,
    pub confidence_interval: (f64, f64),
    pub trend: Trend,
    pub message: String,
}

/// Trend over the trailing window: only the last 3 scores matter, and
/// only the oldest and newest of those are compared.
pub fn trend(scores: &[f64]) -> Trend {
    if scores.len() < 2 {
        return Trend::Neutral;
    }
    let recent = &scores[scores.len().saturating_sub(3)..];
    let oldest = recent[0];
    let newest = recent[recent.len() - 1];
    if newest > oldest {
        Trend::Improving
    } else if newest < oldest {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

fn direction(prediction: f64, last_score: f64) -> Trend {
    if prediction > last_score {
        Trend::Improving
    } else if prediction < last_score {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// No history at all
pub fn insufficient_data() -> Prediction {
    Prediction {
        predicted_score: 0.0,
        confidence_interval: (0.0, 0.0),
        trend: Trend::Neutral,
        message: "Insufficient data for prediction".to_string(),
    }
}

/// Degraded result for internal failures; the public API never fails
pub fn unavailable() -> Prediction {
    Prediction {
        predicted_score: 0.0,
        confidence_interval: (0.0, 0.0),
        trend: Trend::Neutral,
        message: "Prediction unavailable".to_string(),
    }
}

/// Tier for histories with fewer than 3 points: plain average with a
/// +/-20% band.
pub fn average_prediction(scores: &[f64]) -> Prediction {
    let avg = mean(scores);
    Prediction {
        predicted_score: clamp_score(avg),
        confidence_interval: (clamp_score(avg * 0.8), clamp_score(avg * 1.2)),
        trend: Trend::Stable,
        message: "Based on limited data".to_string(),
    }
}

/// Tier for a fitted category model: scale the user's latest metric
/// features and predict. The interval is one standard deviation of the
/// user's own score history.
pub fn ensemble_prediction(
    model: &BoostedEnsemble,
    scaler: &StandardScaler,
    features: &[f64],
    scores: &[f64],
) -> Result<Prediction, EngineError> {
    let scaled = scaler.transform_row(features)?;
    let raw = model.predict(&scaled);

    let sigma = std_dev(scores);
    let last = scores.last().copied().unwrap_or(0.0);

    Ok(Prediction {
        predicted_score: clamp_score(raw),
        confidence_interval: (clamp_score(raw - sigma), clamp_score(raw + sigma)),
        trend: direction(raw, last),
        message: format!("Model prediction based on {} data points", scores.len()),
    })
}

/// Fallback tier: chronological linear regression on the user's own
/// score history with a 95% residual interval.
pub fn regression_prediction(scores: &[f64], steps_ahead: u32) -> Prediction {
    if scores.is_empty() {
        return insufficient_data();
    }

    let model = LinearModel::fit_chronological(scores);
    let next_index = (scores.len() - 1) as f64 + steps_ahead as f64;
    let raw = model.predict(next_index);

    let sigma = model.chronological_residual_std(scores);
    let last = scores[scores.len() - 1];

    Prediction {
        predicted_score: clamp_score(raw),
        confidence_interval: (
            clamp_score(raw - 1.96 * sigma),
            clamp_score(raw + 1.96 * sigma),
        ),
        trend: direction(raw, last),
        message: format!("Linear regression based on {} data points", scores.len()),
    }
}
