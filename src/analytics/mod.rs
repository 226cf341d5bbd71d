use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use crate::prediction::{self, Prediction, Trend};

/// Categories included in the per-user overall summary
pub const SUMMARY_CATEGORIES: [&str; 6] =
    ["career", "business", "education", "finance", "quiz", "chat"];

/// Trend-aware summary of one category's history
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CategorySummary {
    pub current_score: f64,
    pub average_score: f64,
    pub total_attempts: usize,
    pub trend: Trend,
    pub prediction: Option<Prediction>,
}

/// Overall progress payload: one summary per category with history
pub type OverallProgress = HashMap<String, CategorySummary>;

/// Build one category's summary from its chronological scores
pub fn build_summary(scores: &[f64], prediction: Option<Prediction>) -> CategorySummary {
    let current_score = scores.last().copied().unwrap_or(0.0);
    let average_score = prediction::model::mean(scores);

    CategorySummary {
        current_score,
        average_score,
        total_attempts: scores.len(),
        trend: prediction::trend(scores),
        prediction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_summary_basics() {
        let summary = build_summary(&[40.0, 50.0, 60.0], None);
        assert!((summary.current_score - 60.0).abs() < 1e-9);
        assert!((summary.average_score - 50.0).abs() < 1e-9);
        assert_eq!(summary.total_attempts, 3);
        assert_eq!(summary.trend, Trend::Improving);
        assert!(summary.prediction.is_none());
    }
}
