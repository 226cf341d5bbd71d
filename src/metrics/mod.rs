use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use crate::error::EngineError;
use crate::storage;

/// The four categories with dedicated metric tables
pub const KNOWN_CATEGORIES: [&str; 4] = ["career", "business", "education", "finance"];

/// Fixed column order per category. The last column is the regression
/// target; the columns before it are the model features.
pub fn field_names(category: &str) -> Option<&'static [&'static str]> {
    match category {
        "career" => Some(&[
            "interview_score",
            "skill_assessment",
            "career_goal_progress",
            "resume_quality",
            "networking_score",
        ]),
        "business" => Some(&[
            "business_plan_score",
            "market_analysis_score",
            "financial_projection_score",
            "pitch_quality",
            "strategy_score",
        ]),
        "education" => Some(&[
            "learning_milestone_score",
            "concept_mastery",
            "study_efficiency",
            "knowledge_retention",
            "academic_performance",
        ]),
        "finance" => Some(&[
            "investment_knowledge",
            "budgeting_skills",
            "financial_planning",
            "risk_assessment",
            "wealth_management",
        ]),
        _ => None,
    }
}

pub fn is_known_category(category: &str) -> bool {
    KNOWN_CATEGORIES.contains(&category)
}

/// One category-specific metrics submission. `values` is aligned with
/// field_names(category); metrics absent from the submission are None.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MetricSnapshot {
    pub user_id: String,
    pub category: String,
    pub values: Vec<Option<f64>>,
    pub timestamp: i64,
}

impl MetricSnapshot {
    /// Build a snapshot from a submitted metrics bag. Returns None for
    /// categories without a metric table.
    pub fn from_bag(
        user_id: &str,
        category: &str,
        metrics: &HashMap<String, f64>,
        timestamp: i64,
    ) -> Option<Self> {
        let fields = field_names(category)?;
        let values = fields.iter().map(|f| metrics.get(*f).copied()).collect();
        Some(MetricSnapshot {
            user_id: user_id.to_string(),
            category: category.to_string(),
            values,
            timestamp,
        })
    }

    /// All columns present?
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(|v| v.is_some())
    }

    /// Feature columns (everything but the target) with nulls dropped.
    pub fn feature_values(&self) -> Vec<f64> {
        if self.values.is_empty() {
            return Vec::new();
        }
        self.values[..self.values.len() - 1]
            .iter()
            .filter_map(|v| *v)
            .collect()
    }

    /// (features, target) split of a complete row.
    pub fn training_row(&self) -> Option<(Vec<f64>, f64)> {
        if !self.is_complete() || self.values.is_empty() {
            return None;
        }
        let values: Vec<f64> = self.values.iter().map(|v| v.unwrap_or(0.0)).collect();
        let (features, target) = values.split_at(values.len() - 1);
        Some((features.to_vec(), target[0]))
    }
}

/// Append-only per-category metric tables, one JSON-lines file each.
pub struct MetricStore {
    data_dir: PathBuf,
}

impl MetricStore {
    pub fn new(data_dir: &Path) -> Self {
        MetricStore {
            data_dir: data_dir.to_path_buf(),
        }
    }

    fn category_path(&self, category: &str) -> PathBuf {
        self.data_dir.join(format!("{}_metrics.jsonl", category))
    }

    /// Append a snapshot to its category table
    pub async fn append(&self, snapshot: &MetricSnapshot) -> Result<(), EngineError> {
        storage::append_line(&self.category_path(&snapshot.category), snapshot).await
    }

    /// Load every user's snapshots for a category in insertion order
    pub async fn load_category(&self, category: &str) -> Result<Vec<MetricSnapshot>, EngineError> {
        let mut snapshots: Vec<MetricSnapshot> =
            storage::load_lines(&self.category_path(category)).await?;
        snapshots.sort_by_key(|s| s.timestamp);
        Ok(snapshots)
    }

    /// Most recent snapshot for a user in a category
    pub async fn latest_for_user(
        &self,
        user_id: &str,
        category: &str,
    ) -> Result<Option<MetricSnapshot>, EngineError> {
        let snapshots = self.load_category(category).await?;
        Ok(snapshots.into_iter().rev().find(|s| s.user_id == user_id))
    }
}
