use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::analytics::{self, OverallProgress};
use crate::config;
use crate::error::EngineError;
use crate::metrics::{self, MetricSnapshot, MetricStore};
use crate::notifications::{self, Notification};
use crate::notifications::store::NotificationStore;
use crate::prediction::{self, Prediction};
use crate::prediction::model::{BoostedEnsemble, LinearModel, StandardScaler};
use crate::prediction::registry::{self, CategoryModel, ModelRegistry};
use crate::progress::{ProgressEvent, ProgressStore};
use crate::quiz::{self, QuestionRecord, QuizStats, QuizStore};

/// Result of submitting a set of quiz answers
#[derive(Serialize, Debug, Clone)]
pub struct QuizOutcome {
    pub score: f64,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub notifications: Vec<Notification>,
}

impl Default for QuizOutcome {
    fn default() -> Self {
        QuizOutcome {
            score: 0.0,
            total_questions: 0,
            correct_answers: 0,
            notifications: Vec::new(),
        }
    }
}

/// Facade over the stores and the per-category model registry.
/// Every public operation catches internal failures and returns a
/// well-formed degraded value; nothing here panics or propagates.
pub struct ProgressEngine {
    progress: ProgressStore,
    metrics: MetricStore,
    notifications: NotificationStore,
    quiz: QuizStore,
    /// In-memory model registry cache, loaded lazily from disk
    registry: Arc<RwLock<Option<ModelRegistry>>>,
    registry_path: PathBuf,
}

impl ProgressEngine {
    /// Engine over the configured data directory
    pub fn new() -> Self {
        Self::with_data_dir(&config::data_dir())
    }

    /// Engine over an explicit data directory (embedders, tests)
    pub fn with_data_dir(data_dir: &Path) -> Self {
        ProgressEngine {
            progress: ProgressStore::new(data_dir),
            metrics: MetricStore::new(data_dir),
            notifications: NotificationStore::new(data_dir),
            quiz: QuizStore::new(data_dir),
            registry: Arc::new(RwLock::new(None)),
            registry_path: registry::registry_path(data_dir),
        }
    }

    /// Current registry contents, loading from disk on first use.
    /// The guard is never held across an await.
    async fn registry_snapshot(&self) -> ModelRegistry {
        {
            let guard = self.registry.read();
            if let Some(registry) = guard.as_ref() {
                return registry.clone();
            }
        }

        let loaded = registry::load_registry(&self.registry_path).await;
        *self.registry.write() = Some(loaded.clone());
        loaded
    }

    /// Replace one category's model slot and persist the registry
    async fn install_model(&self, category: &str, model: CategoryModel) -> Result<(), EngineError> {
        let mut updated = self.registry_snapshot().await;
        updated.insert(category, model);
        *self.registry.write() = Some(updated.clone());
        registry::save_registry(&self.registry_path, &updated).await
    }

    // --- recording ---

    /// Record a scored event and return the generated notifications.
    /// Degrades to an empty list on storage failure.
    pub async fn record_progress(
        &self,
        user_id: &str,
        category: &str,
        score: f64,
        total_questions: u32,
        metrics: HashMap<String, f64>,
    ) -> Vec<Notification> {
        match self
            .record_inner(user_id, category, score, total_questions, metrics)
            .await
        {
            Ok(notifications) => notifications,
            Err(e) => {
                tracing::error!(user_id, category, error = %e, "record_progress failed");
                Vec::new()
            }
        }
    }

    async fn record_inner(
        &self,
        user_id: &str,
        category: &str,
        score: f64,
        total_questions: u32,
        metrics: HashMap<String, f64>,
    ) -> Result<Vec<Notification>, EngineError> {
        let score = if (0.0..=100.0).contains(&score) {
            score
        } else {
            tracing::warn!(user_id, category, score, "Score outside [0, 100], clamping");
            score.clamp(0.0, 100.0)
        };
        let total_questions = total_questions.max(1);
        let timestamp = Utc::now().timestamp();

        // Snapshot the history before the append: the previous score
        // drives the progress notification, the new count the milestone
        let prior = self.progress.load_history(user_id, Some(category)).await?;
        let previous_score = prior.last().map(|e| e.score);
        let total_attempts = prior.len() + 1;

        let event = ProgressEvent {
            user_id: user_id.to_string(),
            category: category.to_string(),
            score,
            total_questions,
            metrics: metrics.clone(),
            timestamp,
        };
        self.progress.append(&event).await?;

        if !metrics.is_empty() {
            match MetricSnapshot::from_bag(user_id, category, &metrics, timestamp) {
                Some(snapshot) => self.metrics.append(&snapshot).await?,
                None => {
                    // Categories without a metric table skip snapshot storage
                    tracing::debug!(category, "No metric table for category");
                }
            }
        }

        let drafts = notifications::generate_all(
            category,
            score,
            previous_score,
            &metrics,
            total_attempts,
        );
        let created = self.notifications.append_batch(user_id, drafts).await?;

        // A failed retrain must not lose the recorded event
        if let Err(e) = self.retrain(category).await {
            tracing::warn!(category, error = %e, "Model retrain failed");
        }

        Ok(created)
    }

    /// Record an overall quiz score for progress tracking
    pub async fn record_quiz_score(
        &self,
        user_id: &str,
        category: &str,
        score: f64,
        total_questions: u32,
    ) -> Vec<Notification> {
        self.record_progress(user_id, category, score, total_questions, HashMap::new())
            .await
    }

    /// Record one answered quiz question: appended to the question log
    /// and tracked as a 100/0 progress event.
    pub async fn record_quiz_question(
        &self,
        user_id: &str,
        category: &str,
        question: &str,
        user_answer: &str,
        is_correct: bool,
        correct_answer: Option<String>,
    ) -> Vec<Notification> {
        let record = QuestionRecord {
            user_id: user_id.to_string(),
            category: category.to_string(),
            question: question.to_string(),
            user_answer: user_answer.to_string(),
            is_correct,
            correct_answer,
            timestamp: Utc::now().timestamp(),
        };
        if let Err(e) = self.quiz.record_question(&record).await {
            tracing::error!(user_id, category, error = %e, "record_quiz_question failed");
            return Vec::new();
        }

        let score = if is_correct { 100.0 } else { 0.0 };
        self.record_progress(user_id, category, score, 1, HashMap::new())
            .await
    }

    /// Track conversation engagement as a progress event
    pub async fn record_conversation(
        &self,
        user_id: &str,
        category: &str,
        message_count: u32,
        avg_response_length: u32,
    ) -> Vec<Notification> {
        let engagement =
            (message_count as f64 * 10.0 + avg_response_length as f64 / 10.0).min(100.0);
        self.record_progress(user_id, category, engagement, 1, HashMap::new())
            .await
    }

    // --- model training ---

    async fn retrain(&self, category: &str) -> Result<(), EngineError> {
        if metrics::is_known_category(category) {
            let snapshots = self.metrics.load_category(category).await?;
            if snapshots.len() < 5 {
                return Ok(());
            }

            let rows: Vec<(Vec<f64>, f64)> =
                snapshots.iter().filter_map(|s| s.training_row()).collect();
            if rows.len() < 2 {
                return Ok(());
            }

            let features: Vec<Vec<f64>> = rows.iter().map(|(f, _)| f.clone()).collect();
            let targets: Vec<f64> = rows.iter().map(|(_, t)| *t).collect();

            let scaler = StandardScaler::fit(&features);
            let scaled = scaler.transform_batch(&features);
            let model = BoostedEnsemble::fit(&scaled, &targets);

            self.install_model(category, CategoryModel::Ensemble { model, scaler })
                .await?;
            tracing::info!(category, rows = rows.len(), "Retrained category model");
        } else {
            // Generic categories get a pooled chronological fit
            let events = self.progress.load_category(category).await?;
            if events.len() < 2 {
                return Ok(());
            }
            let scores: Vec<f64> = events.iter().map(|e| e.score).collect();
            let model = LinearModel::fit_chronological(&scores);

            self.install_model(category, CategoryModel::Chronological { model })
                .await?;
            tracing::debug!(category, events = events.len(), "Retrained chronological model");
        }

        Ok(())
    }

    // --- prediction ---

    /// Predict a user's next score in a category. Degrades to the
    /// zeroed neutral prediction on internal failure.
    pub async fn predict(&self, user_id: &str, category: &str, steps_ahead: u32) -> Prediction {
        match self.predict_inner(user_id, category, steps_ahead).await {
            Ok(prediction) => prediction,
            Err(e) => {
                tracing::error!(user_id, category, error = %e, "predict failed");
                prediction::unavailable()
            }
        }
    }

    async fn predict_inner(
        &self,
        user_id: &str,
        category: &str,
        steps_ahead: u32,
    ) -> Result<Prediction, EngineError> {
        let history = self.progress.load_history(user_id, Some(category)).await?;
        if history.is_empty() {
            return Ok(prediction::insufficient_data());
        }

        let scores: Vec<f64> = history.iter().map(|e| e.score).collect();
        if scores.len() < 3 {
            return Ok(prediction::average_prediction(&scores));
        }

        // Richest tier: fitted category model against the user's
        // latest metric snapshot
        let registry = self.registry_snapshot().await;
        if let Some(CategoryModel::Ensemble { model, scaler }) = registry.get(category) {
            if let Some(snapshot) = self.metrics.latest_for_user(user_id, category).await? {
                let features = snapshot.feature_values();
                if features.len() >= 2 {
                    match prediction::ensemble_prediction(model, scaler, &features, &scores) {
                        Ok(prediction) => return Ok(prediction),
                        Err(e) => {
                            tracing::debug!(
                                category,
                                error = %e,
                                "Model tier failed, falling back to regression"
                            );
                        }
                    }
                }
            }
        }

        Ok(prediction::regression_prediction(&scores, steps_ahead))
    }

    // --- history & summaries ---

    /// A user's event history, optionally filtered by category.
    /// Degrades to an empty list.
    pub async fn history(&self, user_id: &str, category: Option<&str>) -> Vec<ProgressEvent> {
        match self.progress.load_history(user_id, category).await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!(user_id, error = %e, "history load failed");
                Vec::new()
            }
        }
    }

    /// Trend-aware summary across all tracked categories.
    /// Degrades to an empty map.
    pub async fn overall_progress(&self, user_id: &str) -> OverallProgress {
        match self.overall_inner(user_id).await {
            Ok(overall) => overall,
            Err(e) => {
                tracing::error!(user_id, error = %e, "overall_progress failed");
                OverallProgress::new()
            }
        }
    }

    async fn overall_inner(&self, user_id: &str) -> Result<OverallProgress, EngineError> {
        let mut overall = OverallProgress::new();
        for category in analytics::SUMMARY_CATEGORIES {
            let history = self.progress.load_history(user_id, Some(category)).await?;
            if history.is_empty() {
                continue;
            }
            let scores: Vec<f64> = history.iter().map(|e| e.score).collect();
            let prediction = if scores.len() >= 2 {
                Some(self.predict_inner(user_id, category, 1).await?)
            } else {
                None
            };
            overall.insert(
                category.to_string(),
                analytics::build_summary(&scores, prediction),
            );
        }
        Ok(overall)
    }

    // --- notifications ---

    /// A user's notifications, newest first. Degrades to an empty list.
    pub async fn notifications_for(&self, user_id: &str, unread_only: bool) -> Vec<Notification> {
        match self.notifications.list_for_user(user_id, unread_only).await {
            Ok(notifications) => notifications,
            Err(e) => {
                tracing::error!(user_id, error = %e, "notification list failed");
                Vec::new()
            }
        }
    }

    /// Mark one notification read. Degrades to false.
    pub async fn mark_notification_read(&self, id: u64) -> bool {
        match self.notifications.mark_read(id).await {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(id, error = %e, "mark_notification_read failed");
                false
            }
        }
    }

    // --- quiz ---

    /// Upsert the answer keys for a generated quiz session
    pub async fn store_answer_keys(
        &self,
        user_id: &str,
        category: &str,
        correct_answers: &HashMap<String, String>,
    ) {
        if let Err(e) = self
            .quiz
            .store_answer_keys(user_id, category, correct_answers)
            .await
        {
            tracing::error!(user_id, category, error = %e, "store_answer_keys failed");
        }
    }

    /// Latest stored answer key per question id. Degrades to empty.
    pub async fn answer_keys(&self, user_id: &str, category: &str) -> HashMap<String, String> {
        match self.quiz.answer_keys(user_id, category).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::error!(user_id, category, error = %e, "answer_keys failed");
                HashMap::new()
            }
        }
    }

    /// Score a submitted answer set against the stored keys and record
    /// the result as a progress event.
    pub async fn submit_quiz_answers(
        &self,
        user_id: &str,
        category: &str,
        answers: &HashMap<String, String>,
    ) -> QuizOutcome {
        let keys = match self.quiz.answer_keys(user_id, category).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::error!(user_id, category, error = %e, "submit_quiz_answers failed");
                return QuizOutcome::default();
            }
        };

        let scored = quiz::score_submission(&keys, answers);
        let notifications = self
            .record_progress(
                user_id,
                category,
                scored.score,
                scored.total_questions,
                HashMap::new(),
            )
            .await;

        QuizOutcome {
            score: scored.score,
            total_questions: scored.total_questions,
            correct_answers: scored.correct_count,
            notifications,
        }
    }

    /// Aggregate quiz statistics. Degrades to zeroed stats.
    pub async fn quiz_stats(&self, user_id: &str, category: Option<&str>) -> QuizStats {
        match self.quiz.stats(user_id, category).await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!(user_id, error = %e, "quiz_stats failed");
                QuizStats::default()
            }
        }
    }
}

impl Default for ProgressEngine {
    fn default() -> Self {
        Self::new()
    }
}
