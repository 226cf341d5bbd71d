use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use chrono::Utc;
use crate::error::EngineError;
use crate::storage;

/// Stored correct answer for one generated quiz question. Unique per
/// (user, category, question_id): a later submission replaces the
/// earlier one at read time.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnswerKey {
    pub user_id: String,
    pub category: String,
    pub question_id: String,
    pub correct_answer: String,
    pub timestamp: i64,
}

/// One answered quiz question, kept for history and statistics
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QuestionRecord {
    pub user_id: String,
    pub category: String,
    pub question: String,
    pub user_answer: String,
    pub is_correct: bool,
    pub correct_answer: Option<String>,
    pub timestamp: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct QuizStats {
    pub total_questions: usize,
    pub correct_answers: usize,
    pub accuracy: f64,
    pub average_score: f64,
}

/// Outcome of scoring one submitted answer set
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QuizScore {
    pub correct_count: u32,
    pub total_questions: u32,
    pub score: f64,
}

/// Score submitted answers against stored keys: case-insensitive,
/// whitespace-trimmed exact match. An empty submission scores 0.
pub fn score_submission(
    keys: &HashMap<String, String>,
    answers: &HashMap<String, String>,
) -> QuizScore {
    let total_questions = answers.len() as u32;
    let mut correct_count = 0u32;

    for (question_id, user_answer) in answers {
        if let Some(correct_answer) = keys.get(question_id) {
            if user_answer.trim().to_lowercase() == correct_answer.trim().to_lowercase() {
                correct_count += 1;
            }
        }
    }

    let score = if total_questions > 0 {
        (correct_count as f64 / total_questions as f64 * 100.0).round()
    } else {
        0.0
    };

    QuizScore {
        correct_count,
        total_questions,
        score,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Answer keys and per-question history, one JSON-lines file each.
pub struct QuizStore {
    answers_path: PathBuf,
    questions_path: PathBuf,
}

impl QuizStore {
    pub fn new(data_dir: &Path) -> Self {
        QuizStore {
            answers_path: data_dir.join("quiz_answers.jsonl"),
            questions_path: data_dir.join("quiz_questions.jsonl"),
        }
    }

    /// Upsert the correct answers for a quiz session. Keys are
    /// appended; lookup takes the latest entry per question id.
    pub async fn store_answer_keys(
        &self,
        user_id: &str,
        category: &str,
        correct_answers: &HashMap<String, String>,
    ) -> Result<(), EngineError> {
        let timestamp = Utc::now().timestamp();
        for (question_id, correct_answer) in correct_answers {
            let key = AnswerKey {
                user_id: user_id.to_string(),
                category: category.to_string(),
                question_id: question_id.clone(),
                correct_answer: correct_answer.clone(),
                timestamp,
            };
            storage::append_line(&self.answers_path, &key).await?;
        }
        Ok(())
    }

    /// Latest correct answer per question id for a user's quiz session
    pub async fn answer_keys(
        &self,
        user_id: &str,
        category: &str,
    ) -> Result<HashMap<String, String>, EngineError> {
        let keys: Vec<AnswerKey> = storage::load_lines(&self.answers_path).await?;

        // Insertion order means later entries overwrite earlier ones
        let mut latest = HashMap::new();
        for key in keys {
            if key.user_id == user_id && key.category == category {
                latest.insert(key.question_id, key.correct_answer);
            }
        }
        Ok(latest)
    }

    /// Append one answered question to the history log
    pub async fn record_question(&self, record: &QuestionRecord) -> Result<(), EngineError> {
        storage::append_line(&self.questions_path, record).await
    }

    /// Aggregate quiz statistics for a user, optionally per category
    pub async fn stats(
        &self,
        user_id: &str,
        category: Option<&str>,
    ) -> Result<QuizStats, EngineError> {
        let records: Vec<QuestionRecord> = storage::load_lines(&self.questions_path).await?;
        let relevant: Vec<&QuestionRecord> = records
            .iter()
            .filter(|r| {
                r.user_id == user_id
                    && category.map(|c| r.category == c).unwrap_or(true)
            })
            .collect();

        if relevant.is_empty() {
            return Ok(QuizStats::default());
        }

        let total_questions = relevant.len();
        let correct_answers = relevant.iter().filter(|r| r.is_correct).count();
        let accuracy = correct_answers as f64 / total_questions as f64 * 100.0;
        let average_score = relevant
            .iter()
            .map(|r| if r.is_correct { 100.0 } else { 0.0 })
            .sum::<f64>()
            / total_questions as f64;

        Ok(QuizStats {
            total_questions,
            correct_answers,
            accuracy: round2(accuracy),
            average_score: round2(average_score),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_score_submission_case_and_whitespace_insensitive() {
        let stored = keys(&[("q1", "Paris"), ("q2", "Paris")]);
        let answers = keys(&[("q1", "Paris"), ("q2", "paris ")]);

        let result = score_submission(&stored, &answers);
        assert_eq!(result.correct_count, 2);
        assert_eq!(result.total_questions, 2);
        assert!((result.score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_submission_empty_is_zero() {
        let stored = keys(&[("q1", "Paris")]);
        let result = score_submission(&stored, &HashMap::new());
        assert_eq!(result.total_questions, 0);
        assert!((result.score - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_submission_rounds() {
        let stored = keys(&[("q1", "a"), ("q2", "b"), ("q3", "c")]);
        let answers = keys(&[("q1", "a"), ("q2", "x"), ("q3", "x")]);
        let result = score_submission(&stored, &answers);
        // 1/3 rounds to 33
        assert!((result.score - 33.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_submission_unknown_question_is_incorrect() {
        let stored = keys(&[("q1", "a")]);
        let answers = keys(&[("q1", "a"), ("q9", "a")]);
        let result = score_submission(&stored, &answers);
        assert_eq!(result.correct_count, 1);
        assert!((result.score - 50.0).abs() < 1e-9);
    }
}
