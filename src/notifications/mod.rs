pub mod store;

use serde::{Serialize, Deserialize};
use std::collections::HashMap;

/// Session-count thresholds that earn a congratulatory notification
pub const MILESTONES: [usize; 4] = [5, 10, 20, 50];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
}

/// A stored, per-user notification. Flipping `read` is the only
/// mutation ever applied after creation.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub read: bool,
    pub timestamp: i64,
}

/// A generated notification before the store assigns id/user/timestamp
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
}

impl NotificationDraft {
    fn new<T: Into<String>, M: Into<String>>(title: T, message: M, kind: NotificationKind) -> Self {
        NotificationDraft {
            title: title.into(),
            message: message.into(),
            kind,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Progress notification, always produced. Compares the new score with
/// the immediately preceding one; a first event gets a welcome instead.
pub fn progress_notification(
    category: &str,
    score: f64,
    previous_score: Option<f64>,
) -> NotificationDraft {
    let previous = match previous_score {
        Some(previous) => previous,
        None => {
            return NotificationDraft::new(
                format!("Welcome to {} Learning!", capitalize(category)),
                format!(
                    "You've started your {} learning journey. Your first score: {}%",
                    category, score
                ),
                NotificationKind::Info,
            );
        }
    };

    let improvement = score - previous;
    if improvement > 10.0 {
        NotificationDraft::new(
            format!("Great Progress in {}!", capitalize(category)),
            format!(
                "Your {} score improved by {:.1}%! Keep up the great work!",
                category, improvement
            ),
            NotificationKind::Success,
        )
    } else if improvement > 0.0 {
        NotificationDraft::new(
            format!("Steady Progress in {}", capitalize(category)),
            format!(
                "Your {} score improved by {:.1}%. Consistent progress leads to success!",
                category, improvement
            ),
            NotificationKind::Info,
        )
    } else if improvement < -5.0 {
        NotificationDraft::new(
            format!("Focus Needed in {}", capitalize(category)),
            format!(
                "Your {} score decreased by {:.1}%. Let's review the concepts together.",
                category,
                improvement.abs()
            ),
            NotificationKind::Warning,
        )
    } else {
        NotificationDraft::new(
            format!("{} Performance Update", capitalize(category)),
            format!(
                "Your current {} score: {}%. Ready for the next challenge?",
                category, score
            ),
            NotificationKind::Info,
        )
    }
}

/// Learning-insight notification from the just-submitted metrics bag.
/// First matching rule wins; a rule only matches when its metric is
/// present in the bag.
pub fn insight_notification(
    category: &str,
    metrics: &HashMap<String, f64>,
) -> Option<NotificationDraft> {
    let above = |name: &str, threshold: f64| metrics.get(name).map(|v| *v > threshold) == Some(true);
    let below = |name: &str, threshold: f64| metrics.get(name).map(|v| *v < threshold) == Some(true);

    match category {
        "career" => {
            if above("interview_score", 85.0) {
                return Some(NotificationDraft::new(
                    "Interview Skills Excellence!",
                    "Your interview performance is outstanding! You're well-prepared for real interviews.",
                    NotificationKind::Success,
                ));
            }
            if below("skill_assessment", 70.0) {
                return Some(NotificationDraft::new(
                    "Skill Development Opportunity",
                    "Focus on developing your core skills. Practice makes perfect!",
                    NotificationKind::Info,
                ));
            }
        }
        "business" => {
            if above("business_plan_score", 80.0) {
                return Some(NotificationDraft::new(
                    "Business Planning Mastery",
                    "Your business planning skills are excellent! You understand market dynamics well.",
                    NotificationKind::Success,
                ));
            }
            if below("market_analysis_score", 70.0) {
                return Some(NotificationDraft::new(
                    "Market Research Opportunity",
                    "Dig deeper into market research. Knowing your market guides every decision!",
                    NotificationKind::Info,
                ));
            }
        }
        "education" => {
            if above("concept_mastery", 75.0) {
                return Some(NotificationDraft::new(
                    "Concept Mastery Achieved",
                    "You've mastered key concepts! Ready to tackle more advanced topics.",
                    NotificationKind::Success,
                ));
            }
            if below("knowledge_retention", 70.0) {
                return Some(NotificationDraft::new(
                    "Retention Boost Needed",
                    "Revisit earlier material to strengthen retention. Regular review makes it stick!",
                    NotificationKind::Info,
                ));
            }
        }
        "finance" => {
            if above("investment_knowledge", 80.0) {
                return Some(NotificationDraft::new(
                    "Investment Knowledge Strong",
                    "Your investment knowledge is impressive! You make sound financial decisions.",
                    NotificationKind::Success,
                ));
            }
            if below("budgeting_skills", 70.0) {
                return Some(NotificationDraft::new(
                    "Budgeting Practice Opportunity",
                    "Sharpen your budgeting skills. Small habits build financial confidence!",
                    NotificationKind::Info,
                ));
            }
        }
        _ => {}
    }

    None
}

/// Milestone notification when the total event count for the
/// user+category lands exactly on a milestone.
pub fn milestone_notification(category: &str, total_attempts: usize) -> Option<NotificationDraft> {
    let message = match total_attempts {
        5 => "You've completed 5 learning sessions! Consistency is key to success.",
        10 => "10 sessions completed! You're building strong learning habits.",
        20 => "20 sessions milestone reached! Your dedication is paying off.",
        50 => "50 sessions completed! You're on an incredible learning journey.",
        _ => return None,
    };

    Some(NotificationDraft::new(
        format!("{} Learning Milestone!", capitalize(category)),
        message,
        NotificationKind::Success,
    ))
}

/// All notifications for one recorded event, in fixed order:
/// progress, then at most one insight, then at most one milestone.
pub fn generate_all(
    category: &str,
    score: f64,
    previous_score: Option<f64>,
    metrics: &HashMap<String, f64>,
    total_attempts: usize,
) -> Vec<NotificationDraft> {
    let mut drafts = Vec::with_capacity(3);
    drafts.push(progress_notification(category, score, previous_score));
    if let Some(insight) = insight_notification(category, metrics) {
        drafts.push(insight);
    }
    if let Some(milestone) = milestone_notification(category, total_attempts) {
        drafts.push(milestone);
    }
    drafts
}
