use std::collections::HashMap;
use mentor_core::ProgressEngine;
use mentor_core::notifications::NotificationKind;

#[tokio::test]
async fn test_first_event_welcomes_the_user() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = ProgressEngine::with_data_dir(dir.path());

    let notifications = engine
        .record_progress("u1", "quiz", 80.0, 5, HashMap::new())
        .await;

    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Info);
    assert!(notifications[0].title.contains("Welcome to Quiz Learning"));
}

#[tokio::test]
async fn test_progress_delta_thresholds() {
    let cases: Vec<(f64, f64, NotificationKind, &str)> = vec![
        (60.0, 72.0, NotificationKind::Success, "Great Progress"),
        (60.0, 65.0, NotificationKind::Info, "Steady Progress"),
        (60.0, 53.0, NotificationKind::Warning, "Focus Needed"),
        (60.0, 58.0, NotificationKind::Info, "Performance Update"),
    ];

    for (first, second, expected_kind, expected_title) in cases {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = ProgressEngine::with_data_dir(dir.path());

        engine.record_progress("u1", "quiz", first, 5, HashMap::new()).await;
        let notifications = engine
            .record_progress("u1", "quiz", second, 5, HashMap::new())
            .await;

        assert_eq!(notifications.len(), 1, "scores {} -> {}", first, second);
        assert_eq!(
            notifications[0].kind, expected_kind,
            "scores {} -> {}: {:?}",
            first, second, notifications[0]
        );
        assert!(
            notifications[0].title.contains(expected_title),
            "scores {} -> {}: {}",
            first, second, notifications[0].title
        );
    }
}

#[tokio::test]
async fn test_milestone_at_exactly_five_sessions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = ProgressEngine::with_data_dir(dir.path());

    for i in 1..=6u32 {
        let notifications = engine
            .record_progress("u1", "chat", 50.0, 1, HashMap::new())
            .await;
        let milestone_count = notifications
            .iter()
            .filter(|n| n.title.contains("Milestone"))
            .count();

        if i == 5 {
            assert_eq!(milestone_count, 1, "5th session should hit a milestone");
            let milestone = notifications
                .iter()
                .find(|n| n.title.contains("Milestone"))
                .expect("milestone notification");
            assert_eq!(milestone.kind, NotificationKind::Success);
            assert!(milestone.message.contains("5 learning sessions"));
        } else {
            assert_eq!(milestone_count, 0, "session {} should not hit a milestone", i);
        }
    }
}

#[tokio::test]
async fn test_learning_insights_per_category() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = ProgressEngine::with_data_dir(dir.path());

    let mut career = HashMap::new();
    career.insert("interview_score".to_string(), 90.0);
    let notifications = engine.record_progress("u1", "career", 85.0, 5, career).await;
    assert!(notifications.iter().any(|n| {
        n.kind == NotificationKind::Success && n.title.contains("Interview Skills")
    }));

    let mut weak_skills = HashMap::new();
    weak_skills.insert("skill_assessment".to_string(), 60.0);
    let notifications = engine.record_progress("u2", "career", 55.0, 5, weak_skills).await;
    assert!(notifications.iter().any(|n| {
        n.kind == NotificationKind::Info && n.title.contains("Skill Development")
    }));

    let mut business = HashMap::new();
    business.insert("business_plan_score".to_string(), 85.0);
    let notifications = engine.record_progress("u3", "business", 82.0, 5, business).await;
    assert!(notifications.iter().any(|n| n.title.contains("Business Planning Mastery")));

    let mut education = HashMap::new();
    education.insert("concept_mastery".to_string(), 80.0);
    let notifications = engine.record_progress("u4", "education", 78.0, 5, education).await;
    assert!(notifications.iter().any(|n| n.title.contains("Concept Mastery")));

    let mut finance = HashMap::new();
    finance.insert("investment_knowledge".to_string(), 85.0);
    let notifications = engine.record_progress("u5", "finance", 81.0, 5, finance).await;
    assert!(notifications.iter().any(|n| n.title.contains("Investment Knowledge")));
}

#[tokio::test]
async fn test_no_insight_without_metrics() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = ProgressEngine::with_data_dir(dir.path());

    engine.record_progress("u1", "career", 60.0, 5, HashMap::new()).await;
    let notifications = engine
        .record_progress("u1", "career", 64.0, 5, HashMap::new())
        .await;

    // Progress notification only: no insight rule fires on an empty bag
    assert_eq!(notifications.len(), 1);
}

#[tokio::test]
async fn test_notifications_are_persisted_and_markable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = ProgressEngine::with_data_dir(dir.path());

    engine.record_progress("u1", "quiz", 70.0, 5, HashMap::new()).await;
    engine.record_progress("u1", "quiz", 85.0, 5, HashMap::new()).await;

    let all = engine.notifications_for("u1", false).await;
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|n| !n.read));

    let target = all[0].id;
    assert!(engine.mark_notification_read(target).await);

    let unread = engine.notifications_for("u1", true).await;
    assert_eq!(unread.len(), 1);
    assert!(unread.iter().all(|n| n.id != target));

    // Unknown ids degrade to false
    assert!(!engine.mark_notification_read(999_999).await);
}

#[tokio::test]
async fn test_notifications_are_scoped_per_user() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = ProgressEngine::with_data_dir(dir.path());

    engine.record_progress("u1", "quiz", 70.0, 5, HashMap::new()).await;
    engine.record_progress("u2", "quiz", 70.0, 5, HashMap::new()).await;

    assert_eq!(engine.notifications_for("u1", false).await.len(), 1);
    assert_eq!(engine.notifications_for("u2", false).await.len(), 1);
    assert!(engine.notifications_for("u3", false).await.is_empty());
}
