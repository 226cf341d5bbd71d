use std::collections::HashMap;
use mentor_core::ProgressEngine;
use mentor_core::prediction::Trend;

fn career_bag(base: f64) -> HashMap<String, f64> {
    let mut bag = HashMap::new();
    bag.insert("interview_score".to_string(), base);
    bag.insert("skill_assessment".to_string(), base - 5.0);
    bag.insert("career_goal_progress".to_string(), base + 3.0);
    bag.insert("resume_quality".to_string(), base - 2.0);
    bag.insert("networking_score".to_string(), base + 1.0);
    bag
}

#[tokio::test]
async fn test_predict_without_history() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = ProgressEngine::with_data_dir(dir.path());

    let prediction = engine.predict("nobody", "quiz", 1).await;
    assert_eq!(prediction.predicted_score, 0.0);
    assert_eq!(prediction.confidence_interval, (0.0, 0.0));
    assert_eq!(prediction.trend, Trend::Neutral);
    assert!(prediction.message.contains("Insufficient data"));
}

#[tokio::test]
async fn test_predict_single_point_uses_average() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = ProgressEngine::with_data_dir(dir.path());

    engine.record_progress("u1", "quiz", 50.0, 5, HashMap::new()).await;

    let prediction = engine.predict("u1", "quiz", 1).await;
    assert!((prediction.predicted_score - 50.0).abs() < 1e-9);
    assert!((prediction.confidence_interval.0 - 40.0).abs() < 1e-9);
    assert!((prediction.confidence_interval.1 - 60.0).abs() < 1e-9);
    assert_eq!(prediction.trend, Trend::Stable);
    assert!(prediction.message.contains("limited data"));
}

#[tokio::test]
async fn test_predict_upward_trend_continues() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = ProgressEngine::with_data_dir(dir.path());

    for score in [40.0, 50.0, 60.0] {
        engine.record_progress("u1", "quiz", score, 5, HashMap::new()).await;
    }

    let prediction = engine.predict("u1", "quiz", 1).await;
    assert!(
        prediction.predicted_score > 60.0,
        "Upward trend should extrapolate past the last score, got {}",
        prediction.predicted_score
    );
    assert_eq!(prediction.trend, Trend::Improving);
    assert!(prediction.message.contains("Linear regression based on 3 data points"));
}

#[tokio::test]
async fn test_predict_steps_ahead_extends_the_line() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = ProgressEngine::with_data_dir(dir.path());

    for score in [40.0, 50.0, 60.0] {
        engine.record_progress("u1", "quiz", score, 5, HashMap::new()).await;
    }

    let one = engine.predict("u1", "quiz", 1).await;
    let two = engine.predict("u1", "quiz", 2).await;
    assert!(two.predicted_score > one.predicted_score);
    assert!((two.predicted_score - 80.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_prediction_bounds_always_bracket_the_score() {
    let histories: Vec<Vec<f64>> = vec![
        vec![90.0, 95.0, 100.0],
        vec![10.0, 5.0, 0.0],
        vec![60.0, 60.0, 60.0],
        vec![0.0, 100.0, 0.0, 100.0],
        vec![95.0],
        vec![20.0, 80.0],
    ];

    for (i, history) in histories.iter().enumerate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = ProgressEngine::with_data_dir(dir.path());
        let user = format!("u{}", i);
        for score in history {
            engine.record_progress(&user, "quiz", *score, 5, HashMap::new()).await;
        }

        let p = engine.predict(&user, "quiz", 1).await;
        let (lo, hi) = p.confidence_interval;
        assert!(lo <= p.predicted_score, "history {:?}: lo {} > score {}", history, lo, p.predicted_score);
        assert!(p.predicted_score <= hi, "history {:?}: score {} > hi {}", history, p.predicted_score, hi);
        assert!((0.0..=100.0).contains(&lo), "history {:?}: lo {}", history, lo);
        assert!((0.0..=100.0).contains(&hi), "history {:?}: hi {}", history, hi);
        assert!((0.0..=100.0).contains(&p.predicted_score));
    }
}

#[tokio::test]
async fn test_predict_uses_category_model_when_trained() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = ProgressEngine::with_data_dir(dir.path());

    // Three snapshots from the target user, two more from others:
    // enough rows for the category model to train
    for (score, base) in [(60.0, 60.0), (70.0, 72.0), (80.0, 85.0)] {
        engine.record_progress("u1", "career", score, 5, career_bag(base)).await;
    }
    engine.record_progress("u2", "career", 55.0, 5, career_bag(50.0)).await;
    engine.record_progress("u3", "career", 90.0, 5, career_bag(92.0)).await;

    let prediction = engine.predict("u1", "career", 1).await;
    assert!(
        prediction.message.contains("Model prediction based on 3 data points"),
        "Expected the category-model tier, got message: {}",
        prediction.message
    );
    let (lo, hi) = prediction.confidence_interval;
    assert!(lo <= prediction.predicted_score && prediction.predicted_score <= hi);
    assert!((0.0..=100.0).contains(&lo) && (0.0..=100.0).contains(&hi));
}

#[tokio::test]
async fn test_model_survives_engine_restart() {
    let dir = tempfile::tempdir().expect("tempdir");

    {
        let engine = ProgressEngine::with_data_dir(dir.path());
        for (score, base) in [(60.0, 60.0), (70.0, 72.0), (80.0, 85.0)] {
            engine.record_progress("u1", "career", score, 5, career_bag(base)).await;
        }
        engine.record_progress("u2", "career", 55.0, 5, career_bag(50.0)).await;
        engine.record_progress("u3", "career", 90.0, 5, career_bag(92.0)).await;
    }

    // Fresh instance over the same data directory: history and the
    // persisted model registry are both reloaded from disk
    let engine = ProgressEngine::with_data_dir(dir.path());
    let prediction = engine.predict("u1", "career", 1).await;
    assert!(
        prediction.message.contains("Model prediction"),
        "Persisted model should be used after restart, got: {}",
        prediction.message
    );
}

#[tokio::test]
async fn test_predict_falls_back_without_metric_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = ProgressEngine::with_data_dir(dir.path());

    // Other users train the career model; the target user never
    // submits metrics, so the model tier has no feature vector
    for user in ["a", "b", "c", "d", "e"] {
        engine.record_progress(user, "career", 70.0, 5, career_bag(70.0)).await;
    }
    for score in [40.0, 50.0, 60.0] {
        engine.record_progress("plain", "career", score, 5, HashMap::new()).await;
    }

    let prediction = engine.predict("plain", "career", 1).await;
    assert!(
        prediction.message.contains("Linear regression"),
        "Expected regression fallback, got: {}",
        prediction.message
    );
}
