//! Experiment lifecycle: creation, exposure, observation, winner declaration.

use pressgate::experiment::{
    ExperimentConfig, ExperimentStatus, ExperimentStore, ExperimentTracker,
    SqliteExperimentStore, Variant,
};
use std::sync::Arc;

async fn store() -> Arc<SqliteExperimentStore> {
    Arc::new(SqliteExperimentStore::in_memory().await.unwrap())
}

fn tracker_with(store: Arc<SqliteExperimentStore>) -> ExperimentTracker {
    ExperimentTracker::new(store, ExperimentConfig::default())
}

fn title_variants() -> (Variant, Vec<Variant>) {
    (
        Variant::with_id("control", "How to build a rain garden"),
        vec![Variant::with_id(
            "alt-1",
            "Rain gardens: the weekend project that pays off",
        )],
    )
}

#[tokio::test]
async fn creating_twice_surfaces_duplicate_error() {
    let tracker = tracker_with(store().await);
    let (control, alts) = title_variants();
    tracker
        .create_experiment("article-9", control, alts)
        .await
        .unwrap();

    let (control, alts) = title_variants();
    let err = tracker
        .create_experiment("article-9", control, alts)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("article-9"));

    // The stored experiment is untouched.
    let experiment = tracker.experiment("article-9").await.unwrap().unwrap();
    assert_eq!(experiment.variants.len(), 2);
    assert_eq!(experiment.status, ExperimentStatus::Running);
}

#[tokio::test]
async fn exposure_evens_out_across_variants() {
    let tracker = tracker_with(store().await);
    let (control, alts) = title_variants();
    tracker
        .create_experiment("article-9", control, alts)
        .await
        .unwrap();

    for _ in 0..10 {
        let variant = tracker
            .select_variant_to_show("article-9")
            .await
            .unwrap()
            .unwrap();
        tracker
            .record_impression("article-9", &variant.id)
            .await
            .unwrap();
    }

    let experiment = tracker.experiment("article-9").await.unwrap().unwrap();
    let counts: Vec<u64> = experiment.variants.iter().map(|v| v.impressions).collect();
    assert_eq!(counts.iter().sum::<u64>(), 10);
    assert_eq!(counts[0], 5);
    assert_eq!(counts[1], 5);
}

#[tokio::test]
async fn ctr_tracks_recorded_state_at_every_step() {
    let tracker = tracker_with(store().await);
    let (control, alts) = title_variants();
    tracker
        .create_experiment("article-9", control, alts)
        .await
        .unwrap();

    for step in 1..=5_u64 {
        tracker
            .record_impression("article-9", "alt-1")
            .await
            .unwrap();
        let experiment = tracker.experiment("article-9").await.unwrap().unwrap();
        let variant = experiment.variant("alt-1").unwrap();
        assert_eq!(variant.impressions, step);
        let expected = variant.clicks as f64 / variant.impressions as f64;
        assert!((variant.ctr() - expected).abs() < 1e-12);
    }

    tracker.record_click("article-9", "alt-1").await.unwrap();
    let experiment = tracker.experiment("article-9").await.unwrap().unwrap();
    let variant = experiment.variant("alt-1").unwrap();
    assert!((variant.ctr() - 0.2).abs() < 1e-12);
}

#[tokio::test]
async fn scenario_d_significant_variant_wins() {
    let store = store().await;
    let tracker = tracker_with(Arc::clone(&store));
    let (control, alts) = title_variants();
    let mut experiment = tracker
        .create_experiment("article-9", control, alts)
        .await
        .unwrap();

    // 10/100 vs 24/100 seeded; the triggering click makes it 25/100.
    experiment.variant_mut("control").unwrap().impressions = 100;
    experiment.variant_mut("control").unwrap().clicks = 10;
    experiment.variant_mut("alt-1").unwrap().impressions = 100;
    experiment.variant_mut("alt-1").unwrap().clicks = 24;
    store.save(&experiment).await.unwrap();

    let winner = tracker.record_click("article-9", "alt-1").await.unwrap();
    assert_eq!(winner.as_deref(), Some("alt-1"));

    let completed = tracker.experiment("article-9").await.unwrap().unwrap();
    assert_eq!(completed.status, ExperimentStatus::Completed);
    assert_eq!(completed.winner_id.as_deref(), Some("alt-1"));
    assert!(completed.confidence.unwrap() >= 0.95);
    assert!(completed.completed_at.is_some());
}

#[tokio::test]
async fn completion_is_one_way_and_counts_stay_monotonic() {
    let store = store().await;
    let tracker = tracker_with(Arc::clone(&store));
    let (control, alts) = title_variants();
    let mut experiment = tracker
        .create_experiment("article-9", control, alts)
        .await
        .unwrap();

    experiment.variant_mut("control").unwrap().impressions = 100;
    experiment.variant_mut("control").unwrap().clicks = 10;
    experiment.variant_mut("alt-1").unwrap().impressions = 100;
    experiment.variant_mut("alt-1").unwrap().clicks = 24;
    store.save(&experiment).await.unwrap();

    tracker.record_click("article-9", "alt-1").await.unwrap();
    let first = tracker.experiment("article-9").await.unwrap().unwrap();

    // Further clicks still record but never disturb the declared winner,
    // even if they would now favor the control.
    for _ in 0..50 {
        tracker.record_click("article-9", "control").await.unwrap();
    }

    let after = tracker.experiment("article-9").await.unwrap().unwrap();
    assert_eq!(after.status, ExperimentStatus::Completed);
    assert_eq!(after.winner_id, first.winner_id);
    assert_eq!(after.confidence, first.confidence);
    assert_eq!(after.variant("control").unwrap().clicks, 60);

    // Completed experiments no longer serve variants.
    assert!(
        tracker
            .select_variant_to_show("article-9")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn scenario_e_clicks_without_impressions_are_lenient() {
    let tracker = tracker_with(store().await);
    let (control, alts) = title_variants();
    tracker
        .create_experiment("article-9", control, alts)
        .await
        .unwrap();

    tracker.record_click("article-9", "alt-1").await.unwrap();
    tracker.record_click("article-9", "alt-1").await.unwrap();

    let experiment = tracker.experiment("article-9").await.unwrap().unwrap();
    let variant = experiment.variant("alt-1").unwrap();
    assert_eq!(variant.clicks, 2);
    assert!(variant.clicks > variant.impressions);
    assert_eq!(experiment.status, ExperimentStatus::Running);
}

#[tokio::test]
async fn recording_against_missing_subject_errors() {
    let tracker = tracker_with(store().await);
    let err = tracker
        .record_impression("ghost", "control")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("ghost"));
}

#[tokio::test]
async fn concurrent_recordings_for_one_subject_stay_consistent() {
    let store = store().await;
    let tracker = Arc::new(tracker_with(store));
    let (control, alts) = title_variants();
    tracker
        .create_experiment("article-9", control, alts)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let tracker = Arc::clone(&tracker);
        handles.push(tokio::spawn(async move {
            tracker
                .record_impression("article-9", "control")
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let experiment = tracker.experiment("article-9").await.unwrap().unwrap();
    assert_eq!(experiment.variant("control").unwrap().impressions, 20);
}

#[tokio::test]
async fn experiments_persist_across_store_handles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("experiments.db");

    {
        let store = Arc::new(SqliteExperimentStore::open(&path).await.unwrap());
        let tracker = tracker_with(store);
        let (control, alts) = title_variants();
        tracker
            .create_experiment("article-9", control, alts)
            .await
            .unwrap();
        tracker
            .record_impression("article-9", "alt-1")
            .await
            .unwrap();
    }

    let store = Arc::new(SqliteExperimentStore::open(&path).await.unwrap());
    let tracker = tracker_with(store);
    let experiment = tracker.experiment("article-9").await.unwrap().unwrap();
    assert_eq!(experiment.variant("alt-1").unwrap().impressions, 1);
}
