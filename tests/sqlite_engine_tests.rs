/// Integration tests running the engine over the SQLite store
use chrono::{Duration, Utc};
use entry_lens::{
    config::Config, storage::EntryQueryOptions, Entry, EntryQueryEngine, EntryRepository,
    EntryType, QueryArgs, SqliteRepository,
};
use serde_json::json;
use std::sync::Arc;

async fn repository() -> Arc<SqliteRepository> {
    Arc::new(SqliteRepository::connect("sqlite::memory:").await.unwrap())
}

fn log(id: &str, level: &str, age: Duration) -> Entry {
    let mut entry = Entry::new(
        id,
        EntryType::Log,
        json!({"level": level, "message": format!("{} message", level)}),
        Utc::now() - age,
    );
    entry.tags = vec!["billing".to_string()];
    entry
}

#[tokio::test]
async fn test_log_stats_from_sqlite() {
    let repository = repository().await;
    repository
        .insert_batch(&[
            log("l1", "error", Duration::minutes(5)),
            log("l2", "error", Duration::minutes(4)),
            log("l3", "info", Duration::minutes(3)),
            log("l4", "warning", Duration::hours(3)),
        ])
        .await
        .unwrap();

    let engine = EntryQueryEngine::new(repository, Arc::new(Config::default())).unwrap();
    let envelope = engine
        .execute("logs", QueryArgs::default().with_action("stats"))
        .await;
    assert!(!envelope.is_error);

    let stats = &envelope.data.unwrap()["statistics"];
    assert_eq!(stats["total_logs"], 3);
    assert_eq!(stats["error_count"], 2);
    assert_eq!(stats["warning_count"], 0);
}

#[tokio::test]
async fn test_level_filter_and_tags() {
    let repository = repository().await;
    repository.insert(&log("l1", "error", Duration::minutes(1))).await.unwrap();
    let mut untagged = log("l2", "ERROR", Duration::minutes(2));
    untagged.tags.clear();
    repository.insert(&untagged).await.unwrap();

    let engine = EntryQueryEngine::new(repository.clone(), Arc::new(Config::default())).unwrap();

    let envelope = engine
        .execute_value("logs", json!({"level": "error"}))
        .await;
    assert_eq!(envelope.data.unwrap()["pagination"]["total"], 2);

    let envelope = engine
        .execute_value("logs", json!({"level": "error", "tag": "billing"}))
        .await;
    let data = envelope.data.unwrap();
    assert_eq!(data["pagination"]["total"], 1);
    assert_eq!(data["data"][0]["id"], "l1");
}

#[tokio::test]
async fn test_log_prune_against_sqlite() {
    let repository = repository().await;
    repository
        .insert_batch(&[
            log("old", "info", Duration::days(10)),
            log("fresh", "info", Duration::hours(2)),
        ])
        .await
        .unwrap();

    let engine = EntryQueryEngine::new(repository.clone(), Arc::new(Config::default())).unwrap();
    let envelope = engine
        .execute_value("logs", json!({"action": "prune", "older_than": "7d"}))
        .await;
    let payload = envelope.data.unwrap();
    assert_eq!(payload["deleted_count"], 1);
    assert_eq!(payload["failed_count"], 0);

    let remaining = repository
        .get(EntryType::Log, &EntryQueryOptions::with_limit(10))
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "fresh");
}

#[tokio::test]
async fn test_maintenance_clear_by_type() {
    let repository = repository().await;
    repository.insert(&log("l1", "info", Duration::minutes(1))).await.unwrap();
    repository
        .insert(&Entry::new(
            "q1",
            EntryType::Query,
            json!({"sql": "select 1", "time": 0.4}),
            Utc::now(),
        ))
        .await
        .unwrap();

    let engine = EntryQueryEngine::new(repository, Arc::new(Config::default())).unwrap();
    let envelope = engine
        .execute_value(
            "maintenance",
            json!({"action": "clear", "entry_type": "query", "confirm": true}),
        )
        .await;
    assert_eq!(envelope.data.unwrap()["deleted_count"], 1);

    let stats = engine.execute_value("maintenance", json!({})).await.data.unwrap();
    assert_eq!(stats["total_entries"], 1);
    assert_eq!(stats["by_type"], json!({"log": 1}));
}
