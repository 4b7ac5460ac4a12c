//! Tests for the asynchronous store handle.

use result_store::{ClassicQuery, ResultStore, StoreConfig, StoreErrorKind};
use tempfile::{NamedTempFile, TempDir};

async fn open_in(dir: &TempDir) -> ResultStore {
    ResultStore::open(&StoreConfig::in_dir(dir.path()))
        .await
        .expect("Failed to open store")
}

#[tokio::test]
async fn test_add_classic_then_lookup_by_id() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = open_in(&dir).await;

    let earlier = store.add_classic(false, 6).await.expect("Insert failed");
    let recorded = store.add_classic(true, 4).await.expect("Insert failed");
    assert_ne!(earlier.id(), recorded.id());

    let found = store
        .get_classic(*recorded.id())
        .await
        .expect("Lookup failed")
        .expect("Record missing");
    assert!(*found.win());
    assert_eq!(*found.guesses(), 4);
    assert_eq!(found.id(), recorded.id());
}

#[tokio::test]
async fn test_second_classic_id_is_greater() {
    let store = ResultStore::open(&StoreConfig::in_memory())
        .await
        .expect("Failed to open store");
    let first = store.add_classic(true, 2).await.expect("Insert failed");
    let second = store.add_classic(true, 2).await.expect("Insert failed");
    assert!(second.id() > first.id());
}

#[tokio::test]
async fn test_stat_upsert_keeps_single_record() {
    let store = ResultStore::open(&StoreConfig::in_memory())
        .await
        .expect("Failed to open store");
    store.put_stat("played", 1.0).await.expect("Put failed");
    store.put_stat("played", 2.0).await.expect("Put failed");

    let stats = store.list_stats().await.expect("List failed");
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].name(), "played");
    assert_eq!(*stats[0].value(), 2.0);
}

#[tokio::test]
async fn test_daily_duplicate_overwrites() {
    let store = ResultStore::open(&StoreConfig::in_memory())
        .await
        .expect("Failed to open store");
    store.put_daily(5).await.expect("Put failed");
    store.put_daily(5).await.expect("Second put failed");

    assert_eq!(store.count_daily().await.expect("Count failed"), 1);
    assert!(store.get_daily(5).await.expect("Lookup failed").is_some());
}

#[tokio::test]
async fn test_find_classic_wins_subset() {
    let store = ResultStore::open(&StoreConfig::in_memory())
        .await
        .expect("Failed to open store");
    let mut expected = Vec::new();
    for (win, guesses) in [(true, 3), (false, 6), (true, 5), (false, 4)] {
        let recorded = store.add_classic(win, guesses).await.expect("Add failed");
        if win {
            expected.push(recorded);
        }
    }

    let wins = store
        .find_classic(ClassicQuery::wins())
        .await
        .expect("Query failed");
    assert_eq!(wins, expected);
}

#[tokio::test]
async fn test_fresh_store_is_empty() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = open_in(&dir).await;

    let all = ClassicQuery::all();
    assert!(store.find_classic(all).await.expect("Query failed").is_empty());
    assert!(store.list_daily().await.expect("List failed").is_empty());
    assert!(store.list_stats().await.expect("List failed").is_empty());
    assert_eq!(store.count_stats().await.expect("Count failed"), 0);
    assert_eq!(store.schema_version().await.expect("Version failed"), 1);
}

#[tokio::test]
async fn test_open_creates_nested_data_dir() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let nested = dir.path().join("profiles").join("default");
    let config = StoreConfig::in_dir(&nested);

    let store = ResultStore::open(&config)
        .await
        .expect("Failed to open store");
    store.put_daily(3).await.expect("Put failed");

    let path = config.database_path().expect("File-backed config");
    assert!(path.exists());
    let file_name = path.file_name().and_then(|n| n.to_str());
    assert_eq!(file_name, Some("database.sqlite3"));
}

#[tokio::test]
async fn test_clones_share_the_database() {
    let store = ResultStore::open(&StoreConfig::in_memory())
        .await
        .expect("Failed to open store");
    let other = store.clone();

    store
        .increment_stat("played", 1.0)
        .await
        .expect("Increment failed");
    other
        .increment_stat("played", 1.0)
        .await
        .expect("Increment failed");

    let stat = store
        .get_stat("played")
        .await
        .expect("Lookup failed")
        .expect("Stat missing");
    assert_eq!(*stat.value(), 2.0);
}

#[tokio::test]
async fn test_concurrent_increments_are_serialized() {
    let store = ResultStore::open(&StoreConfig::in_memory())
        .await
        .expect("Failed to open store");

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.increment_stat("played", 1.0).await })
        })
        .collect();
    for task in tasks {
        task.await.expect("Task panicked").expect("Bump failed");
    }

    let stat = store
        .get_stat("played")
        .await
        .expect("Lookup failed")
        .expect("Stat missing");
    assert_eq!(*stat.value(), 8.0);
}

#[tokio::test]
async fn test_summary_through_store() {
    let store = ResultStore::open(&StoreConfig::in_memory())
        .await
        .expect("Failed to open store");
    for (win, guesses) in [(true, 4), (true, 4), (false, 6)] {
        store.add_classic(win, guesses).await.expect("Add failed");
    }

    let summary = store.classic_summary().await.expect("Summary failed");
    assert_eq!(*summary.wins(), 2);
    assert_eq!(summary.guess_distribution().get(&4), Some(&2));
    let losses = store
        .count_classic(ClassicQuery::losses())
        .await
        .expect("Count failed");
    assert_eq!(losses, 1);
}

#[tokio::test]
async fn test_open_with_file_as_data_dir_is_storage_unavailable() {
    let file = NamedTempFile::new().expect("Failed to create temp file");
    let config = StoreConfig::in_dir(file.path());

    let err = ResultStore::open(&config)
        .await
        .expect_err("A regular file cannot hold the database");
    assert_eq!(err.kind(), StoreErrorKind::StorageUnavailable);
}

#[tokio::test]
async fn test_records_survive_reopen() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = StoreConfig::in_dir(dir.path().join("data"));

    let store = ResultStore::open(&config)
        .await
        .expect("Failed to open store");
    store.put_stat("played", 1.0).await.expect("Put failed");
    drop(store);

    let reopened = ResultStore::open(&config)
        .await
        .expect("Failed to reopen store");
    let stat = reopened.get_stat("played").await.expect("Lookup failed");
    assert!(stat.is_some());
}
