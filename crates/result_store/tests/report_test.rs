//! Tests for listing and summary rendering.

use result_store::{
    Collection, Listing, ResultStore, StoreConfig, collections, render_schema, render_summary,
};

async fn populated_store() -> ResultStore {
    let store = ResultStore::open(&StoreConfig::in_memory())
        .await
        .expect("Failed to open store");
    store.add_classic(true, 3).await.expect("Add failed");
    store.add_classic(false, 6).await.expect("Add failed");
    store.put_daily(4).await.expect("Put failed");
    store.put_stat("streak", 2.0).await.expect("Put failed");
    store
}

#[tokio::test]
async fn test_json_listing_is_one_object() {
    let store = populated_store().await;
    let all: Vec<Collection> = collections().collect();
    let listing = Listing::load(&store, &all).await.expect("Load failed");
    let json = listing.to_json().expect("Serialize failed");

    let value: serde_json::Value = serde_json::from_str(&json).expect("Invalid JSON");
    let object = value.as_object().expect("Expected an object");
    assert_eq!(object.len(), 3);
    assert_eq!(object["classic"].as_array().map(Vec::len), Some(2));
    assert_eq!(object["daily"][0]["guesses"], 4);
    assert_eq!(object["stats"][0]["name"], "streak");
}

#[tokio::test]
async fn test_json_listing_of_one_collection() {
    let store = populated_store().await;
    let listing = Listing::load(&store, &[Collection::Daily])
        .await
        .expect("Load failed");
    let json = listing.to_json().expect("Serialize failed");

    let value: serde_json::Value = serde_json::from_str(&json).expect("Invalid JSON");
    let expected = serde_json::json!({ "daily": [{ "guesses": 4 }] });
    assert_eq!(value, expected);
}

#[tokio::test]
async fn test_text_listing_has_header_per_collection() {
    let store = populated_store().await;
    let all: Vec<Collection> = collections().collect();
    let listing = Listing::load(&store, &all).await.expect("Load failed");

    let expected = [
        "[stats]",
        "streak = 2",
        "[classic]",
        "#1 win=true guesses=3",
        "#2 win=false guesses=6",
        "[daily]",
        "guesses=4",
    ];
    assert_eq!(listing.to_text(), expected.join("\n"));
}

#[tokio::test]
async fn test_empty_listing_keeps_headers() {
    let store = ResultStore::open(&StoreConfig::in_memory())
        .await
        .expect("Failed to open store");
    let all: Vec<Collection> = collections().collect();
    let listing = Listing::load(&store, &all).await.expect("Load failed");

    assert_eq!(listing.to_text(), "[stats]\n[classic]\n[daily]");
    assert_eq!(listing.stats(), &Some(Vec::new()));
}

#[tokio::test]
async fn test_render_summary() {
    let store = populated_store().await;
    let summary = store.classic_summary().await.expect("Summary failed");

    let expected = "played 2 | won 1 | lost 1\nwin rate 50.0%\n  3 guesses: 1";
    assert_eq!(render_summary(&summary), expected);
}

#[test]
fn test_render_schema_lists_every_collection() {
    let expected = [
        "database (version 1)",
        "  stats: name, value",
        "  classic: ++, win, guesses",
        "  daily: guesses",
    ];
    assert_eq!(render_schema(), expected.join("\n"));
}
