//! Persistence queue worker integration tests

mod common;

use std::time::Duration;

use tokio::sync::watch;

use bedside::db::{PatientRepo, init_memory, spawn_store_worker};
use common::{sample_record, setup_store};

#[tokio::test]
async fn test_insert_then_select_returns_equal_record() {
    let (store, _shutdown) = setup_store();

    let record = sample_record("ada");
    store.insert(record.clone()).await.unwrap();

    let found = store.select("ada").await.unwrap().unwrap();
    assert_eq!(found, record);
}

#[tokio::test]
async fn test_counter_updates_converge_in_order() {
    let (store, _shutdown) = setup_store();
    store.insert(sample_record("ada")).await.unwrap();

    for count in 1..=10_i64 {
        store.update_food(count, "ada").await.unwrap();
    }
    store.update_water(3, "ada").await.unwrap();

    // The select is behind every update in the FIFO queue
    let found = store.select("ada").await.unwrap().unwrap();
    assert_eq!(found.food_intake, 10);
    assert_eq!(found.water_intake, 3);
}

#[tokio::test]
async fn test_select_unknown_name_is_not_found_not_crash() {
    let (store, _shutdown) = setup_store();

    assert!(store.select("never-inserted").await.unwrap().is_none());

    // Worker is still alive and serving
    store.insert(sample_record("ada")).await.unwrap();
    assert!(store.select("ada").await.unwrap().is_some());
}

#[tokio::test]
async fn test_concurrent_selects_get_their_own_replies() {
    let (store, _shutdown) = setup_store();
    store.insert(sample_record("ada")).await.unwrap();
    store.insert(sample_record("grace")).await.unwrap();

    let store_a = store.clone();
    let store_b = store.clone();
    let (a, b) = tokio::join!(store_a.select("ada"), store_b.select("grace"));

    assert_eq!(a.unwrap().unwrap().name, "ada");
    assert_eq!(b.unwrap().unwrap().name, "grace");
}

#[tokio::test]
async fn test_worker_stops_within_bounded_window() {
    let repo = PatientRepo::new(init_memory().unwrap());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (store, worker) = spawn_store_worker(repo, shutdown_rx);

    store.insert(sample_record("ada")).await.unwrap();
    shutdown_tx.send(true).unwrap();

    tokio::time::timeout(Duration::from_secs(2), worker)
        .await
        .expect("store worker did not observe shutdown in time")
        .unwrap();
}
