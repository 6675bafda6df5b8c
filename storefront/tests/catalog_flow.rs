//! Catalog fetches, superseded requests and persisted favorites

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::{boot, category, product, StubApi};
use state_dispatch::{KeyValueStore, MemoryStore};
use storefront::{Action, Product, FAVORITES_KEY};

#[tokio::test]
async fn test_home_fetches_fill_their_own_fields() {
    let api = Arc::new(StubApi {
        categories: vec![category(1, "Elektronik")],
        recommended: vec![product(10, "Lamp")],
        bestsellers: vec![product(20, "Kettle"), product(21, "Toaster")],
        ..StubApi::new()
    });
    let mut app = boot(api.clone(), Arc::new(MemoryStore::new())).await;

    app.fetch_home();
    assert!(app.state().catalog.loading);
    app.settle().await;

    let catalog = &app.state().catalog;
    assert_eq!(catalog.categories, vec![category(1, "Elektronik")]);
    assert_eq!(catalog.recommended, vec![product(10, "Lamp")]);
    assert_eq!(catalog.best_sellers.len(), 2);
    assert!(!catalog.loading);
    assert_eq!(catalog.error, None);

    let mut calls = api.calls();
    calls.sort();
    assert_eq!(calls, vec!["bestsellers", "categories", "recommended"]);
}

#[tokio::test]
async fn test_latest_category_request_wins() {
    let api = Arc::new(StubApi {
        category_products: HashMap::from([
            (1, vec![product(100, "Old")]),
            (2, vec![product(200, "New")]),
        ]),
        ..StubApi::new()
    });
    let first = api.gate(1);
    let second = api.gate(2);
    let mut app = boot(api.clone(), Arc::new(MemoryStore::new())).await;

    app.fetch_category_products(1);
    app.fetch_category_products(2);

    // Call 2 resolves first, call 1 only afterwards
    second.send(()).unwrap();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = first.send(());
    });
    app.settle().await;

    let state = &app.state().category_products;
    assert_eq!(state.category_id, Some(2));
    assert_eq!(state.products, vec![product(200, "New")]);
    assert!(!state.loading);

    let mut calls = api.calls();
    calls.sort();
    assert_eq!(calls, vec!["category_products/1", "category_products/2"]);
}

#[tokio::test]
async fn test_failed_category_fetch_reports_message() {
    let mut app = boot(Arc::new(StubApi::new()), Arc::new(MemoryStore::new())).await;

    app.fetch_category_products(42);
    app.settle().await;

    let state = &app.state().category_products;
    assert!(!state.loading);
    assert_eq!(state.error.as_deref(), Some("Unknown category"));
}

#[tokio::test]
async fn test_favorites_survive_restart() {
    let storage = Arc::new(MemoryStore::new());
    let mut app = boot(Arc::new(StubApi::new()), storage.clone()).await;

    assert!(app.toggle_favorite(product(1, "Lamp")));
    app.add_favorite(product(2, "Kettle"));
    app.add_favorite(product(1, "Lamp"));
    assert!(!app.toggle_favorite(product(2, "Kettle")));
    app.add_favorite(product(3, "Toaster"));

    let saved: Vec<Product> =
        serde_json::from_str(&storage.get(FAVORITES_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(saved, vec![product(1, "Lamp"), product(3, "Toaster")]);

    let restarted = boot(Arc::new(StubApi::new()), storage).await;
    assert_eq!(
        restarted.state().favorites.ids().collect::<Vec<_>>(),
        vec![1, 3]
    );
}

#[tokio::test]
async fn test_corrupt_favorites_load_as_empty() {
    let storage = Arc::new(MemoryStore::with_entries([(FAVORITES_KEY, "{not json")]));
    let mut app = boot(Arc::new(StubApi::new()), storage.clone()).await;
    assert!(app.state().favorites.is_empty());

    app.load_favorites();
    app.settle().await;
    assert!(app.state().favorites.is_empty());
    assert!(app.state().session.error.is_none());
}

#[tokio::test]
async fn test_load_favorites_replaces_in_memory_set() {
    let storage = Arc::new(MemoryStore::new());
    let mut app = boot(Arc::new(StubApi::new()), storage.clone()).await;
    app.add_favorite(product(1, "Lamp"));

    // Another writer replaces the stored list
    let other = serde_json::to_string(&vec![product(7, "Camera")]).unwrap();
    storage.set(FAVORITES_KEY, &other).unwrap();

    app.load_favorites();
    app.settle().await;
    assert_eq!(app.state().favorites.ids().collect::<Vec<_>>(), vec![7]);
}

#[tokio::test]
async fn test_add_right_after_load_is_kept() {
    let stored = serde_json::to_string(&vec![product(7, "Camera")]).unwrap();
    let storage = Arc::new(MemoryStore::with_entries([(FAVORITES_KEY, stored.as_str())]));
    let mut app = boot(Arc::new(StubApi::new()), storage.clone()).await;

    app.load_favorites();
    app.add_favorite(product(1, "Lamp"));
    app.settle().await;

    let mut ids: Vec<_> = app.state().favorites.ids().collect();
    ids.sort();
    assert_eq!(ids, vec![1, 7]);

    let mut saved: Vec<Product> =
        serde_json::from_str(&storage.get(FAVORITES_KEY).unwrap().unwrap()).unwrap();
    saved.sort_by_key(|p| p.id);
    assert_eq!(saved, vec![product(1, "Lamp"), product(7, "Camera")]);
}

#[tokio::test]
async fn test_run_loop_applies_actions_until_cancelled() {
    let api = Arc::new(StubApi {
        categories: vec![category(1, "Elektronik")],
        ..StubApi::new()
    });
    let mut app = boot(api, Arc::new(MemoryStore::new())).await;
    let tx = app.action_tx();
    let cancel = tokio_util::sync::CancellationToken::new();

    let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel();
    app.subscribe(move |state| {
        if !state.catalog.categories.is_empty() {
            let _ = done_tx.send(());
        }
    });

    let stop = cancel.clone();
    tokio::spawn(async move {
        tx.send(Action::CategoriesFetch).unwrap();
        done_rx.recv().await;
        stop.cancel();
    });

    tokio::time::timeout(Duration::from_secs(5), app.run(cancel))
        .await
        .expect("run loop did not stop");
    assert_eq!(app.state().catalog.categories.len(), 1);
}
