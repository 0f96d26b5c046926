//! Admission boundary tests over the axum router with in-memory backends.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use turnstile::config::EngineConfig;
use turnstile::core::{Catalog, JobKind};
use turnstile::http::{build_router, AppState};
use turnstile::queue::{InMemoryJobQueue, JobQueue};
use turnstile::store::{CounterStore, InMemoryStore};

fn test_state(seat_capacity: u32) -> (AppState, Router) {
    let mut config = EngineConfig::default();
    config.seats.capacity = seat_capacity;
    config.queue.poll_interval_ms = 5;
    let catalog = Catalog::new(seat_capacity, Catalog::builtin_products());
    let state = AppState::new(
        config,
        Arc::new(InMemoryStore::new()) as Arc<dyn CounterStore>,
        Arc::new(InMemoryJobQueue::new(1024)) as Arc<dyn JobQueue>,
        catalog,
    );
    let router = build_router(state.clone());
    (state, router)
}

async fn get_json(router: &Router, uri: &str) -> Value {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within the deadline"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_available_seats_reports_capacity_as_string() {
    let (_state, router) = test_state(50);
    let body = get_json(&router, "/available_seats").await;
    assert_eq!(body, json!({ "numberOfAvailableSeats": "50" }));
}

#[tokio::test]
async fn test_fifty_seats_drain_and_the_next_admission_is_blocked() {
    let (state, router) = test_state(50);

    for _ in 0..50 {
        let body = get_json(&router, "/reserve_seat").await;
        assert_eq!(body, json!({ "status": "Reservation in process" }));
    }

    let body = get_json(&router, "/process").await;
    assert_eq!(body, json!({ "status": "Queue processing" }));

    let counters = state.workers.counters();
    wait_until(|| counters.settled() == 50).await;
    assert_eq!(counters.snapshot().completed, 50);

    let body = get_json(&router, "/available_seats").await;
    assert_eq!(body, json!({ "numberOfAvailableSeats": "0" }));

    // The 51st attempt is rejected at the gate, without enqueueing a job.
    let body = get_json(&router, "/reserve_seat").await;
    assert_eq!(body, json!({ "status": "Reservation are blocked" }));
    assert_eq!(state.queue.pending(JobKind::ReserveSeat).await.unwrap(), 0);
    assert!(state.queue.job(51).await.unwrap().is_none());
}

#[tokio::test]
async fn test_process_is_idempotent() {
    let (state, router) = test_state(3);
    for _ in 0..3 {
        get_json(&router, "/reserve_seat").await;
    }
    // Repeated /process calls must not spawn duplicate consumers; each seat
    // is still committed exactly once.
    for _ in 0..3 {
        let body = get_json(&router, "/process").await;
        assert_eq!(body, json!({ "status": "Queue processing" }));
    }

    let counters = state.workers.counters();
    wait_until(|| counters.settled() == 3).await;
    let body = get_json(&router, "/available_seats").await;
    assert_eq!(body, json!({ "numberOfAvailableSeats": "0" }));
}

#[tokio::test]
async fn test_job_status_polling() {
    let (_state, router) = test_state(50);
    get_json(&router, "/reserve_seat").await;

    let body = get_json(&router, "/jobs/1").await;
    assert_eq!(body["state"], json!("queued"));
    assert_eq!(body["kind"], json!("reserve_seat"));

    let body = get_json(&router, "/jobs/99").await;
    assert_eq!(body, json!({ "status": "Job not found" }));
}

#[tokio::test]
async fn test_list_products_shapes() {
    let (_state, router) = test_state(50);
    let body = get_json(&router, "/list_products").await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert_eq!(
        items[0],
        json!({
            "itemId": 1,
            "itemName": "Suitcase 250",
            "price": 50,
            "initialAvailableQuantity": 4
        })
    );
}

#[tokio::test]
async fn test_product_detail_and_unknown_items() {
    let (_state, router) = test_state(50);

    let body = get_json(&router, "/list_products/1").await;
    assert_eq!(body["itemId"], json!(1));
    assert_eq!(body["currentQuantity"], json!(4));

    let body = get_json(&router, "/list_products/12").await;
    assert_eq!(body, json!({ "status": "Product not found" }));

    let body = get_json(&router, "/list_products/suitcase").await;
    assert_eq!(body, json!({ "status": "Product not found" }));
}

#[tokio::test]
async fn test_stock_reservation_runs_dry_with_integer_item_echo() {
    let (_state, router) = test_state(50);

    // Item 1 starts with stock 4; three commits leave one unit.
    for _ in 0..3 {
        let body = get_json(&router, "/reserve_product/1").await;
        assert_eq!(body, json!({ "status": "Reservation confirmed", "itemId": 1 }));
    }
    let body = get_json(&router, "/list_products/1").await;
    assert_eq!(body["currentQuantity"], json!(1));

    // A fourth succeeds and drains the pool.
    let body = get_json(&router, "/reserve_product/1").await;
    assert_eq!(body, json!({ "status": "Reservation confirmed", "itemId": 1 }));
    let body = get_json(&router, "/list_products/1").await;
    assert_eq!(body["currentQuantity"], json!(0));

    // A fifth is rejected, echoing the item id as an integer.
    let body = get_json(&router, "/reserve_product/1").await;
    assert_eq!(
        body,
        json!({ "status": "Not enough stock available", "itemId": 1 })
    );

    let body = get_json(&router, "/reserve_product/9").await;
    assert_eq!(body, json!({ "status": "Product not found" }));
}
