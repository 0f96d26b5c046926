//! Admission endpoint layer: axum router and shared application state.

pub mod products;
pub mod seats;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::core::{AdmissionGate, Catalog, EngineError, JobKind};
use crate::queue::JobQueue;
use crate::store::CounterStore;
use crate::worker::{
    DrainConfig, JobTrail, NotificationHandler, SeatReservationHandler, WorkerPool,
};

/// Bare status payload used by most admission responses.
#[derive(Debug, Serialize)]
pub struct StatusBody {
    /// Human-readable status string.
    pub status: &'static str,
}

/// Shared state cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Counter store handle.
    pub store: Arc<dyn CounterStore>,
    /// Reservation queue handle.
    pub queue: Arc<dyn JobQueue>,
    /// Static capacity table.
    pub catalog: Arc<Catalog>,
    /// Admission gate read before enqueueing.
    pub gate: Arc<AdmissionGate>,
    /// Worker pool; drains are started by `/process`.
    pub workers: Arc<WorkerPool>,
    config: Arc<EngineConfig>,
    drains_started: Arc<AtomicBool>,
}

impl AppState {
    /// Assemble application state over the chosen backends.
    #[must_use]
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn CounterStore>,
        queue: Arc<dyn JobQueue>,
        catalog: Catalog,
    ) -> Self {
        let workers = WorkerPool::new(Arc::clone(&queue)).with_trail(JobTrail::new(Arc::clone(&store)));
        Self {
            store,
            queue,
            catalog: Arc::new(catalog),
            gate: Arc::new(AdmissionGate::new()),
            workers: Arc::new(workers),
            config: Arc::new(config),
            drains_started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the drain loops once; later calls are no-ops so repeated
    /// `/process` requests cannot spawn duplicate consumers.
    pub fn start_workers(&self) {
        if self.drains_started.swap(true, Ordering::AcqRel) {
            return;
        }
        let poll_interval = Duration::from_millis(self.config.queue.poll_interval_ms);

        let seat_handler = SeatReservationHandler::new(
            Arc::clone(&self.store),
            self.catalog.seat_pool(),
            Arc::clone(&self.gate),
        );
        self.workers.drain(
            JobKind::ReserveSeat,
            DrainConfig {
                concurrency: self.config.seats.concurrency,
                poll_interval,
            },
            Arc::new(seat_handler),
        );

        let notification_handler =
            NotificationHandler::new(self.config.notifications.blacklist.iter().cloned());
        self.workers.drain(
            JobKind::PushNotification,
            DrainConfig {
                concurrency: self.config.notifications.concurrency,
                poll_interval,
            },
            Arc::new(notification_handler),
        );
    }
}

/// Build the complete router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/available_seats", get(seats::available_seats))
        .route("/reserve_seat", get(seats::reserve_seat))
        .route("/process", get(seats::process_queue))
        .route("/jobs/:job_id", get(seats::job_status))
        .route("/list_products", get(products::list_products))
        .route("/list_products/:item_id", get(products::product_detail))
        .route("/reserve_product/:item_id", get(products::reserve_product))
        .with_state(state)
}

/// Convert a store-layer failure into the boundary's JSON payload instead of
/// letting it abort the request.
pub(crate) fn store_failure(e: &EngineError) -> Response {
    tracing::error!("counter store failure at the admission boundary: {}", e);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(StatusBody {
            status: "Store unavailable",
        }),
    )
        .into_response()
}
