//! Seat reservation endpoints and queue controls.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::core::{available_units, display_quantity, JobKind, JobPayload};
use crate::http::{store_failure, AppState, StatusBody};

/// Response shape for `GET /available_seats`.
#[derive(Debug, Serialize)]
pub struct AvailableSeats {
    /// Current availability, serialized as a string.
    #[serde(rename = "numberOfAvailableSeats")]
    pub number_of_available_seats: String,
}

/// `GET /available_seats`: current seat availability.
pub async fn available_seats(State(state): State<AppState>) -> Response {
    let pool = state.catalog.seat_pool();
    match available_units(state.store.as_ref(), &pool).await {
        Ok(available) => Json(AvailableSeats {
            number_of_available_seats: display_quantity(available).to_string(),
        })
        .into_response(),
        Err(e) => store_failure(&e),
    }
}

/// `GET /reserve_seat`: admission gate check, then enqueue.
///
/// Never blocks on job completion: the caller gets a pending
/// acknowledgement and polls `/jobs/:id` for the outcome.
pub async fn reserve_seat(State(state): State<AppState>) -> Json<StatusBody> {
    if !state.gate.is_open() {
        return Json(StatusBody {
            status: "Reservation are blocked",
        });
    }

    match state.queue.enqueue(JobKind::ReserveSeat, JobPayload::Seat).await {
        Ok(id) => {
            tracing::info!("seat reservation job {} enqueued", id);
            Json(StatusBody {
                status: "Reservation in process",
            })
        }
        Err(e) => {
            tracing::error!("failed to enqueue seat reservation: {}", e);
            Json(StatusBody {
                status: "Reservation failed",
            })
        }
    }
}

/// `GET /process`: begin worker consumption as a side effect.
pub async fn process_queue(State(state): State<AppState>) -> Json<StatusBody> {
    state.start_workers();
    Json(StatusBody {
        status: "Queue processing",
    })
}

/// `GET /jobs/:job_id`: job record snapshot for outcome polling.
pub async fn job_status(State(state): State<AppState>, Path(job_id): Path<u64>) -> Response {
    match state.queue.job(job_id).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => Json(StatusBody {
            status: "Job not found",
        })
        .into_response(),
        Err(e) => store_failure(&e),
    }
}
