//! Product listing and synchronous stock reservation endpoints.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::core::{available_units, commit_units, display_quantity, EngineError, Product};
use crate::http::{store_failure, AppState, StatusBody};

/// Catalog listing entry.
#[derive(Debug, Serialize)]
pub struct ProductSummary {
    /// Item identifier.
    #[serde(rename = "itemId")]
    pub item_id: u32,
    /// Display name.
    #[serde(rename = "itemName")]
    pub item_name: String,
    /// Unit price.
    pub price: u32,
    /// Configured stock for this item.
    #[serde(rename = "initialAvailableQuantity")]
    pub initial_available_quantity: u32,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            item_id: product.id,
            item_name: product.name.clone(),
            price: product.price,
            initial_available_quantity: product.stock,
        }
    }
}

/// Catalog detail entry with live availability.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    /// Listing fields.
    #[serde(flatten)]
    pub summary: ProductSummary,
    /// Units currently available, floored at zero for display.
    #[serde(rename = "currentQuantity")]
    pub current_quantity: i64,
}

/// Reservation outcome echoing the item id.
#[derive(Debug, Serialize)]
pub struct ReservationOutcome {
    /// Outcome status string.
    pub status: &'static str,
    /// Item the outcome refers to, echoed as an integer.
    #[serde(rename = "itemId")]
    pub item_id: u32,
}

/// `GET /list_products`: the full catalog.
pub async fn list_products(State(state): State<AppState>) -> Json<Vec<ProductSummary>> {
    Json(state.catalog.products().iter().map(ProductSummary::from).collect())
}

/// `GET /list_products/:item_id`: item detail with live availability.
pub async fn product_detail(State(state): State<AppState>, Path(item_id): Path<String>) -> Response {
    let Some(product) = lookup(&state, &item_id) else {
        return not_found();
    };
    let pool = match state.catalog.product_pool(product.id) {
        Ok(pool) => pool,
        Err(_) => return not_found(),
    };
    match available_units(state.store.as_ref(), &pool).await {
        Ok(available) => Json(ProductDetail {
            summary: ProductSummary::from(&product),
            current_quantity: display_quantity(available),
        })
        .into_response(),
        Err(e) => store_failure(&e),
    }
}

/// `GET /reserve_product/:item_id`: synchronous one-unit stock commit.
pub async fn reserve_product(State(state): State<AppState>, Path(item_id): Path<String>) -> Response {
    let Some(product) = lookup(&state, &item_id) else {
        return not_found();
    };
    let pool = match state.catalog.product_pool(product.id) {
        Ok(pool) => pool,
        Err(_) => return not_found(),
    };
    match commit_units(state.store.as_ref(), &pool, 1).await {
        Ok(_) => Json(ReservationOutcome {
            status: "Reservation confirmed",
            item_id: product.id,
        })
        .into_response(),
        Err(EngineError::CapacityExhausted(_)) => Json(ReservationOutcome {
            status: "Not enough stock available",
            item_id: product.id,
        })
        .into_response(),
        Err(e) => store_failure(&e),
    }
}

/// Resolve a path segment to a product; a non-numeric id is simply unknown.
fn lookup(state: &AppState, item_id: &str) -> Option<Product> {
    let id: u32 = item_id.parse().ok()?;
    state.catalog.product(id).ok().cloned()
}

fn not_found() -> Response {
    Json(StatusBody {
        status: "Product not found",
    })
    .into_response()
}
