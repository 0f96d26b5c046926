//! Resource pools, the product catalog, and the availability calculator.

use serde::{Deserialize, Serialize};

use crate::core::EngineError;
use crate::store::CounterStore;

/// Well-known singleton counter key for the seat pool.
pub const SEAT_POOL_KEY: &str = "resource.seats";

/// A finite, countable inventory: fixed capacity plus a committed counter
/// stored under `key` in the counter store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePool {
    /// Counter store key holding the committed count.
    pub key: String,
    /// Fixed, non-negative capacity from static configuration.
    pub capacity: u32,
}

/// Catalog item backed by a per-item resource pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Item identifier.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: u32,
    /// Initial available quantity; the pool capacity for this item.
    pub stock: u32,
}

/// Static capacity table: the seat pool plus the product list.
#[derive(Debug, Clone)]
pub struct Catalog {
    seat_capacity: u32,
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog from a seat capacity and a product list.
    #[must_use]
    pub fn new(seat_capacity: u32, products: Vec<Product>) -> Self {
        Self {
            seat_capacity,
            products,
        }
    }

    /// The built-in product list.
    #[must_use]
    pub fn builtin_products() -> Vec<Product> {
        vec![
            Product { id: 1, name: "Suitcase 250".into(), price: 50, stock: 4 },
            Product { id: 2, name: "Suitcase 450".into(), price: 100, stock: 10 },
            Product { id: 3, name: "Suitcase 650".into(), price: 350, stock: 2 },
            Product { id: 4, name: "Suitcase 1050".into(), price: 550, stock: 5 },
        ]
    }

    /// The seat pool and its singleton counter key.
    #[must_use]
    pub fn seat_pool(&self) -> ResourcePool {
        ResourcePool {
            key: SEAT_POOL_KEY.to_owned(),
            capacity: self.seat_capacity,
        }
    }

    /// All catalog products.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by item id.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown item id.
    pub fn product(&self, id: u32) -> Result<&Product, EngineError> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("item.{id}")))
    }

    /// The resource pool for a product's stock counter.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown item id.
    pub fn product_pool(&self, id: u32) -> Result<ResourcePool, EngineError> {
        let product = self.product(id)?;
        Ok(ResourcePool {
            key: format!("item.{}", product.id),
            capacity: product.stock,
        })
    }
}

/// Units still available in a pool: `capacity - committed`.
///
/// The stored committed value is reported as-is; a corrupted store can yield
/// a negative result here, which callers floor with [`display_quantity`] for
/// display only.
///
/// # Errors
///
/// Propagates store read failures.
pub async fn available_units(
    store: &dyn CounterStore,
    pool: &ResourcePool,
) -> Result<i64, EngineError> {
    let committed = store.read(&pool.key).await?;
    Ok(i64::from(pool.capacity) - committed)
}

/// Floor an availability figure at zero for display-facing quantity fields.
#[must_use]
pub const fn display_quantity(available: i64) -> i64 {
    if available < 0 {
        0
    } else {
        available
    }
}

/// Durably commit `delta` units against a pool through compare-and-swap.
///
/// Re-reads and retries on contention; a commit that would push the counter
/// past capacity is rejected, never clamped. Returns the new committed count.
///
/// # Errors
///
/// `CapacityExhausted` when fewer than `delta` units remain; store errors
/// are propagated.
pub async fn commit_units(
    store: &dyn CounterStore,
    pool: &ResourcePool,
    delta: u32,
) -> Result<i64, EngineError> {
    loop {
        let committed = store.read(&pool.key).await?;
        let next = committed + i64::from(delta);
        if next > i64::from(pool.capacity) {
            return Err(EngineError::CapacityExhausted(pool.key.clone()));
        }
        if store.compare_and_swap(&pool.key, committed, next).await? {
            return Ok(next);
        }
        // Lost the race to a concurrent committer; re-read and retry.
        tracing::debug!("commit contention on {}, retrying", pool.key);
    }
}
