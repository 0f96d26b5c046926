//! # Turnstile
//!
//! A queue-backed inventory reservation engine.
//!
//! Turnstile manages finite, countable resource pools (seats, per-item
//! stock) whose committed counters live in an external key/value store.
//! Reservation intents arrive over HTTP, pass a fast admission gate, and are
//! decoupled from their outcome through a durable job queue: the caller gets
//! an immediate pending acknowledgement while a worker pool drains the queue
//! and applies commits at bounded concurrency.
//!
//! ## Core Pieces
//!
//! - **Counter Store** (`store`): `read`/`write` plus `compare_and_swap`, so
//!   commits are lost-update free, with in-memory and Redis backends.
//! - **Availability Calculator** (`core::catalog`): `available = capacity -
//!   committed` over a static capacity table.
//! - **Reservation Queue** (`queue`): FIFO per job kind, single delivery
//!   while active, terminal states immutable.
//! - **Worker Pool** (`worker`): per-kind drain loops with CAS slot
//!   accounting; seat commits run serial, notification delivery runs wider.
//! - **Admission Layer** (`http`): axum endpoints that never block on job
//!   completion; an exhausted pool closes the fail-closed admission gate.
//! - **Notification Fan-out** (`pubsub`): broadcast channels terminated per
//!   listener by the `KILL_SERVER` sentinel convention.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use turnstile::config::EngineConfig;
//! use turnstile::core::Catalog;
//! use turnstile::http::{build_router, AppState};
//! use turnstile::queue::InMemoryJobQueue;
//! use turnstile::store::InMemoryStore;
//!
//! let config = EngineConfig::default();
//! let catalog = Catalog::new(config.seats.capacity, Catalog::builtin_products());
//! let state = AppState::new(
//!     config,
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(InMemoryJobQueue::new(1024)),
//!     catalog,
//! );
//! let router = build_router(state);
//! ```

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core reservation abstractions and the availability calculator.
pub mod core;
/// Configuration models for the server, store, pools, and workers.
pub mod config;
/// Counter store backends.
pub mod store;
/// Reservation queue backends.
pub mod queue;
/// Worker pool and job handlers.
pub mod worker;
/// Notification fan-out over broadcast channels.
pub mod pubsub;
/// Admission endpoint layer.
pub mod http;
/// Shared utilities.
pub mod util;
