//! Core reservation abstractions: errors, the admission gate, the job model,
//! and the resource catalog with its availability calculator.

pub mod catalog;
pub mod error;
pub mod gate;
pub mod job;

pub use catalog::{available_units, commit_units, display_quantity, Catalog, Product, ResourcePool, SEAT_POOL_KEY};
pub use error::{AppResult, EngineError};
pub use gate::AdmissionGate;
pub use job::{JobId, JobKind, JobPayload, JobRecord, JobState, NotificationPayload, QueuedJob};
