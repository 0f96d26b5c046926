//! Admission gate controlling whether new reservation requests may be enqueued.

use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide switch read by the admission layer before enqueueing.
///
/// Workers close the gate when they observe an exhausted pool. Closing is
/// fail-closed: the gate never re-opens on its own. [`AdmissionGate::reopen`]
/// exists for an explicit external restock action and is wired to nothing
/// automatic.
#[derive(Debug)]
pub struct AdmissionGate {
    accepting: AtomicBool,
}

impl AdmissionGate {
    /// Create an open gate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            accepting: AtomicBool::new(true),
        }
    }

    /// Whether new reservation requests may currently be admitted.
    pub fn is_open(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// Close the gate. Idempotent; the first transition is logged.
    pub fn close(&self) {
        if self.accepting.swap(false, Ordering::AcqRel) {
            tracing::warn!("admission gate closed, new reservations are blocked");
        }
    }

    /// Re-open the gate after an external restock.
    pub fn reopen(&self) {
        if !self.accepting.swap(true, Ordering::AcqRel) {
            tracing::info!("admission gate reopened");
        }
    }
}

impl Default for AdmissionGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_open() {
        let gate = AdmissionGate::new();
        assert!(gate.is_open());
    }

    #[test]
    fn test_close_is_sticky() {
        let gate = AdmissionGate::new();
        gate.close();
        assert!(!gate.is_open());
        gate.close();
        assert!(!gate.is_open());
    }

    #[test]
    fn test_explicit_reopen() {
        let gate = AdmissionGate::new();
        gate.close();
        gate.reopen();
        assert!(gate.is_open());
    }
}
