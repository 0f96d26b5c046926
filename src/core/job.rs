//! Reservation job model and lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Queue-assigned job identifier, monotonic per queue instance.
pub type JobId = u64;

/// Categories of queued work, drained independently by the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Seat reservation commit against the seat pool counter.
    ReserveSeat,
    /// Push notification delivery.
    PushNotification,
}

impl JobKind {
    /// Stable string form, used for queue keys and storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReserveSeat => "reserve_seat",
            Self::PushNotification => "push_notification",
        }
    }

    /// Parse the stable string form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "reserve_seat" => Some(Self::ReserveSeat),
            "push_notification" => Some(Self::PushNotification),
            _ => None,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a job. `Complete` and `Failed` are terminal and
/// immutable; the failure cause lives on the record, not the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting in the queue for delivery.
    Queued,
    /// Held exclusively by one worker.
    Active,
    /// Finished successfully.
    Complete,
    /// Terminally failed; see the record's failure cause.
    Failed,
}

impl JobState {
    /// Whether the state admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Stable string form, used for storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Active => "active",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    /// Parse the stable string form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "queued" => Some(Self::Queued),
            "active" => Some(Self::Active),
            "complete" => Some(Self::Complete),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Push notification request, wire-compatible with the notification feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    /// Recipient phone number; checked against the blacklist by the worker.
    pub phone_number: String,
    /// Message body to deliver.
    pub message: String,
}

/// Payload carried by a queued job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobPayload {
    /// Seat reservation intent; the single unit to commit is implied.
    Seat,
    /// Push notification request.
    Notification(NotificationPayload),
}

/// A job delivered to a worker for processing.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    /// Queue-assigned identifier.
    pub id: JobId,
    /// Job category.
    pub kind: JobKind,
    /// Job payload as enqueued.
    pub payload: JobPayload,
}

/// Full job record as stored by the queue; the creator polls this snapshot
/// for outcome instead of receiving lifecycle callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Queue-assigned identifier.
    pub id: JobId,
    /// Job category.
    pub kind: JobKind,
    /// Job payload as enqueued.
    pub payload: JobPayload,
    /// Current lifecycle state.
    pub state: JobState,
    /// Progress percentage, 0-100, non-decreasing while active.
    pub progress: u8,
    /// Failure cause once the job is in the `Failed` state.
    pub failure: Option<String>,
    /// Creation timestamp in milliseconds since epoch.
    pub created_at_ms: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip() {
        for state in [JobState::Queued, JobState::Active, JobState::Complete, JobState::Failed] {
            assert_eq!(JobState::parse(state.as_str()), Some(state));
        }
        assert_eq!(JobState::parse("bogus"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Active.is_terminal());
        assert!(JobState::Complete.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }

    #[test]
    fn test_notification_payload_wire_form() {
        let payload: NotificationPayload = serde_json::from_str(
            r#"{"phoneNumber":"4153518743","message":"This is the code 1234 to verify your account"}"#,
        )
        .unwrap();
        assert_eq!(payload.phone_number, "4153518743");
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("phoneNumber").is_some());
    }
}
