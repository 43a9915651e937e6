use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A completed reservation. Immutable once created; the external
/// `transaction_id` is unique across all bookings and serves as the
/// idempotency key for redelivered payment confirmations.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Booking {
    pub id: Uuid,
    pub show_id: String,
    pub user_id: String,
    /// Sorted ascending.
    pub seats: Vec<u32>,
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        show_id: impl Into<String>,
        user_id: impl Into<String>,
        mut seats: Vec<u32>,
        transaction_id: impl Into<String>,
    ) -> Self {
        seats.sort_unstable();
        Self {
            id: Uuid::new_v4(),
            show_id: show_id.into(),
            user_id: user_id.into(),
            seats,
            transaction_id: transaction_id.into(),
            created_at: Utc::now(),
        }
    }
}
