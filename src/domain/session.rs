use crate::domain::show::Amount;
use crate::error::{ReservationError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Created,
    Paid,
    Failed,
}

/// The provider's view of an in-progress payment.
///
/// The metadata payload is opaque to the gateway; only the coordinator
/// interprets it, and only through [`SessionMetadata`].
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PaymentSession {
    pub id: String,
    pub amount: Amount,
    pub status: SessionStatus,
    pub metadata: serde_json::Value,
    /// Provider-issued once the session is paid.
    pub transaction_id: Option<String>,
}

/// The schema the coordinator holds the opaque session metadata to.
///
/// The provider round-trips this payload untouched, but nothing guarantees
/// it arrives well-formed, so it is re-validated at the boundary instead of
/// trusted.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct SessionMetadata {
    pub show_id: String,
    pub user_id: String,
    pub seats: Vec<u32>,
}

impl SessionMetadata {
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| ReservationError::InvalidMetadata(e.to_string()))
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "show_id": self.show_id,
            "user_id": self.user_id,
            "seats": self.seats,
        })
    }
}
