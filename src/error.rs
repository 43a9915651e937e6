use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReservationError>;

/// Failure taxonomy for the reservation core.
///
/// `DuplicateTransaction` is internal: the coordinator absorbs it into an
/// idempotent success and callers never observe it.
#[derive(Error, Debug)]
pub enum ReservationError {
    #[error("show not found: {0}")]
    ShowNotFound(String),
    #[error("seat {seat} is out of range for a show with {total_seats} seats")]
    InvalidSeat { seat: u32, total_seats: u32 },
    #[error("no seats selected")]
    EmptySeatSelection,
    #[error("seat {0} requested more than once")]
    DuplicateSeat(u32),
    #[error("requested seats are no longer available")]
    SeatsUnavailable,
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("payment provider unavailable")]
    GatewayUnavailable,
    #[error("payment session not found: {0}")]
    SessionNotFound(String),
    #[error("payment not completed for session {0}")]
    PaymentNotCompleted(String),
    #[error("malformed session metadata: {0}")]
    InvalidMetadata(String),
    #[error("seats already booked: {0:?}")]
    Conflicted(Vec<u32>),
    #[error("a booking already exists for transaction {0}")]
    DuplicateTransaction(String),
    #[error("script error: {0}")]
    Script(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for ReservationError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Storage(Box::new(err))
    }
}
