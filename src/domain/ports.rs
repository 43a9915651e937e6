use super::booking::Booking;
use super::session::{PaymentSession, SessionMetadata};
use super::show::{Amount, Show};
use crate::error::Result;
use async_trait::async_trait;

/// Outcome of an atomic seat commit.
#[derive(Debug, PartialEq, Clone)]
pub enum CommitOutcome {
    Committed,
    /// No mutation happened; carries the sorted conflicting subset.
    Conflict(Vec<u32>),
}

/// Authoritative store of each show's taken seats.
///
/// `try_commit` is the only legal mutation path for a booked-seat set: it
/// must run its check and its insert as one indivisible operation against
/// the persisted record, so that of two concurrent commits with
/// intersecting seats at most one succeeds.
#[async_trait]
pub trait SeatLedger: Send + Sync {
    async fn insert_show(&self, show: Show) -> Result<()>;
    async fn get_show(&self, show_id: &str) -> Result<Option<Show>>;
    /// Advisory, side-effect-free pre-check. Not authoritative under
    /// concurrency.
    async fn check_available(&self, show_id: &str, seats: &[u32]) -> Result<bool>;
    /// Atomic all-or-nothing check-and-set of `seats` on the show record.
    async fn try_commit(&self, show_id: &str, seats: &[u32]) -> Result<CommitOutcome>;
}

/// Durable record of completed bookings, unique on the external
/// transaction id. The uniqueness check runs inside the store's own
/// critical section, not as a caller-side lookup-then-insert.
#[async_trait]
pub trait BookingLedger: Send + Sync {
    async fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<Booking>>;
    /// Fails with `DuplicateTransaction` if a booking for the same
    /// transaction id already exists.
    async fn create(&self, booking: Booking) -> Result<Booking>;
    async fn bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>>;
    /// All bookings in creation order.
    async fn all_bookings(&self) -> Result<Vec<Booking>>;
}

/// Thin wrapper around the external payment provider. Possibly slow,
/// possibly retried; sole authority on session status.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a payment intent carrying `metadata` for later retrieval.
    async fn create_session(&self, metadata: SessionMetadata, amount: Amount) -> Result<String>;
    async fn session_status(&self, session_id: &str) -> Result<PaymentSession>;
}

pub type SeatLedgerBox = Box<dyn SeatLedger>;
pub type BookingLedgerBox = Box<dyn BookingLedger>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
