use crate::domain::booking::Booking;
use crate::domain::ports::{BookingLedger, CommitOutcome, SeatLedger};
use crate::domain::show::Show;
use crate::error::{ReservationError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory seat ledger.
///
/// `Clone` shares the underlying map, so cloned handles observe the same
/// shows. The whole of `try_commit` runs under a single write lock, which
/// is what makes the check-and-set indivisible here.
#[derive(Default, Clone)]
pub struct InMemorySeatLedger {
    shows: Arc<RwLock<HashMap<String, Show>>>,
}

impl InMemorySeatLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SeatLedger for InMemorySeatLedger {
    async fn insert_show(&self, show: Show) -> Result<()> {
        let mut shows = self.shows.write().await;
        shows.insert(show.id.clone(), show);
        Ok(())
    }

    async fn get_show(&self, show_id: &str) -> Result<Option<Show>> {
        let shows = self.shows.read().await;
        Ok(shows.get(show_id).cloned())
    }

    async fn check_available(&self, show_id: &str, seats: &[u32]) -> Result<bool> {
        let shows = self.shows.read().await;
        let show = shows
            .get(show_id)
            .ok_or_else(|| ReservationError::ShowNotFound(show_id.to_string()))?;
        Ok(show.is_available(seats))
    }

    async fn try_commit(&self, show_id: &str, seats: &[u32]) -> Result<CommitOutcome> {
        let mut shows = self.shows.write().await;
        let show = shows
            .get_mut(show_id)
            .ok_or_else(|| ReservationError::ShowNotFound(show_id.to_string()))?;
        match show.commit(seats) {
            Ok(()) => Ok(CommitOutcome::Committed),
            Err(taken) => Ok(CommitOutcome::Conflict(taken)),
        }
    }
}

/// A thread-safe in-memory booking ledger keyed by transaction id.
///
/// The occupied-entry check and the insert share one write lock, so a
/// duplicate transaction can never slip in between them. `order` keeps
/// creation order for reporting.
#[derive(Default, Clone)]
pub struct InMemoryBookingLedger {
    inner: Arc<RwLock<BookingMap>>,
}

#[derive(Default)]
struct BookingMap {
    by_transaction: HashMap<String, Booking>,
    order: Vec<String>,
}

impl InMemoryBookingLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingLedger for InMemoryBookingLedger {
    async fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<Booking>> {
        let inner = self.inner.read().await;
        Ok(inner.by_transaction.get(transaction_id).cloned())
    }

    async fn create(&self, booking: Booking) -> Result<Booking> {
        // Occupancy check and insert under one write lock; this is the
        // storage-level uniqueness the coordinator relies on.
        let mut inner = self.inner.write().await;
        if inner.by_transaction.contains_key(&booking.transaction_id) {
            return Err(ReservationError::DuplicateTransaction(
                booking.transaction_id.clone(),
            ));
        }
        inner.order.push(booking.transaction_id.clone());
        inner
            .by_transaction
            .insert(booking.transaction_id.clone(), booking.clone());
        Ok(booking)
    }

    async fn bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .filter_map(|txn| inner.by_transaction.get(txn))
            .filter(|booking| booking.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn all_bookings(&self) -> Result<Vec<Booking>> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .filter_map(|txn| inner.by_transaction.get(txn))
            .cloned()
            .collect())
    }
}
