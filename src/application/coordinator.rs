use crate::domain::booking::Booking;
use crate::domain::ports::{
    BookingLedgerBox, CommitOutcome, PaymentGatewayBox, SeatLedgerBox,
};
use crate::domain::session::{SessionMetadata, SessionStatus};
use crate::error::{ReservationError, Result};

/// Orchestrates a reservation attempt across the seat ledger, the payment
/// gateway and the booking ledger.
///
/// Constructed once with its collaborators injected; it holds no state of
/// its own, so a shared reference can serve any number of concurrent
/// attempts. Correctness rests on two backstops in the ledgers, not on any
/// serialization here: the seat ledger's atomic `try_commit`, and the
/// booking ledger's uniqueness on the external transaction id.
pub struct ReservationCoordinator {
    seats: SeatLedgerBox,
    bookings: BookingLedgerBox,
    gateway: PaymentGatewayBox,
}

impl ReservationCoordinator {
    pub fn new(
        seats: SeatLedgerBox,
        bookings: BookingLedgerBox,
        gateway: PaymentGatewayBox,
    ) -> Self {
        Self {
            seats,
            bookings,
            gateway,
        }
    }

    /// `Requested -> SessionOpen`: validates the seat request, runs the
    /// advisory availability pre-check and opens a payment session carrying
    /// the request as metadata. Returns the provider's session id.
    ///
    /// No seat hold is placed here; the authoritative check happens at
    /// reconciliation. The pre-check only saves a pointless session when
    /// the seats are already visibly gone, so a false positive is fine.
    pub async fn start_reservation(
        &self,
        show_id: &str,
        user_id: &str,
        seats: &[u32],
    ) -> Result<String> {
        let show = self
            .seats
            .get_show(show_id)
            .await?
            .ok_or_else(|| ReservationError::ShowNotFound(show_id.to_string()))?;
        show.validate_request(seats)?;

        if !self.seats.check_available(show_id, seats).await? {
            return Err(ReservationError::SeatsUnavailable);
        }

        // The charge is derived from the show's own price, never taken from
        // the caller.
        let amount = show.seat_price.times(seats.len())?;
        let metadata = SessionMetadata {
            show_id: show_id.to_string(),
            user_id: user_id.to_string(),
            seats: seats.to_vec(),
        };
        self.gateway.create_session(metadata, amount).await
    }

    /// `SessionOpen -> Reconciled | Conflicted | SessionFailed`: converts a
    /// confirmed payment into a durable booking.
    ///
    /// Safe to invoke any number of times for the same session: redelivered
    /// confirmations find the existing booking (via the transaction id) and
    /// return it unchanged.
    pub async fn reconcile(&self, session_ref: &str) -> Result<Booking> {
        let session = self.gateway.session_status(session_ref).await?;

        // Idempotency fast path: a transaction that already produced a
        // booking is a no-op repeat, not an error.
        if let Some(txn) = session.transaction_id.as_deref()
            && let Some(existing) = self.bookings.find_by_transaction(txn).await?
        {
            return Ok(existing);
        }

        if session.status != SessionStatus::Paid {
            return Err(ReservationError::PaymentNotCompleted(
                session_ref.to_string(),
            ));
        }
        let transaction_id = session.transaction_id.clone().ok_or_else(|| {
            ReservationError::PaymentNotCompleted(session_ref.to_string())
        })?;

        let meta = SessionMetadata::from_value(&session.metadata)?;

        // The one check that matters for correctness: atomic, against the
        // current booked set.
        match self.seats.try_commit(&meta.show_id, &meta.seats).await? {
            CommitOutcome::Committed => {}
            CommitOutcome::Conflict(taken) => {
                // A concurrent reconciliation of this same transaction may
                // have committed these seats between the lookup above and
                // the commit. That is a redelivery, not a lost race.
                if let Some(existing) =
                    self.bookings.find_by_transaction(&transaction_id).await?
                {
                    return Ok(existing);
                }
                return Err(ReservationError::Conflicted(taken));
            }
        }

        let booking = Booking::new(
            meta.show_id.clone(),
            meta.user_id.clone(),
            meta.seats.clone(),
            transaction_id.clone(),
        );
        match self.bookings.create(booking).await {
            Ok(created) => Ok(created),
            // A concurrent reconciliation of the same transaction won the
            // insert race; its booking covers exactly these seats, so the
            // commit above is already accounted for.
            Err(ReservationError::DuplicateTransaction(_)) => self
                .bookings
                .find_by_transaction(&transaction_id)
                .await?
                .ok_or(ReservationError::DuplicateTransaction(transaction_id)),
            Err(e) => Err(e),
        }
    }

    pub async fn bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>> {
        self.bookings.bookings_for_user(user_id).await
    }

    pub async fn all_bookings(&self) -> Result<Vec<Booking>> {
        self.bookings.all_bookings().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::SeatLedger;
    use crate::domain::show::{Amount, Show};
    use crate::infrastructure::gateway::InProcessGateway;
    use crate::infrastructure::in_memory::{InMemoryBookingLedger, InMemorySeatLedger};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    struct Harness {
        coordinator: Arc<ReservationCoordinator>,
        seats: InMemorySeatLedger,
        gateway: InProcessGateway,
    }

    async fn harness(total_seats: u32) -> Harness {
        let seats = InMemorySeatLedger::new();
        seats
            .insert_show(Show::new("s1", total_seats, Amount::new(dec!(150.0)).unwrap()))
            .await
            .unwrap();
        let gateway = InProcessGateway::new();
        let coordinator = Arc::new(ReservationCoordinator::new(
            Box::new(seats.clone()),
            Box::new(InMemoryBookingLedger::new()),
            Box::new(gateway.clone()),
        ));
        Harness {
            coordinator,
            seats,
            gateway,
        }
    }

    async fn booked_seats(seats: &InMemorySeatLedger) -> Vec<u32> {
        seats
            .get_show("s1")
            .await
            .unwrap()
            .unwrap()
            .booked_seats
            .into_iter()
            .collect()
    }

    #[tokio::test]
    async fn test_paid_session_reconciles_to_booking() {
        let h = harness(10).await;
        let session = h
            .coordinator
            .start_reservation("s1", "alice", &[1, 2])
            .await
            .unwrap();
        h.gateway.mark_paid(&session).await.unwrap();

        let booking = h.coordinator.reconcile(&session).await.unwrap();
        assert_eq!(booking.show_id, "s1");
        assert_eq!(booking.user_id, "alice");
        assert_eq!(booking.seats, vec![1, 2]);
        assert_eq!(booked_seats(&h.seats).await, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_reconcile_before_payment() {
        let h = harness(10).await;
        let session = h
            .coordinator
            .start_reservation("s1", "alice", &[1])
            .await
            .unwrap();

        assert!(matches!(
            h.coordinator.reconcile(&session).await,
            Err(ReservationError::PaymentNotCompleted(_))
        ));
        // Retryable: completing the payment makes the same call succeed.
        h.gateway.mark_paid(&session).await.unwrap();
        assert!(h.coordinator.reconcile(&session).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_session_never_books() {
        let h = harness(10).await;
        let session = h
            .coordinator
            .start_reservation("s1", "alice", &[1])
            .await
            .unwrap();
        h.gateway.mark_failed(&session).await.unwrap();

        assert!(matches!(
            h.coordinator.reconcile(&session).await,
            Err(ReservationError::PaymentNotCompleted(_))
        ));
        assert!(booked_seats(&h.seats).await.is_empty());
    }

    #[tokio::test]
    async fn test_boundary_seats_rejected_before_session() {
        let h = harness(10).await;
        assert!(matches!(
            h.coordinator.start_reservation("s1", "alice", &[0]).await,
            Err(ReservationError::InvalidSeat { seat: 0, .. })
        ));
        assert!(matches!(
            h.coordinator.start_reservation("s1", "alice", &[11]).await,
            Err(ReservationError::InvalidSeat { seat: 11, .. })
        ));
        assert!(matches!(
            h.coordinator.start_reservation("s1", "alice", &[]).await,
            Err(ReservationError::EmptySeatSelection)
        ));
        // Rejected before any session was opened.
        assert_eq!(h.gateway.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_precheck_fast_path_skips_session() {
        let h = harness(10).await;
        let first = h
            .coordinator
            .start_reservation("s1", "alice", &[1, 2])
            .await
            .unwrap();
        h.gateway.mark_paid(&first).await.unwrap();
        h.coordinator.reconcile(&first).await.unwrap();

        assert!(matches!(
            h.coordinator.start_reservation("s1", "bob", &[2, 3]).await,
            Err(ReservationError::SeatsUnavailable)
        ));
        assert_eq!(h.gateway.session_count().await, 1);
    }

    // X books [1,2]; Y pays for [2,3] before X reconciles,
    // then loses the authoritative check with conflicting seat 2.
    #[tokio::test]
    async fn test_paid_session_loses_seat_race() {
        let h = harness(3).await;
        let x = h
            .coordinator
            .start_reservation("s1", "x", &[1, 2])
            .await
            .unwrap();
        let y = h
            .coordinator
            .start_reservation("s1", "y", &[2, 3])
            .await
            .unwrap();
        h.gateway.mark_paid(&x).await.unwrap();
        h.gateway.mark_paid(&y).await.unwrap();

        let booking = h.coordinator.reconcile(&x).await.unwrap();
        assert_eq!(booking.seats, vec![1, 2]);

        match h.coordinator.reconcile(&y).await {
            Err(ReservationError::Conflicted(taken)) => assert_eq!(taken, vec![2]),
            other => panic!("expected Conflicted, got {other:?}"),
        }
        // Y's losing attempt booked nothing, not even seat 3.
        assert_eq!(booked_seats(&h.seats).await, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_redelivered_confirmation_is_noop() {
        let h = harness(10).await;
        let session = h
            .coordinator
            .start_reservation("s1", "alice", &[4, 5])
            .await
            .unwrap();
        h.gateway.mark_paid(&session).await.unwrap();

        let first = h.coordinator.reconcile(&session).await.unwrap();
        let second = h.coordinator.reconcile(&session).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(booked_seats(&h.seats).await, vec![4, 5]);
        assert_eq!(h.coordinator.all_bookings().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reconcile_of_same_session() {
        let h = harness(10).await;
        let session = h
            .coordinator
            .start_reservation("s1", "alice", &[7, 8])
            .await
            .unwrap();
        h.gateway.mark_paid(&session).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let coordinator = h.coordinator.clone();
            let session = session.clone();
            handles.push(tokio::spawn(async move {
                coordinator.reconcile(&session).await.unwrap()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1, "every delivery must return the same booking");
        assert_eq!(booked_seats(&h.seats).await, vec![7, 8]);
        assert_eq!(h.coordinator.all_bookings().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_round_trip_bookings_match_booked_set() {
        let h = harness(12).await;
        for (user, seats) in [("alice", vec![1, 2]), ("bob", vec![5]), ("alice", vec![9, 10])] {
            let session = h
                .coordinator
                .start_reservation("s1", user, &seats)
                .await
                .unwrap();
            h.gateway.mark_paid(&session).await.unwrap();
            h.coordinator.reconcile(&session).await.unwrap();
        }

        let mut union: Vec<u32> = h
            .coordinator
            .all_bookings()
            .await
            .unwrap()
            .iter()
            .flat_map(|b| b.seats.iter().copied())
            .collect();
        union.sort_unstable();
        assert_eq!(booked_seats(&h.seats).await, union);

        let alice = h.coordinator.bookings_for_user("alice").await.unwrap();
        assert_eq!(alice.len(), 2);
    }

    #[tokio::test]
    async fn test_gateway_failures_surface() {
        let h = harness(10).await;
        h.gateway.set_unavailable(true);
        assert!(matches!(
            h.coordinator.start_reservation("s1", "alice", &[1]).await,
            Err(ReservationError::GatewayUnavailable)
        ));
        h.gateway.set_unavailable(false);
        assert!(matches!(
            h.coordinator.reconcile("cs_404").await,
            Err(ReservationError::SessionNotFound(_))
        ));
        assert!(matches!(
            h.coordinator.start_reservation("s404", "alice", &[1]).await,
            Err(ReservationError::ShowNotFound(_))
        ));
    }
}
