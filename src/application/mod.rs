//! Application layer orchestrating the reservation flow.
//!
//! The `ReservationCoordinator` is the only writer of bookings and of a
//! show's booked-seat set; it is handed its ledgers and gateway at
//! construction and keeps no state of its own.

pub mod coordinator;
