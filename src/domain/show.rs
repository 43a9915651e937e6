use crate::error::{ReservationError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A positive monetary amount.
///
/// Wrapper around `rust_decimal::Decimal` so ticket prices and session
/// charges can never be zero or negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(ReservationError::InvalidAmount)
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Total charge for `seat_count` seats at this per-seat price.
    pub fn times(&self, seat_count: usize) -> Result<Self> {
        Self::new(self.0 * Decimal::from(seat_count as u64))
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ReservationError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// The authoritative per-show seat record.
///
/// Seats are numbered `1..=total_seats`. The booked set only grows; nothing
/// in the core ever removes a seat from it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Show {
    pub id: String,
    pub total_seats: u32,
    pub seat_price: Amount,
    pub booked_seats: BTreeSet<u32>,
}

impl Show {
    pub fn new(id: impl Into<String>, total_seats: u32, seat_price: Amount) -> Self {
        Self {
            id: id.into(),
            total_seats,
            seat_price,
            booked_seats: BTreeSet::new(),
        }
    }

    /// Rejects a seat request that could never be satisfied: empty lists,
    /// seats outside `1..=total_seats`, or a seat listed twice.
    ///
    /// Runs before any payment session is opened.
    pub fn validate_request(&self, seats: &[u32]) -> Result<()> {
        if seats.is_empty() {
            return Err(ReservationError::EmptySeatSelection);
        }
        let mut seen = BTreeSet::new();
        for &seat in seats {
            if seat == 0 || seat > self.total_seats {
                return Err(ReservationError::InvalidSeat {
                    seat,
                    total_seats: self.total_seats,
                });
            }
            if !seen.insert(seat) {
                return Err(ReservationError::DuplicateSeat(seat));
            }
        }
        Ok(())
    }

    /// The subset of `seats` already present in the booked set, sorted.
    pub fn conflicting(&self, seats: &[u32]) -> Vec<u32> {
        let mut taken: Vec<u32> = seats
            .iter()
            .copied()
            .filter(|seat| self.booked_seats.contains(seat))
            .collect();
        taken.sort_unstable();
        taken.dedup();
        taken
    }

    pub fn is_available(&self, seats: &[u32]) -> bool {
        seats.iter().all(|seat| !self.booked_seats.contains(seat))
    }

    /// All-or-nothing seat commit. Adds every seat if none conflict,
    /// otherwise mutates nothing and returns the conflicting subset.
    ///
    /// Callers must run this inside the ledger's atomic section; on its own
    /// it is just the pure half of the check-and-set.
    pub fn commit(&mut self, seats: &[u32]) -> std::result::Result<(), Vec<u32>> {
        let taken = self.conflicting(seats);
        if !taken.is_empty() {
            return Err(taken);
        }
        self.booked_seats.extend(seats.iter().copied());
        Ok(())
    }
}
