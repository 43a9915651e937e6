use crate::domain::booking::Booking;
use crate::domain::ports::{BookingLedger, CommitOutcome, SeatLedger};
use crate::domain::show::Show;
use crate::error::{ReservationError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column family for show records (booked-seat sets).
pub const CF_SHOWS: &str = "shows";
/// Column family for bookings, keyed by external transaction id.
pub const CF_BOOKINGS: &str = "bookings";

/// Persistent ledgers backed by RocksDB.
///
/// Bookings are keyed by their transaction id, so uniqueness is a
/// key-occupancy check. RocksDB point writes are atomic but a
/// read-modify-write is not, so `write_lock` serializes the critical
/// sections of `try_commit` and `create`; that keeps the same contract the
/// in-memory ledgers get from their write lock.
///
/// `Clone` shares the underlying `Arc<DB>` and the lock.
#[derive(Clone)]
pub struct RocksDbLedger {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbLedger {
    /// Opens or creates the database, ensuring both column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_shows = ColumnFamilyDescriptor::new(CF_SHOWS, Options::default());
        let cf_bookings = ColumnFamilyDescriptor::new(CF_BOOKINGS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_shows, cf_bookings])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            ReservationError::Storage(Box::new(std::io::Error::other(format!(
                "column family {name} not found"
            ))))
        })
    }

    fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| ReservationError::Storage(Box::new(e)))
    }

    fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| ReservationError::Storage(Box::new(e)))
    }

    fn read_show(&self, show_id: &str) -> Result<Option<Show>> {
        let cf = self.cf(CF_SHOWS)?;
        match self.db.get_cf(cf, show_id.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SeatLedger for RocksDbLedger {
    async fn insert_show(&self, show: Show) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let cf = self.cf(CF_SHOWS)?;
        self.db
            .put_cf(cf, show.id.as_bytes(), Self::encode(&show)?)?;
        Ok(())
    }

    async fn get_show(&self, show_id: &str) -> Result<Option<Show>> {
        self.read_show(show_id)
    }

    async fn check_available(&self, show_id: &str, seats: &[u32]) -> Result<bool> {
        let show = self
            .read_show(show_id)?
            .ok_or_else(|| ReservationError::ShowNotFound(show_id.to_string()))?;
        Ok(show.is_available(seats))
    }

    async fn try_commit(&self, show_id: &str, seats: &[u32]) -> Result<CommitOutcome> {
        let _guard = self.write_lock.lock().await;
        let mut show = self
            .read_show(show_id)?
            .ok_or_else(|| ReservationError::ShowNotFound(show_id.to_string()))?;
        match show.commit(seats) {
            Ok(()) => {
                let cf = self.cf(CF_SHOWS)?;
                self.db
                    .put_cf(cf, show_id.as_bytes(), Self::encode(&show)?)?;
                Ok(CommitOutcome::Committed)
            }
            Err(taken) => Ok(CommitOutcome::Conflict(taken)),
        }
    }
}

#[async_trait]
impl BookingLedger for RocksDbLedger {
    async fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<Booking>> {
        let cf = self.cf(CF_BOOKINGS)?;
        match self.db.get_cf(cf, transaction_id.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, booking: Booking) -> Result<Booking> {
        let _guard = self.write_lock.lock().await;
        let cf = self.cf(CF_BOOKINGS)?;
        let key = booking.transaction_id.as_bytes();
        if self.db.get_pinned_cf(cf, key)?.is_some() {
            return Err(ReservationError::DuplicateTransaction(
                booking.transaction_id.clone(),
            ));
        }
        self.db.put_cf(cf, key, Self::encode(&booking)?)?;
        Ok(booking)
    }

    async fn bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>> {
        let all = self.all_bookings().await?;
        Ok(all.into_iter().filter(|b| b.user_id == user_id).collect())
    }

    async fn all_bookings(&self) -> Result<Vec<Booking>> {
        let cf = self.cf(CF_BOOKINGS)?;
        let mut bookings = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            bookings.push(Self::decode::<Booking>(&value)?);
        }
        bookings.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(bookings)
    }
}
