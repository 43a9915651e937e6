use crate::domain::booking::Booking;
use crate::error::Result;
use std::io::Write;

/// Writes the final booking report as CSV.
///
/// Columns: `booking,show,user,seats,transaction`, seats `;`-joined in
/// ascending order, rows in creation order.
pub struct BookingWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BookingWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_bookings(&mut self, bookings: &[Booking]) -> Result<()> {
        self.writer
            .write_record(["booking", "show", "user", "seats", "transaction"])?;
        for booking in bookings {
            let seats = booking
                .seats
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(";");
            self.writer.write_record([
                booking.id.to_string().as_str(),
                &booking.show_id,
                &booking.user_id,
                &seats,
                &booking.transaction_id,
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
