use crate::error::{ReservationError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ScriptOp {
    /// Seed a show record.
    Show,
    /// Start a reservation; binds the script reference to a session.
    Reserve,
    /// Provider-side payment confirmation for a reference.
    Pay,
    /// Provider-side payment failure for a reference.
    Fail,
    /// Reconcile the reference's session into a booking.
    Reconcile,
}

/// One row of a reservation script.
///
/// Columns: `op, reference, show, user, seats, total_seats, price`.
/// Which columns are required depends on the op; `seats` is a
/// `;`-separated list of seat numbers.
#[derive(Debug, Deserialize, Clone)]
pub struct ScriptCommand {
    pub op: ScriptOp,
    pub reference: Option<String>,
    pub show: Option<String>,
    pub user: Option<String>,
    pub seats: Option<String>,
    pub total_seats: Option<u32>,
    pub price: Option<Decimal>,
}

impl ScriptCommand {
    /// Parses the `seats` column into seat numbers.
    pub fn seat_list(&self) -> Result<Vec<u32>> {
        let raw = self
            .seats
            .as_deref()
            .ok_or_else(|| ReservationError::Script("missing seats column".to_string()))?;
        raw.split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| ReservationError::Script(format!("invalid seat number: {part}")))
            })
            .collect()
    }
}

/// Reads script commands from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record
/// lengths, yielding an iterator of `Result<ScriptCommand>` so a malformed
/// row does not abort the stream.
pub struct ScriptReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ScriptReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn commands(self) -> impl Iterator<Item = Result<ScriptCommand>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(ReservationError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HEADER: &str = "op, reference, show, user, seats, total_seats, price";

    #[test]
    fn test_reader_valid_stream() {
        let data = format!(
            "{HEADER}\nshow, , s1, , , 12, 150.0\nreserve, r1, s1, alice, 1;2, , "
        );
        let reader = ScriptReader::new(data.as_bytes());
        let commands: Vec<Result<ScriptCommand>> = reader.commands().collect();

        assert_eq!(commands.len(), 2);
        let seed = commands[0].as_ref().unwrap();
        assert_eq!(seed.op, ScriptOp::Show);
        assert_eq!(seed.total_seats, Some(12));
        assert_eq!(seed.price, Some(dec!(150.0)));

        let reserve = commands[1].as_ref().unwrap();
        assert_eq!(reserve.op, ScriptOp::Reserve);
        assert_eq!(reserve.reference.as_deref(), Some("r1"));
        assert_eq!(reserve.seat_list().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_reader_malformed_op() {
        let data = format!("{HEADER}\nteleport, r1, s1, alice, 1, , ");
        let reader = ScriptReader::new(data.as_bytes());
        let commands: Vec<Result<ScriptCommand>> = reader.commands().collect();
        assert!(commands[0].is_err());
    }

    #[test]
    fn test_seat_list_rejects_garbage() {
        let data = format!("{HEADER}\nreserve, r1, s1, alice, 1;two, , ");
        let reader = ScriptReader::new(data.as_bytes());
        let cmd = reader.commands().next().unwrap().unwrap();
        assert!(matches!(
            cmd.seat_list(),
            Err(ReservationError::Script(_))
        ));
    }
}
